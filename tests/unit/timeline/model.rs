use super::*;
use crate::timeline::dsl::{
    TimelineBuilder, decorative_overlay, font_item, image_item, text_overlay, trimmed_video_clip,
    video_clip, video_item,
};

fn base() -> TimelineBuilder {
    TimelineBuilder::new()
        .media("v0", video_item("clip.mp4", 64, 64, 10.0))
        .unwrap()
        .media("img", image_item("logo.png"))
        .unwrap()
        .media("font", font_item("font.ttf"))
        .unwrap()
}

#[test]
fn active_interval_is_half_open() {
    let h = ElementHeader {
        id: "a".to_string(),
        start_sec: 1.0,
        duration_sec: 2.0,
        track_index: 0,
    };
    assert!(!h.is_active_at(0.999));
    assert!(h.is_active_at(1.0));
    assert!(h.is_active_at(2.999));
    assert!(!h.is_active_at(3.0));
}

#[test]
fn non_positive_duration_is_legal_but_never_active() {
    let timeline = base()
        .track(
            "main",
            vec![video_clip("zero", "v0", 0.0, 0.0), video_clip("neg", "v0", 0.0, -1.0)],
        )
        .build()
        .unwrap();
    for e in timeline.elements() {
        assert!(!e.header().is_drawable());
        assert!(!e.header().is_active_at(0.0));
    }
    assert!(timeline.referenced_media().is_empty());
}

#[test]
fn overlapping_elements_on_one_track_are_rejected() {
    let err = base()
        .track(
            "main",
            vec![video_clip("a", "v0", 0.0, 2.0), video_clip("b", "v0", 1.5, 2.0)],
        )
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("overlap"));
}

#[test]
fn touching_elements_do_not_overlap() {
    base()
        .track(
            "main",
            vec![video_clip("a", "v0", 0.0, 2.0), video_clip("b", "v0", 2.0, 2.0)],
        )
        .build()
        .unwrap();
}

#[test]
fn unsorted_track_is_rejected() {
    let err = base()
        .track(
            "main",
            vec![video_clip("a", "v0", 3.0, 1.0), video_clip("b", "v0", 0.0, 1.0)],
        )
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("sorted"));
}

#[test]
fn trim_exceeding_source_is_rejected_at_build() {
    let err = base()
        .track(
            "main",
            vec![trimmed_video_clip("a", "v0", 0.0, 6.0, 3.0, 2.0)],
        )
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("remain after trims"));

    base()
        .track(
            "main",
            vec![trimmed_video_clip("a", "v0", 0.0, 5.0, 3.0, 2.0)],
        )
        .build()
        .unwrap();
}

#[test]
fn track_index_mismatch_is_rejected() {
    let mut timeline = base()
        .track("main", vec![video_clip("a", "v0", 0.0, 1.0)])
        .build()
        .unwrap();
    let TimelineElement::VideoClip(c) = &mut timeline.tracks[0].elements[0] else {
        panic!("expected video clip");
    };
    c.header.track_index = 3;
    assert!(timeline.validate().is_err());
}

#[test]
fn media_kind_must_match_element() {
    let err = base()
        .track("main", vec![video_clip("a", "img", 0.0, 1.0)])
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("cannot reference media"));

    let err = base()
        .track("main", vec![video_clip("a", "missing", 0.0, 1.0)])
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("unknown media ref"));
}

#[test]
fn overlay_transform_bounds_are_checked() {
    let bad_scale = OverlayTransform {
        scale: 0.0,
        ..OverlayTransform::default()
    };
    assert!(
        base()
            .track(
                "fx",
                vec![decorative_overlay("d", "img", 0.0, 1.0, (10.0, 10.0), bad_scale)]
            )
            .build()
            .is_err()
    );

    let bad_opacity = OverlayTransform {
        opacity: 1.5,
        ..OverlayTransform::default()
    };
    assert!(
        base()
            .track(
                "fx",
                vec![text_overlay("t", "font", "hi", 0.0, 1.0, 5.0, bad_opacity)]
            )
            .build()
            .is_err()
    );
}

#[test]
fn rotation_is_normalised_modulo_360() {
    let t = |deg: f64| OverlayTransform {
        rotation_deg: deg,
        ..OverlayTransform::default()
    };
    assert_eq!(t(370.0).rotation_normalized(), 10.0);
    assert_eq!(t(-90.0).rotation_normalized(), 270.0);
    assert_eq!(t(720.0).rotation_normalized(), 0.0);
}

#[test]
fn duplicate_ids_are_rejected() {
    let err = base()
        .track("a", vec![video_clip("x", "v0", 0.0, 1.0)])
        .track("b", vec![video_clip("x", "v0", 0.0, 1.0)])
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("duplicate element id"));
}

#[test]
fn json_round_trip_uses_kind_tag() {
    let timeline = base()
        .track("main", vec![video_clip("a", "v0", 0.0, 1.0)])
        .build()
        .unwrap();
    let json = serde_json::to_string(&timeline).unwrap();
    assert!(json.contains("\"kind\":\"video_clip\""));
    assert!(json.contains("\"start_sec\":0.0"));
    let back: Timeline = serde_json::from_str(&json).unwrap();
    assert_eq!(back, timeline);
}

#[test]
fn content_end_ignores_undrawable_elements() {
    let timeline = base()
        .track(
            "main",
            vec![video_clip("a", "v0", 0.0, 2.0), video_clip("b", "v0", 4.0, 0.0)],
        )
        .build()
        .unwrap();
    assert_eq!(timeline.content_end_sec(), 2.0);
}

#[test]
fn json_reader_parses_and_validates() {
    let json = r#"{
        "media": {
            "v0": { "kind": "video", "source": "clip.mp4", "width": 8, "height": 8, "duration_hint_sec": 3.0 }
        },
        "tracks": [
            { "name": "main", "elements": [
                { "kind": "video_clip", "id": "a", "start_sec": 0.0, "duration_sec": 2.0,
                  "track_index": 0, "media": "v0" }
            ] }
        ]
    }"#;
    let timeline = Timeline::from_reader(json.as_bytes()).unwrap();
    assert_eq!(timeline.elements().count(), 1);
    assert_eq!(timeline.content_end_sec(), 2.0);

    let overlong = json.replace("\"duration_sec\": 2.0", "\"duration_sec\": 5.0");
    assert!(matches!(
        Timeline::from_reader(overlong.as_bytes()),
        Err(ReelpressError::Validation(_))
    ));
    assert!(matches!(
        Timeline::from_reader("{ not json".as_bytes()),
        Err(ReelpressError::Validation(_))
    ));
}
