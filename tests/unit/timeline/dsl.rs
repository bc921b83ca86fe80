use super::*;

#[test]
fn builder_assigns_track_indices() {
    let timeline = TimelineBuilder::new()
        .media("v0", video_item("clip.mp4", 64, 64, 10.0))
        .unwrap()
        .track("bottom", vec![video_clip("a", "v0", 0.0, 1.0)])
        .track("top", vec![video_clip("b", "v0", 0.0, 1.0)])
        .build()
        .unwrap();
    assert_eq!(timeline.tracks[0].elements[0].header().track_index, 0);
    assert_eq!(timeline.tracks[1].elements[0].header().track_index, 1);
    assert_eq!(timeline.tracks[1].name, "top");
}

#[test]
fn builder_rejects_duplicate_media_keys() {
    let res = TimelineBuilder::new()
        .media("v0", video_item("a.mp4", 2, 2, 1.0))
        .unwrap()
        .media("v0", video_item("b.mp4", 2, 2, 1.0));
    assert!(res.is_err());
}

#[test]
fn item_helpers_set_kinds() {
    assert_eq!(svg_item("a.svg").kind, MediaKind::Svg);
    assert_eq!(font_item("a.ttf").kind, MediaKind::Font);
    assert_eq!(image_item("a.png").kind, MediaKind::Image);
}
