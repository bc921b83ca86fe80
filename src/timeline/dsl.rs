use std::collections::BTreeMap;

use crate::foundation::error::{ReelpressError, ReelpressResult};
use crate::timeline::model::{
    DecorativeOverlay, ElementHeader, FitMode, MediaClip, MediaItem, MediaKind, MediaRef,
    OverlayTransform, TextOverlay, Timeline, TimelineElement, Track,
};

/// Builder for [`Timeline`]. `build` validates the result.
#[derive(Default)]
pub struct TimelineBuilder {
    media: BTreeMap<MediaRef, MediaItem>,
    tracks: Vec<Track>,
}

impl TimelineBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a media item under a unique key.
    pub fn media(mut self, key: impl Into<String>, item: MediaItem) -> ReelpressResult<Self> {
        let key = MediaRef(key.into());
        if self.media.contains_key(&key) {
            return Err(ReelpressError::validation(format!(
                "duplicate media key '{key}'"
            )));
        }
        self.media.insert(key, item);
        Ok(self)
    }

    /// Append a track.
    ///
    /// Element headers are re-indexed to the track's position so callers can build elements
    /// without knowing the final index.
    pub fn track(mut self, name: impl Into<String>, elements: Vec<TimelineElement>) -> Self {
        let index = self.tracks.len();
        let elements = elements
            .into_iter()
            .map(|mut e| {
                header_mut(&mut e).track_index = index;
                e
            })
            .collect();
        self.tracks.push(Track {
            name: name.into(),
            elements,
        });
        self
    }

    /// Build and validate the final [`Timeline`].
    pub fn build(self) -> ReelpressResult<Timeline> {
        let timeline = Timeline {
            media: self.media,
            tracks: self.tracks,
        };
        timeline.validate()?;
        Ok(timeline)
    }
}

fn header_mut(e: &mut TimelineElement) -> &mut ElementHeader {
    match e {
        TimelineElement::VideoClip(c) | TimelineElement::ImageClip(c) => &mut c.header,
        TimelineElement::TextOverlay(t) => &mut t.header,
        TimelineElement::DecorativeOverlay(d) => &mut d.header,
    }
}

fn header(id: impl Into<String>, start_sec: f64, duration_sec: f64) -> ElementHeader {
    ElementHeader {
        id: id.into(),
        start_sec,
        duration_sec,
        track_index: 0,
    }
}

fn media_clip(
    id: impl Into<String>,
    media: impl Into<String>,
    start_sec: f64,
    duration_sec: f64,
) -> MediaClip {
    MediaClip {
        header: header(id, start_sec, duration_sec),
        media: MediaRef(media.into()),
        trim_start_sec: 0.0,
        trim_end_sec: 0.0,
        fit: FitMode::default(),
    }
}

/// Video media item with known size and duration.
pub fn video_item(
    source: impl Into<String>,
    width: u32,
    height: u32,
    duration_sec: f64,
) -> MediaItem {
    MediaItem {
        kind: MediaKind::Video,
        source: source.into(),
        width,
        height,
        duration_hint_sec: Some(duration_sec),
        frame_rate_hint: None,
    }
}

/// Still image media item.
pub fn image_item(source: impl Into<String>) -> MediaItem {
    MediaItem {
        kind: MediaKind::Image,
        source: source.into(),
        width: 0,
        height: 0,
        duration_hint_sec: None,
        frame_rate_hint: None,
    }
}

/// SVG media item.
pub fn svg_item(source: impl Into<String>) -> MediaItem {
    MediaItem {
        kind: MediaKind::Svg,
        ..image_item(source)
    }
}

/// Font media item.
pub fn font_item(source: impl Into<String>) -> MediaItem {
    MediaItem {
        kind: MediaKind::Font,
        ..image_item(source)
    }
}

/// Video clip starting at `start_sec` with no trims.
pub fn video_clip(
    id: impl Into<String>,
    media: impl Into<String>,
    start_sec: f64,
    duration_sec: f64,
) -> TimelineElement {
    TimelineElement::VideoClip(media_clip(id, media, start_sec, duration_sec))
}

/// Video clip with explicit trims.
pub fn trimmed_video_clip(
    id: impl Into<String>,
    media: impl Into<String>,
    start_sec: f64,
    duration_sec: f64,
    trim_start_sec: f64,
    trim_end_sec: f64,
) -> TimelineElement {
    TimelineElement::VideoClip(MediaClip {
        trim_start_sec,
        trim_end_sec,
        ..media_clip(id, media, start_sec, duration_sec)
    })
}

/// Image clip with the given fit mode.
pub fn image_clip(
    id: impl Into<String>,
    media: impl Into<String>,
    start_sec: f64,
    duration_sec: f64,
    fit: FitMode,
) -> TimelineElement {
    TimelineElement::ImageClip(MediaClip {
        fit,
        ..media_clip(id, media, start_sec, duration_sec)
    })
}

/// Text overlay centred on the canvas.
pub fn text_overlay(
    id: impl Into<String>,
    font: impl Into<String>,
    text: impl Into<String>,
    start_sec: f64,
    duration_sec: f64,
    font_size_pct: f64,
    transform: OverlayTransform,
) -> TimelineElement {
    TimelineElement::TextOverlay(TextOverlay {
        header: header(id, start_sec, duration_sec),
        transform,
        text: text.into(),
        font: MediaRef(font.into()),
        font_size_pct,
        color_rgba8: [255, 255, 255, 255],
        max_width_pct: None,
    })
}

/// Decorative overlay sized in percent of the canvas.
pub fn decorative_overlay(
    id: impl Into<String>,
    asset: impl Into<String>,
    start_sec: f64,
    duration_sec: f64,
    size_pct: (f64, f64),
    transform: OverlayTransform,
) -> TimelineElement {
    TimelineElement::DecorativeOverlay(DecorativeOverlay {
        header: header(id, start_sec, duration_sec),
        transform,
        asset: MediaRef(asset.into()),
        width_pct: size_pct.0,
        height_pct: size_pct.1,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/dsl.rs"]
mod tests;
