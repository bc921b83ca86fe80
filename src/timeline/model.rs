use std::collections::{BTreeMap, HashSet};

use crate::foundation::error::{ReelpressError, ReelpressResult};

/// Tolerance used when comparing element boundaries in seconds.
pub(crate) const TIME_EPSILON: f64 = 1e-9;

/// Stable key into [`Timeline::media`].
#[derive(
    Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct MediaRef(pub String);

impl MediaRef {
    /// Create a media reference from any string-like key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Borrow the underlying key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MediaRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MediaRef {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Kind of a media table entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// Time-based video source decoded through `ffmpeg`.
    Video,
    /// Raster still image.
    Image,
    /// Vector graphic rasterised at its intrinsic size.
    Svg,
    /// Font file used by text overlays.
    Font,
}

/// One entry of the timeline media table.
///
/// Owned by the caller's project, borrowed read-only for one export job.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MediaItem {
    /// Media kind.
    pub kind: MediaKind,
    /// Source locator. Relative locators are resolved against the assets root.
    pub source: String,
    /// Intrinsic width in pixels (0 when unknown).
    #[serde(default)]
    pub width: u32,
    /// Intrinsic height in pixels (0 when unknown).
    #[serde(default)]
    pub height: u32,
    /// Source duration in seconds for time-based media.
    #[serde(default)]
    pub duration_hint_sec: Option<f64>,
    /// Native frame rate for time-based media.
    #[serde(default)]
    pub frame_rate_hint: Option<f64>,
}

/// Fields shared by every timeline element.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ElementHeader {
    /// Caller-assigned element id, unique within a timeline.
    pub id: String,
    /// Timeline start in seconds.
    pub start_sec: f64,
    /// Visible duration in seconds. Non-positive durations are legal and never drawn.
    pub duration_sec: f64,
    /// Index of the owning track.
    pub track_index: usize,
}

impl ElementHeader {
    /// Exclusive end of the element interval.
    pub fn end_sec(&self) -> f64 {
        self.start_sec + self.duration_sec
    }

    /// Return `true` when the element can ever be drawn.
    pub fn is_drawable(&self) -> bool {
        self.duration_sec.is_finite() && self.duration_sec > 0.0
    }

    /// Return `true` when `t` lies in `[start, start + duration)`.
    pub fn is_active_at(&self, t: f64) -> bool {
        self.is_drawable() && t >= self.start_sec && t < self.end_sec()
    }
}

/// How a media raster maps onto the export canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitMode {
    /// Scale uniformly to fit entirely inside the canvas (letterbox).
    #[default]
    Contain,
    /// Scale uniformly to cover the canvas, cropping the overflow.
    Cover,
    /// Scale each axis independently to the canvas size.
    Stretch,
}

/// Media-backed element payload shared by video and image clips.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MediaClip {
    /// Common element fields.
    #[serde(flatten)]
    pub header: ElementHeader,
    /// Key into the media table.
    pub media: MediaRef,
    /// Seconds skipped at the start of the source.
    #[serde(default)]
    pub trim_start_sec: f64,
    /// Seconds skipped at the end of the source.
    #[serde(default)]
    pub trim_end_sec: f64,
    /// Raster-to-canvas mapping.
    #[serde(default)]
    pub fit: FitMode,
}

impl MediaClip {
    /// Source-local time for timeline time `t`.
    pub fn local_time(&self, t: f64) -> f64 {
        (t - self.header.start_sec + self.trim_start_sec).max(0.0)
    }
}

/// Overlay anchor position in percent of the export canvas.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OverlayPosition {
    /// Horizontal centre, percent of export width.
    pub x: f64,
    /// Vertical centre, percent of export height.
    pub y: f64,
}

impl Default for OverlayPosition {
    fn default() -> Self {
        Self { x: 50.0, y: 50.0 }
    }
}

fn default_scale() -> f64 {
    1.0
}

fn default_opacity() -> f64 {
    1.0
}

/// Resolution-independent overlay transform.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OverlayTransform {
    /// Overlay centre.
    #[serde(default)]
    pub position: OverlayPosition,
    /// Uniform scale, must be > 0.
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Clockwise rotation in degrees.
    #[serde(default)]
    pub rotation_deg: f64,
    /// Opacity in `[0, 1]`.
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Overlay stacking order, ascending renders later.
    #[serde(default)]
    pub z_index: i32,
}

impl Default for OverlayTransform {
    fn default() -> Self {
        Self {
            position: OverlayPosition::default(),
            scale: 1.0,
            rotation_deg: 0.0,
            opacity: 1.0,
            z_index: 0,
        }
    }
}

impl OverlayTransform {
    /// Rotation normalised into `[0, 360)`.
    pub fn rotation_normalized(&self) -> f64 {
        let r = self.rotation_deg.rem_euclid(360.0);
        if r >= 360.0 { 0.0 } else { r }
    }
}

/// Text drawn over the media layers.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextOverlay {
    /// Common element fields.
    #[serde(flatten)]
    pub header: ElementHeader,
    /// Placement.
    #[serde(default)]
    pub transform: OverlayTransform,
    /// Plain text content.
    pub text: String,
    /// Font media entry.
    pub font: MediaRef,
    /// Font size in percent of export height.
    pub font_size_pct: f64,
    /// Straight-alpha RGBA8 text color.
    #[serde(default = "default_text_color")]
    pub color_rgba8: [u8; 4],
    /// Optional wrap width in percent of export width.
    #[serde(default)]
    pub max_width_pct: Option<f64>,
}

fn default_text_color() -> [u8; 4] {
    [255, 255, 255, 255]
}

/// Pre-resolved decorative asset (image or SVG) drawn over the media layers.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DecorativeOverlay {
    /// Common element fields.
    #[serde(flatten)]
    pub header: ElementHeader,
    /// Placement.
    #[serde(default)]
    pub transform: OverlayTransform,
    /// Image or SVG media entry.
    pub asset: MediaRef,
    /// Box width in percent of export width.
    pub width_pct: f64,
    /// Box height in percent of export height.
    pub height_pct: f64,
}

/// Closed set of timeline element variants.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimelineElement {
    /// Time-based video clip.
    VideoClip(MediaClip),
    /// Still image (raster or SVG) clip.
    ImageClip(MediaClip),
    /// Text overlay.
    TextOverlay(TextOverlay),
    /// Decorative overlay.
    DecorativeOverlay(DecorativeOverlay),
}

impl TimelineElement {
    /// Shared element fields.
    pub fn header(&self) -> &ElementHeader {
        match self {
            Self::VideoClip(c) | Self::ImageClip(c) => &c.header,
            Self::TextOverlay(t) => &t.header,
            Self::DecorativeOverlay(d) => &d.header,
        }
    }

    /// Element id.
    pub fn id(&self) -> &str {
        &self.header().id
    }

    /// Overlay transform for overlay variants, `None` for media-backed clips.
    pub fn overlay_transform(&self) -> Option<&OverlayTransform> {
        match self {
            Self::VideoClip(_) | Self::ImageClip(_) => None,
            Self::TextOverlay(t) => Some(&t.transform),
            Self::DecorativeOverlay(d) => Some(&d.transform),
        }
    }

    /// Return `true` for text and decorative overlays.
    pub fn is_overlay(&self) -> bool {
        self.overlay_transform().is_some()
    }

    /// Media table entry referenced by this element.
    pub fn media_ref(&self) -> &MediaRef {
        match self {
            Self::VideoClip(c) | Self::ImageClip(c) => &c.media,
            Self::TextOverlay(t) => &t.font,
            Self::DecorativeOverlay(d) => &d.asset,
        }
    }
}

/// One ordered layer of elements.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Track {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Elements sorted by start time.
    #[serde(default)]
    pub elements: Vec<TimelineElement>,
}

/// Read-only per-export snapshot of tracks and media.
///
/// Track order is the base z-order: track 0 is the bottom layer.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Timeline {
    /// Media table keyed by stable references.
    #[serde(default)]
    pub media: BTreeMap<MediaRef, MediaItem>,
    /// Tracks, bottom first.
    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl Timeline {
    /// Parse and validate a timeline from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> ReelpressResult<Self> {
        let timeline: Timeline = serde_json::from_reader(r)
            .map_err(|e| ReelpressError::validation(format!("parse timeline JSON: {e}")))?;
        timeline.validate()?;
        Ok(timeline)
    }

    /// Parse and validate a timeline from a JSON file on disk.
    pub fn from_path(path: impl AsRef<std::path::Path>) -> ReelpressResult<Self> {
        let path = path.as_ref();
        let f = std::fs::File::open(path).map_err(|e| {
            ReelpressError::validation(format!("open timeline JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(std::io::BufReader::new(f))
    }

    /// Look up a media table entry.
    pub fn media_item(&self, media: &MediaRef) -> ReelpressResult<&MediaItem> {
        self.media
            .get(media)
            .ok_or_else(|| ReelpressError::validation(format!("unknown media ref '{media}'")))
    }

    /// Iterate all elements in track order.
    pub fn elements(&self) -> impl Iterator<Item = &TimelineElement> {
        self.tracks.iter().flat_map(|t| t.elements.iter())
    }

    /// Latest end time across all drawable elements.
    pub fn content_end_sec(&self) -> f64 {
        self.elements()
            .map(TimelineElement::header)
            .filter(|h| h.is_drawable())
            .map(ElementHeader::end_sec)
            .fold(0.0, f64::max)
    }

    /// Distinct media references used by drawable elements, in stable key order.
    pub fn referenced_media(&self) -> Vec<MediaRef> {
        let mut refs: Vec<MediaRef> = self
            .elements()
            .filter(|e| e.header().is_drawable())
            .map(|e| e.media_ref().clone())
            .collect();
        refs.sort();
        refs.dedup();
        refs
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> ReelpressResult<()> {
        for (key, item) in &self.media {
            if item.source.trim().is_empty() {
                return Err(ReelpressError::validation(format!(
                    "media '{key}' source must be non-empty"
                )));
            }
            if let Some(d) = item.duration_hint_sec
                && (!d.is_finite() || d < 0.0)
            {
                return Err(ReelpressError::validation(format!(
                    "media '{key}' duration_hint_sec must be finite and >= 0"
                )));
            }
        }

        let mut ids = HashSet::<&str>::new();
        for (track_index, track) in self.tracks.iter().enumerate() {
            let mut prev_drawable: Option<&ElementHeader> = None;
            let mut prev_start = f64::NEG_INFINITY;
            for element in &track.elements {
                let h = element.header();
                if !ids.insert(h.id.as_str()) {
                    return Err(ReelpressError::validation(format!(
                        "duplicate element id '{}'",
                        h.id
                    )));
                }
                if h.track_index != track_index {
                    return Err(ReelpressError::validation(format!(
                        "element '{}' declares track_index {} but lives on track {track_index}",
                        h.id, h.track_index
                    )));
                }
                if !h.start_sec.is_finite() || h.start_sec < 0.0 {
                    return Err(ReelpressError::validation(format!(
                        "element '{}' start_sec must be finite and >= 0",
                        h.id
                    )));
                }
                if !h.duration_sec.is_finite() {
                    return Err(ReelpressError::validation(format!(
                        "element '{}' duration_sec must be finite",
                        h.id
                    )));
                }
                if h.start_sec < prev_start {
                    return Err(ReelpressError::validation(format!(
                        "track {track_index} elements must be sorted by start time ('{}')",
                        h.id
                    )));
                }
                prev_start = h.start_sec;

                if h.is_drawable() {
                    if let Some(prev) = prev_drawable
                        && prev.end_sec() > h.start_sec + TIME_EPSILON
                    {
                        return Err(ReelpressError::validation(format!(
                            "elements '{}' and '{}' overlap on track {track_index}",
                            prev.id, h.id
                        )));
                    }
                    prev_drawable = Some(h);
                }

                self.validate_element(element)?;
            }
        }
        Ok(())
    }

    fn validate_element(&self, element: &TimelineElement) -> ReelpressResult<()> {
        let item = self.media_item(element.media_ref())?;
        let id = element.id();
        match element {
            TimelineElement::VideoClip(c) => {
                expect_kind(id, item, &[MediaKind::Video])?;
                validate_trim(c, item)?;
            }
            TimelineElement::ImageClip(c) => {
                expect_kind(id, item, &[MediaKind::Image, MediaKind::Svg])?;
                validate_trim(c, item)?;
            }
            TimelineElement::TextOverlay(t) => {
                expect_kind(id, item, &[MediaKind::Font])?;
                validate_transform(id, &t.transform)?;
                if !t.font_size_pct.is_finite() || t.font_size_pct <= 0.0 {
                    return Err(ReelpressError::validation(format!(
                        "text overlay '{id}' font_size_pct must be > 0"
                    )));
                }
                if let Some(w) = t.max_width_pct
                    && (!w.is_finite() || w <= 0.0)
                {
                    return Err(ReelpressError::validation(format!(
                        "text overlay '{id}' max_width_pct must be > 0"
                    )));
                }
            }
            TimelineElement::DecorativeOverlay(d) => {
                expect_kind(id, item, &[MediaKind::Image, MediaKind::Svg])?;
                validate_transform(id, &d.transform)?;
                if !(d.width_pct.is_finite() && d.width_pct > 0.0)
                    || !(d.height_pct.is_finite() && d.height_pct > 0.0)
                {
                    return Err(ReelpressError::validation(format!(
                        "decorative overlay '{id}' width_pct/height_pct must be > 0"
                    )));
                }
            }
        }
        Ok(())
    }
}

fn expect_kind(id: &str, item: &MediaItem, allowed: &[MediaKind]) -> ReelpressResult<()> {
    if allowed.contains(&item.kind) {
        return Ok(());
    }
    Err(ReelpressError::validation(format!(
        "element '{id}' cannot reference media of kind {:?}",
        item.kind
    )))
}

fn validate_trim(clip: &MediaClip, item: &MediaItem) -> ReelpressResult<()> {
    let id = &clip.header.id;
    if !clip.trim_start_sec.is_finite() || clip.trim_start_sec < 0.0 {
        return Err(ReelpressError::validation(format!(
            "clip '{id}' trim_start_sec must be finite and >= 0"
        )));
    }
    if !clip.trim_end_sec.is_finite() || clip.trim_end_sec < 0.0 {
        return Err(ReelpressError::validation(format!(
            "clip '{id}' trim_end_sec must be finite and >= 0"
        )));
    }
    if !clip.header.is_drawable() || item.kind != MediaKind::Video {
        return Ok(());
    }
    if let Some(source_duration) = item.duration_hint_sec {
        let available = source_duration - clip.trim_end_sec;
        let needed = clip.trim_start_sec + clip.header.duration_sec;
        if needed > available + TIME_EPSILON {
            return Err(ReelpressError::validation(format!(
                "clip '{id}' needs {needed:.3}s of source but only {available:.3}s remain after trims"
            )));
        }
    }
    Ok(())
}

fn validate_transform(id: &str, t: &OverlayTransform) -> ReelpressResult<()> {
    if !t.scale.is_finite() || t.scale <= 0.0 {
        return Err(ReelpressError::validation(format!(
            "overlay '{id}' scale must be > 0"
        )));
    }
    if !(0.0..=1.0).contains(&t.opacity) {
        return Err(ReelpressError::validation(format!(
            "overlay '{id}' opacity must be in [0, 1]"
        )));
    }
    if !t.position.x.is_finite() || !t.position.y.is_finite() || !t.rotation_deg.is_finite() {
        return Err(ReelpressError::validation(format!(
            "overlay '{id}' transform must be finite"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/model.rs"]
mod tests;
