use std::path::PathBuf;

use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::error::{ReelpressError, ReelpressResult};

/// Encoding quality preset, mapped to a CRF value and an encoder speed preset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityPreset {
    /// Fast, small, visibly compressed.
    Draft,
    /// Balanced default.
    #[default]
    Normal,
    /// Slow, visually transparent.
    High,
    /// Mathematically lossless where the codec supports it.
    Lossless,
}

impl QualityPreset {
    /// x264-style constant rate factor.
    pub fn crf(self) -> u8 {
        match self {
            Self::Draft => 28,
            Self::Normal => 23,
            Self::High => 18,
            Self::Lossless => 0,
        }
    }

    /// x264-style speed preset.
    pub fn speed_preset(self) -> &'static str {
        match self {
            Self::Draft => "veryfast",
            Self::Normal => "medium",
            Self::High => "slow",
            Self::Lossless => "veryslow",
        }
    }

    /// CRF for VP9, which uses a 0..=63 scale.
    pub fn vp9_crf(self) -> u8 {
        match self {
            Self::Draft => 40,
            Self::Normal => 33,
            Self::High => 24,
            Self::Lossless => 0,
        }
    }

    /// Parse a CLI/config label.
    pub fn parse(s: &str) -> ReelpressResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" | "low" => Ok(Self::Draft),
            "normal" | "medium" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            "lossless" => Ok(Self::Lossless),
            other => Err(ReelpressError::validation(format!(
                "unknown quality preset '{other}'"
            ))),
        }
    }
}

/// Output container format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Container {
    /// MPEG-4 Part 14.
    #[default]
    Mp4,
    /// QuickTime.
    Mov,
    /// WebM (VP9).
    Webm,
}

impl Container {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Mov => "mov",
            Self::Webm => "webm",
        }
    }

    /// Software video codec used when no platform encoder is involved.
    pub fn software_codec(self) -> &'static str {
        match self {
            Self::Mp4 | Self::Mov => "libx264",
            Self::Webm => "libvpx-vp9",
        }
    }

    /// Whether `-movflags +faststart` applies.
    pub fn supports_faststart(self) -> bool {
        matches!(self, Self::Mp4 | Self::Mov)
    }

    /// Parse a CLI label.
    pub fn parse(s: &str) -> ReelpressResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp4" => Ok(Self::Mp4),
            "mov" => Ok(Self::Mov),
            "webm" => Ok(Self::Webm),
            other => Err(ReelpressError::validation(format!(
                "unknown container '{other}'"
            ))),
        }
    }
}

fn default_background() -> [u8; 4] {
    [0, 0, 0, 255]
}

/// Immutable settings for one export job.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExportSettings {
    /// Output width in pixels (even, non-zero).
    pub width: u32,
    /// Output height in pixels (even, non-zero).
    pub height: u32,
    /// Fixed output frame rate.
    pub fps: Fps,
    /// Quality preset.
    #[serde(default)]
    pub quality: QualityPreset,
    /// Container format.
    #[serde(default)]
    pub container: Container,
    /// Export length in seconds.
    pub total_duration_sec: f64,
    /// Destination file.
    pub output_path: PathBuf,
    /// Straight-alpha RGBA8 background every frame is cleared to.
    #[serde(default = "default_background")]
    pub background_rgba: [u8; 4],
}

impl ExportSettings {
    /// Create settings with default quality, container and background.
    pub fn new(
        width: u32,
        height: u32,
        fps: Fps,
        total_duration_sec: f64,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            width,
            height,
            fps,
            quality: QualityPreset::default(),
            container: Container::default(),
            total_duration_sec,
            output_path: output_path.into(),
            background_rgba: default_background(),
        }
    }

    /// Validate resolution, frame rate and duration.
    pub fn validate(&self) -> ReelpressResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ReelpressError::validation(
                "export width/height must be non-zero",
            ));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            return Err(ReelpressError::validation(
                "export width/height must be even (required for yuv420p output)",
            ));
        }
        if self.width > u32::from(u16::MAX) || self.height > u32::from(u16::MAX) {
            return Err(ReelpressError::validation(
                "export width/height must fit in 16 bits",
            ));
        }
        Fps::new(self.fps.num, self.fps.den)?;
        if !self.total_duration_sec.is_finite() || self.total_duration_sec <= 0.0 {
            return Err(ReelpressError::validation(
                "total_duration_sec must be finite and > 0",
            ));
        }
        if self.frame_count() == 0 {
            return Err(ReelpressError::validation(
                "export is shorter than one frame",
            ));
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(ReelpressError::validation("output_path must be non-empty"));
        }
        Ok(())
    }

    /// Export canvas.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Number of frames, `round(total_duration_sec * fps)`.
    pub fn frame_count(&self) -> u64 {
        self.fps.frame_count_for(self.total_duration_sec)
    }

    /// Sample time of frame `idx`.
    pub fn frame_time_secs(&self, idx: FrameIndex) -> f64 {
        self.fps.frame_time_secs(idx)
    }

    /// Duration actually covered by the emitted frames.
    pub fn encoded_duration_secs(&self) -> f64 {
        self.fps.frame_time_secs(FrameIndex(self.frame_count()))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/settings.rs"]
mod tests;
