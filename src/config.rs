use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::engine::EngineKind;
use crate::foundation::error::{ReelpressError, ReelpressResult};

/// Default number of frames allowed in flight between compositor and consumer.
pub const DEFAULT_PIPELINE_DEPTH: usize = 3;
/// Largest accepted pipeline depth.
pub const MAX_PIPELINE_DEPTH: usize = 16;

/// Locations of the external media tools.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FfmpegTools {
    /// `ffmpeg` program.
    pub ffmpeg: PathBuf,
    /// `ffprobe` program.
    pub ffprobe: PathBuf,
}

impl Default for FfmpegTools {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

impl FfmpegTools {
    /// Return `true` when `ffmpeg` can be invoked.
    pub fn has_ffmpeg(&self) -> bool {
        runs_ok(&self.ffmpeg)
    }

    /// Return `true` when `ffprobe` can be invoked.
    pub fn has_ffprobe(&self) -> bool {
        runs_ok(&self.ffprobe)
    }
}

fn runs_ok(program: &Path) -> bool {
    std::process::Command::new(program)
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn default_ffmpeg() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_pipeline_depth() -> usize {
    DEFAULT_PIPELINE_DEPTH
}

fn default_assets_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_restart_window() -> f64 {
    2.0
}

/// Platform encoders worth probing on this OS, in preference order.
pub fn default_hardware_encoders() -> Vec<String> {
    let names: &[&str] = if cfg!(target_os = "macos") {
        &["h264_videotoolbox"]
    } else if cfg!(target_os = "windows") {
        &["h264_nvenc", "h264_qsv", "h264_amf"]
    } else {
        &["h264_nvenc", "h264_qsv"]
    };
    names.iter().map(|s| s.to_string()).collect()
}

/// Runtime configuration shared by every export of a [`crate::SessionManager`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExportConfig {
    /// `ffmpeg` program name or path.
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg_program: PathBuf,
    /// `ffprobe` program name or path.
    #[serde(default = "default_ffprobe")]
    pub ffprobe_program: PathBuf,
    /// Frames in flight between compositor and consumer, including the one being composited.
    #[serde(default = "default_pipeline_depth")]
    pub pipeline_depth: usize,
    /// Parent directory for per-session scratch directories (system temp dir when unset).
    #[serde(default)]
    pub temp_root: Option<PathBuf>,
    /// Root that relative media locators resolve against.
    #[serde(default = "default_assets_root")]
    pub assets_root: PathBuf,
    /// Platform encoders to try, in order.
    #[serde(default = "default_hardware_encoders")]
    pub hardware_encoders: Vec<String>,
    /// Override of the engine fallback chain.
    #[serde(default)]
    pub engine_order: Option<Vec<EngineKind>>,
    /// Forward seek distance (seconds) beyond which a video stream restarts instead of reading
    /// through.
    #[serde(default = "default_restart_window")]
    pub video_restart_window_sec: f64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            ffmpeg_program: default_ffmpeg(),
            ffprobe_program: default_ffprobe(),
            pipeline_depth: DEFAULT_PIPELINE_DEPTH,
            temp_root: None,
            assets_root: default_assets_root(),
            hardware_encoders: default_hardware_encoders(),
            engine_order: None,
            video_restart_window_sec: default_restart_window(),
        }
    }
}

impl ExportConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_path(path: &Path) -> ReelpressResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse config '{}'", path.display()))?;
        cfg.normalized()
    }

    /// Defaults overridden by `REELPRESS_*` environment variables.
    pub fn from_env() -> ReelpressResult<Self> {
        Self::default().with_env_overrides()
    }

    /// Apply `REELPRESS_*` environment overrides on top of `self`.
    pub fn with_env_overrides(self) -> ReelpressResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    pub(crate) fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ReelpressResult<Self> {
        if let Some(v) = lookup("REELPRESS_FFMPEG") {
            self.ffmpeg_program = PathBuf::from(v);
        }
        if let Some(v) = lookup("REELPRESS_FFPROBE") {
            self.ffprobe_program = PathBuf::from(v);
        }
        if let Some(v) = lookup("REELPRESS_PIPELINE_DEPTH") {
            self.pipeline_depth = v.trim().parse::<usize>().map_err(|_| {
                ReelpressError::validation(format!("REELPRESS_PIPELINE_DEPTH: invalid '{v}'"))
            })?;
        }
        if let Some(v) = lookup("REELPRESS_TEMP_DIR") {
            self.temp_root = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("REELPRESS_ASSETS_ROOT") {
            self.assets_root = PathBuf::from(v);
        }
        if let Some(v) = lookup("REELPRESS_HW_ENCODERS") {
            self.hardware_encoders = split_list(&v).map(str::to_string).collect();
        }
        if let Some(v) = lookup("REELPRESS_ENGINE_ORDER") {
            let order = split_list(&v)
                .map(EngineKind::parse)
                .collect::<ReelpressResult<Vec<_>>>()?;
            self.engine_order = Some(order);
        }
        self.normalized()
    }

    /// Clamp and check values.
    pub fn normalized(mut self) -> ReelpressResult<Self> {
        self.pipeline_depth = self.pipeline_depth.clamp(1, MAX_PIPELINE_DEPTH);
        if !self.video_restart_window_sec.is_finite() || self.video_restart_window_sec < 0.0 {
            return Err(ReelpressError::validation(
                "video_restart_window_sec must be finite and >= 0",
            ));
        }
        if let Some(order) = &self.engine_order
            && order.is_empty()
        {
            return Err(ReelpressError::validation("engine_order must not be empty"));
        }
        Ok(self)
    }

    /// External tool locations.
    pub fn tools(&self) -> FfmpegTools {
        FfmpegTools {
            ffmpeg: self.ffmpeg_program.clone(),
            ffprobe: self.ffprobe_program.clone(),
        }
    }

    /// Directory that session scratch directories are created in.
    pub fn temp_root(&self) -> PathBuf {
        self.temp_root.clone().unwrap_or_else(std::env::temp_dir)
    }
}

fn split_list(v: &str) -> impl Iterator<Item = &str> {
    v.split(',').map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
