//! Export engines: four ways of turning a timeline into a video file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::ExportConfig;
use crate::decode::adapter::MediaDecoder;
use crate::decode::source::SourceDecoder;
use crate::foundation::error::{ReelpressError, ReelpressResult};
use crate::render::compositor::AssetWarning;
use crate::session::abort::AbortSignal;
use crate::session::progress::ProgressReporter;
use crate::timeline::model::Timeline;
use crate::timeline::settings::ExportSettings;

/// Streaming encoder engines (plain and preloaded decode).
pub mod continuous;
/// Image sequence plus one external encoder process.
pub mod native;
/// Bounded producer/consumer frame pipeline.
pub mod pipeline;
/// Hardware/platform encoder engine.
pub mod platform;

/// Export strategy identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum EngineKind {
    /// PNG sequence in a scratch directory, then one `ffmpeg` run.
    #[serde(rename = "native")]
    NativeProcess,
    /// Frames streamed into a hardware/platform encoder.
    #[serde(rename = "platform")]
    PlatformCodec,
    /// Frames streamed into a software encoder with every source opened once per job.
    #[serde(rename = "optimized")]
    ContinuousCaptureOptimized,
    /// Frames streamed into a software encoder with per-frame source decode.
    #[serde(rename = "continuous")]
    ContinuousCapture,
}

impl EngineKind {
    /// Default fallback chain, most preferred first.
    pub const DEFAULT_ORDER: [EngineKind; 4] = [
        EngineKind::NativeProcess,
        EngineKind::PlatformCodec,
        EngineKind::ContinuousCaptureOptimized,
        EngineKind::ContinuousCapture,
    ];

    /// Short label used in configuration, the CLI and logs.
    pub fn label(self) -> &'static str {
        match self {
            Self::NativeProcess => "native",
            Self::PlatformCodec => "platform",
            Self::ContinuousCaptureOptimized => "optimized",
            Self::ContinuousCapture => "continuous",
        }
    }

    /// Parse a label produced by [`EngineKind::label`].
    pub fn parse(s: &str) -> ReelpressResult<Self> {
        let s = s.trim().to_ascii_lowercase();
        Self::DEFAULT_ORDER
            .into_iter()
            .find(|k| k.label() == s)
            .ok_or_else(|| ReelpressError::validation(format!("unknown export engine '{s}'")))
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Builds a fresh decoder for each export job.
pub type DecoderFactory = Arc<dyn Fn() -> Box<dyn MediaDecoder> + Send + Sync>;

/// Everything an engine needs besides the job itself.
#[derive(Clone)]
pub struct EngineContext {
    /// Runtime configuration.
    pub config: ExportConfig,
    /// Decoder constructor.
    pub decoders: DecoderFactory,
}

impl EngineContext {
    /// Context decoding through [`SourceDecoder`].
    pub fn new(config: ExportConfig) -> Self {
        let decoder_cfg = config.clone();
        Self {
            config,
            decoders: Arc::new(move || {
                Box::new(SourceDecoder::from_config(&decoder_cfg)) as Box<dyn MediaDecoder>
            }),
        }
    }

    /// Replace the decoder constructor.
    pub fn with_decoders(mut self, decoders: DecoderFactory) -> Self {
        self.decoders = decoders;
        self
    }

    /// New decoder for one job.
    pub fn decoder(&self) -> Box<dyn MediaDecoder> {
        (self.decoders)()
    }
}

impl std::fmt::Debug for EngineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// One export request as seen by an engine.
pub struct ExportJob<'a> {
    /// Immutable timeline snapshot.
    pub timeline: &'a Timeline,
    /// Output parameters.
    pub settings: &'a ExportSettings,
    /// Progress channel back to the host.
    pub reporter: &'a ProgressReporter,
    /// Cooperative cancellation flag.
    pub abort: &'a AbortSignal,
    /// Session scratch directory, present for engines that asked for one.
    pub scratch_dir: Option<&'a Path>,
}

/// What an engine hands back on success.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineOutput {
    /// Written file.
    pub path: PathBuf,
    /// Frames delivered to the encoder.
    pub frame_count: u64,
    /// Elements skipped during compositing.
    pub warnings: Vec<AssetWarning>,
}

/// A constructed export strategy.
pub trait ExportEngine: Send {
    /// Which strategy this is.
    fn kind(&self) -> EngineKind;

    /// Render and encode the whole job.
    ///
    /// Must report non-decreasing progress, poll `job.abort` at every frame boundary and leave
    /// no running child process behind on any exit path.
    fn export(&mut self, job: &ExportJob<'_>) -> ReelpressResult<EngineOutput>;
}

#[cfg(test)]
#[path = "../../tests/unit/engine/kind.rs"]
mod tests;
