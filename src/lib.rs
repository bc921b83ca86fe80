//! Reelpress composites a multi-track timeline into frames and exports them as a video file.
//!
//! The public API is session-oriented:
//!
//! - Build a [`Timeline`] with [`TimelineBuilder`] (or load it from JSON)
//! - Describe the output with [`ExportSettings`]
//! - Hand both to a [`SessionManager`], which picks an export engine from an ordered fallback
//!   chain and reports progress until the file is written
//!
//! Single frames can be rendered directly with a [`FrameCompositor`].
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod foundation;

/// Runtime configuration.
pub mod config;
/// Media decode adapter.
pub mod decode;
/// Frame sinks and `ffmpeg` plumbing.
pub mod encode;
/// Export engines.
pub mod engine;
/// Frame compositing.
pub mod render;
/// Export sessions.
pub mod session;
/// Timeline model.
pub mod timeline;

#[cfg(test)]
#[path = "../tests/unit/support.rs"]
pub(crate) mod test_support;

pub use crate::foundation::core::{Affine, Canvas, Fps, FrameIndex, Point, Rect, Vec2};
pub use crate::foundation::error::{ReelpressError, ReelpressResult};

pub use crate::assets::decode::Raster;
pub use crate::assets::resolve::MediaResolver;
pub use crate::config::{ExportConfig, FfmpegTools};
pub use crate::decode::adapter::{DecodeAdapter, DecodeHandle, DecodePolicy, MediaDecoder};
pub use crate::decode::source::SourceDecoder;
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::engine::{EngineKind, ExportEngine};
pub use crate::render::compositor::{AssetWarning, ComposedFrame, FrameCompositor};
pub use crate::render::frame::FrameRGBA;
pub use crate::session::abort::AbortSignal;
pub use crate::session::manager::{ExportedFile, SessionManager, SessionState};
pub use crate::session::progress::{ProgressReporter, ProgressSink};
pub use crate::timeline::dsl::TimelineBuilder;
pub use crate::timeline::model::{MediaItem, MediaKind, MediaRef, Timeline, TimelineElement};
pub use crate::timeline::settings::{Container, ExportSettings, QualityPreset};
