//! Frame sinks and the external encoder process.

/// `ffmpeg` command-line construction.
pub mod args;
/// Streaming `ffmpeg` sink and one-shot encoder runner.
pub mod ffmpeg;
/// `-progress` output parsing.
pub mod progress;
/// Sink trait plus in-memory and image-sequence sinks.
pub mod sink;
