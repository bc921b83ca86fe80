//! Media decode adapter: one raster contract over heterogeneous sources.

/// Decoder trait, lifecycle policies and the adapter front-end.
pub mod adapter;
/// Filesystem + `ffmpeg` backed decoder.
pub mod source;
