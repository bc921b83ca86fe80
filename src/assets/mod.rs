//! Source decoding helpers: stills, SVG, text shaping and `ffmpeg` video streams.

pub(crate) mod decode;
pub(crate) mod media;
pub(crate) mod resolve;
pub(crate) mod svg_raster;
pub(crate) mod text;
