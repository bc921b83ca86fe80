use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{ReelpressError, ReelpressResult};
use crate::foundation::math::premultiply_rgba8_in_place;

/// Decoded raster in premultiplied RGBA8 form.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl Raster {
    /// Wrap premultiplied bytes, checking the length against the dimensions.
    pub fn from_premul(width: u32, height: u32, bytes: Vec<u8>) -> ReelpressResult<Self> {
        let expected = (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4);
        if width == 0 || height == 0 || bytes.len() != expected {
            return Err(ReelpressError::evaluation(format!(
                "raster byte len mismatch: {}x{} needs {expected} bytes, got {}",
                width,
                height,
                bytes.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(bytes),
        })
    }

    /// Wrap straight-alpha RGBA8 bytes, premultiplying them.
    pub fn from_straight(width: u32, height: u32, mut bytes: Vec<u8>) -> ReelpressResult<Self> {
        premultiply_rgba8_in_place(&mut bytes);
        Self::from_premul(width, height, bytes)
    }
}

/// Decode an encoded still image (PNG, JPEG, ...) into a premultiplied raster.
pub fn decode_image(bytes: &[u8]) -> ReelpressResult<Raster> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Raster::from_straight(width, height, rgba.into_raw())
}

/// Parse SVG bytes into a `usvg` tree.
pub fn parse_svg(bytes: &[u8]) -> ReelpressResult<Arc<usvg::Tree>> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;
    Ok(Arc::new(tree))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
