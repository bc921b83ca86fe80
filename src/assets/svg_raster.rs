use crate::assets::decode::Raster;
use crate::foundation::error::{ReelpressError, ReelpressResult};

/// Largest raster edge produced for an SVG.
const MAX_DIM: u32 = 16_384;

/// Intrinsic pixel size of an SVG, honouring an explicit override when non-zero.
pub fn svg_intrinsic_size(
    tree: &usvg::Tree,
    width_hint: u32,
    height_hint: u32,
) -> ReelpressResult<(u32, u32)> {
    fn to_px(v: f32) -> ReelpressResult<u32> {
        if !v.is_finite() || v <= 0.0 {
            return Err(ReelpressError::evaluation("svg has invalid width/height"));
        }
        Ok((v.ceil() as u32).max(1))
    }

    let size = tree.size();
    let w = if width_hint > 0 {
        width_hint
    } else {
        to_px(size.width())?
    };
    let h = if height_hint > 0 {
        height_hint
    } else {
        to_px(size.height())?
    };
    if w > MAX_DIM || h > MAX_DIM {
        return Err(ReelpressError::evaluation(format!(
            "svg raster size too large: {w}x{h} (max {MAX_DIM}x{MAX_DIM})"
        )));
    }
    Ok((w, h))
}

/// Rasterise `tree` scaled to exactly `width` x `height`.
///
/// `tiny_skia` pixmaps are already premultiplied RGBA8.
pub fn rasterize_svg(tree: &usvg::Tree, width: u32, height: u32) -> ReelpressResult<Raster> {
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| ReelpressError::evaluation("failed to allocate svg pixmap"))?;

    let sx = (width as f32) / tree.size().width();
    let sy = (height as f32) / tree.size().height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);

    resvg::render(tree, xform, &mut pixmap.as_mut());
    Raster::from_premul(width, height, pixmap.take())
}
