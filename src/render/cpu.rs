use std::sync::Arc;

use crate::assets::decode::Raster;
use crate::foundation::core::{Affine, Canvas, Vec2};
use crate::foundation::error::{ReelpressError, ReelpressResult};
use crate::timeline::model::{FitMode, OverlayTransform};

pub(crate) fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

pub(crate) fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> ReelpressResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| ReelpressError::evaluation("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| ReelpressError::evaluation("pixmap height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(ReelpressError::evaluation("pixmap byte len mismatch"));
    }
    // Pixmap stores PremulRgba8; raster bytes are already premultiplied.
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| {
            vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]])
        })
        .collect::<Vec<_>>();
    let may_have_opacities = bytes.chunks_exact(4).any(|px| px[3] != 255);
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

/// Wrap a decoded raster as a `vello_cpu` image paint.
pub(crate) fn raster_to_image(raster: &Raster) -> ReelpressResult<vello_cpu::Image> {
    let pixmap = pixmap_from_premul_bytes(&raster.rgba8_premul, raster.width, raster.height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

/// Map a `w` x `h` raster onto the canvas according to `fit`, centred.
pub(crate) fn fit_affine(fit: FitMode, canvas: Canvas, w: u32, h: u32) -> Affine {
    let cw = f64::from(canvas.width);
    let ch = f64::from(canvas.height);
    let w = f64::from(w.max(1));
    let h = f64::from(h.max(1));
    let (sx, sy) = match fit {
        FitMode::Contain => {
            let s = (cw / w).min(ch / h);
            (s, s)
        }
        FitMode::Cover => {
            let s = (cw / w).max(ch / h);
            (s, s)
        }
        FitMode::Stretch => (cw / w, ch / h),
    };
    let tx = (cw - w * sx) * 0.5;
    let ty = (ch - h * sy) * 0.5;
    Affine::translate(Vec2::new(tx, ty)) * Affine::scale_non_uniform(sx, sy)
}

/// Placement of a `box_w` x `box_h` overlay box in canvas pixels.
///
/// The box centre lands on the percent position; scale and rotation apply about that centre.
pub(crate) fn overlay_affine(
    transform: &OverlayTransform,
    canvas: Canvas,
    box_w: f64,
    box_h: f64,
) -> Affine {
    let cx = f64::from(canvas.width) * transform.position.x / 100.0;
    let cy = f64::from(canvas.height) * transform.position.y / 100.0;
    Affine::translate(Vec2::new(cx, cy))
        * Affine::rotate(transform.rotation_normalized().to_radians())
        * Affine::scale(transform.scale)
        * Affine::translate(Vec2::new(-box_w * 0.5, -box_h * 0.5))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
