use std::collections::HashMap;

use crate::assets::text::{ShapedText, TextLayoutEngine};
use crate::decode::adapter::DecodeAdapter;
use crate::foundation::core::{Affine, Canvas};
use crate::foundation::error::{ReelpressError, ReelpressResult};
use crate::render::cpu::{affine_to_cpu, fit_affine, overlay_affine, raster_to_image};
use crate::render::frame::FrameRGBA;
use crate::render::plan::plan_frame;
use crate::timeline::model::{DecorativeOverlay, MediaClip, TextOverlay, Timeline, TimelineElement};

/// Non-fatal failure to draw one element on one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct AssetWarning {
    /// Element that was skipped.
    pub element_id: String,
    /// Timeline time of the affected frame.
    pub time_sec: f64,
    /// Decoder or layout message.
    pub message: String,
}

impl AssetWarning {
    /// Equivalent [`ReelpressError::AssetDecode`].
    pub fn to_error(&self) -> ReelpressError {
        ReelpressError::asset_decode(self.element_id.clone(), self.message.clone())
    }
}

impl std::fmt::Display for AssetWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "skipped '{}' at {:.3}s: {}",
            self.element_id, self.time_sec, self.message
        )
    }
}

/// Output of [`FrameCompositor::render_frame`].
#[derive(Clone, Debug)]
pub struct ComposedFrame {
    /// Composited raster.
    pub frame: FrameRGBA,
    /// Elements skipped on this frame.
    pub warnings: Vec<AssetWarning>,
}

/// Produces one composited raster per sample time.
///
/// Reuses its `vello_cpu` render context and target pixmap across frames. Text layouts are
/// shaped once per element and cached for the lifetime of the compositor.
pub struct FrameCompositor {
    canvas: Canvas,
    background_rgba: [u8; 4],
    ctx: vello_cpu::RenderContext,
    target: vello_cpu::Pixmap,
    text_engine: TextLayoutEngine,
    text_cache: HashMap<String, ShapedText>,
}

impl FrameCompositor {
    /// Create a compositor for `canvas`, clearing every frame to `background_rgba`.
    pub fn new(canvas: Canvas, background_rgba: [u8; 4]) -> ReelpressResult<Self> {
        let w: u16 = canvas
            .width
            .try_into()
            .map_err(|_| ReelpressError::validation("canvas width exceeds u16"))?;
        let h: u16 = canvas
            .height
            .try_into()
            .map_err(|_| ReelpressError::validation("canvas height exceeds u16"))?;
        if w == 0 || h == 0 {
            return Err(ReelpressError::validation("canvas must be non-empty"));
        }
        Ok(Self {
            canvas,
            background_rgba,
            ctx: vello_cpu::RenderContext::new(w, h),
            target: vello_cpu::Pixmap::new(w, h),
            text_engine: TextLayoutEngine::new(),
            text_cache: HashMap::new(),
        })
    }

    /// Output canvas.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Composite the timeline at `t` into a new frame.
    pub fn render_frame(
        &mut self,
        timeline: &Timeline,
        t: f64,
        adapter: &mut DecodeAdapter,
    ) -> ReelpressResult<ComposedFrame> {
        let mut frame = FrameRGBA::new(self.canvas);
        let warnings = self.render_frame_into(timeline, t, adapter, &mut frame)?;
        Ok(ComposedFrame { frame, warnings })
    }

    /// Composite the timeline at `t` into a recycled frame buffer.
    #[tracing::instrument(level = "trace", skip(self, timeline, adapter, out))]
    pub fn render_frame_into(
        &mut self,
        timeline: &Timeline,
        t: f64,
        adapter: &mut DecodeAdapter,
        out: &mut FrameRGBA,
    ) -> ReelpressResult<Vec<AssetWarning>> {
        let plan = plan_frame(timeline, t);
        let mut warnings = Vec::new();

        self.ctx.reset();
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        let [r, g, b, a] = self.background_rgba;
        self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.canvas.width),
            f64::from(self.canvas.height),
        ));

        for draw in plan.draws() {
            let Some(element) = draw.resolve(timeline) else {
                continue;
            };
            let res = match element {
                TimelineElement::VideoClip(c) | TimelineElement::ImageClip(c) => {
                    self.draw_media(timeline, c, t, adapter)
                }
                TimelineElement::TextOverlay(o) => self.draw_text(timeline, o, adapter),
                TimelineElement::DecorativeOverlay(o) => {
                    self.draw_decorative(timeline, o, t, adapter)
                }
            };
            if let Err(e) = res {
                tracing::warn!(element = element.id(), t, error = %e, "skipping element");
                warnings.push(AssetWarning {
                    element_id: element.id().to_string(),
                    time_sec: t,
                    message: e.to_string(),
                });
            }
        }

        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.target);

        let bytes = self.target.data_as_u8_slice();
        out.width = self.canvas.width;
        out.height = self.canvas.height;
        out.premultiplied = true;
        out.data.resize(bytes.len(), 0);
        out.data.copy_from_slice(bytes);
        Ok(warnings)
    }

    fn fill_image(
        &mut self,
        image: vello_cpu::Image,
        transform: Affine,
        w: f64,
        h: f64,
        opacity: f32,
    ) {
        self.ctx.set_transform(affine_to_cpu(transform));
        self.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(image);
        if opacity < 1.0 {
            self.ctx.push_opacity_layer(opacity);
        }
        self.ctx
            .fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));
        if opacity < 1.0 {
            self.ctx.pop_layer();
        }
    }

    fn draw_media(
        &mut self,
        timeline: &Timeline,
        clip: &MediaClip,
        t: f64,
        adapter: &mut DecodeAdapter,
    ) -> ReelpressResult<()> {
        let item = timeline.media_item(&clip.media)?;
        let raster = adapter.raster_at(&clip.media, item, clip.local_time(t))?;
        let image = raster_to_image(&raster)?;
        let transform = fit_affine(clip.fit, self.canvas, raster.width, raster.height);
        self.fill_image(
            image,
            transform,
            f64::from(raster.width),
            f64::from(raster.height),
            1.0,
        );
        Ok(())
    }

    fn draw_decorative(
        &mut self,
        timeline: &Timeline,
        overlay: &DecorativeOverlay,
        t: f64,
        adapter: &mut DecodeAdapter,
    ) -> ReelpressResult<()> {
        let opacity = overlay.transform.opacity.clamp(0.0, 1.0) as f32;
        if opacity <= 0.0 {
            return Ok(());
        }
        let item = timeline.media_item(&overlay.asset)?;
        let local = (t - overlay.header.start_sec).max(0.0);
        let raster = adapter.raster_at(&overlay.asset, item, local)?;
        let image = raster_to_image(&raster)?;

        let box_w = f64::from(self.canvas.width) * overlay.width_pct / 100.0;
        let box_h = f64::from(self.canvas.height) * overlay.height_pct / 100.0;
        let rw = f64::from(raster.width);
        let rh = f64::from(raster.height);
        let transform = overlay_affine(&overlay.transform, self.canvas, box_w, box_h)
            * Affine::scale_non_uniform(box_w / rw, box_h / rh);
        self.fill_image(image, transform, rw, rh, opacity);
        Ok(())
    }

    fn draw_text(
        &mut self,
        timeline: &Timeline,
        overlay: &TextOverlay,
        adapter: &mut DecodeAdapter,
    ) -> ReelpressResult<()> {
        let opacity = overlay.transform.opacity.clamp(0.0, 1.0) as f32;
        if opacity <= 0.0 || overlay.text.is_empty() {
            return Ok(());
        }
        if !self.text_cache.contains_key(&overlay.header.id) {
            let item = timeline.media_item(&overlay.font)?;
            let font_bytes = adapter.font(&overlay.font, item)?;
            let size_px = (f64::from(self.canvas.height) * overlay.font_size_pct / 100.0) as f32;
            let max_width_px = overlay
                .max_width_pct
                .map(|p| (f64::from(self.canvas.width) * p / 100.0) as f32);
            let shaped = self.text_engine.shape(
                &overlay.text,
                &font_bytes,
                size_px,
                overlay.color_rgba8.into(),
                max_width_px,
            )?;
            self.text_cache.insert(overlay.header.id.clone(), shaped);
        }
        let Some(shaped) = self.text_cache.get(&overlay.header.id) else {
            return Ok(());
        };

        let transform = overlay_affine(
            &overlay.transform,
            self.canvas,
            f64::from(shaped.width),
            f64::from(shaped.height),
        );
        let ctx = &mut self.ctx;
        ctx.set_transform(affine_to_cpu(transform));
        if opacity < 1.0 {
            ctx.push_opacity_layer(opacity);
        }
        for line in shaped.layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let brush = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));
                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&shaped.font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        if opacity < 1.0 {
            ctx.pop_layer();
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
