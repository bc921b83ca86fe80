use std::collections::HashMap;
use std::sync::Arc;

use crate::assets::decode::{Raster, decode_image, parse_svg};
use crate::assets::media::{VideoStream, probe_video};
use crate::assets::resolve::MediaResolver;
use crate::assets::svg_raster::{rasterize_svg, svg_intrinsic_size};
use crate::config::{ExportConfig, FfmpegTools};
use crate::decode::adapter::{DecodeHandle, MediaDecoder};
use crate::foundation::error::{ReelpressError, ReelpressResult};
use crate::timeline::model::{MediaItem, MediaKind, MediaRef};

enum OpenSource {
    Still(Raster),
    Video(VideoStream),
}

/// Production decoder over the local filesystem and the system `ffmpeg`.
pub struct SourceDecoder {
    resolver: MediaResolver,
    tools: FfmpegTools,
    restart_window_sec: f64,
    next_id: u64,
    open: HashMap<u64, OpenSource>,
}

impl SourceDecoder {
    /// Create a decoder resolving locators through `resolver`.
    pub fn new(resolver: MediaResolver, tools: FfmpegTools, restart_window_sec: f64) -> Self {
        Self {
            resolver,
            tools,
            restart_window_sec,
            next_id: 0,
            open: HashMap::new(),
        }
    }

    /// Decoder configured from an [`ExportConfig`].
    pub fn from_config(cfg: &ExportConfig) -> Self {
        Self::new(
            MediaResolver::new(&cfg.assets_root),
            cfg.tools(),
            cfg.video_restart_window_sec,
        )
    }

    /// Number of currently open contexts.
    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    fn open_source(&self, item: &MediaItem) -> ReelpressResult<OpenSource> {
        match item.kind {
            MediaKind::Image => {
                let bytes = self.resolver.read_bytes(&item.source)?;
                Ok(OpenSource::Still(decode_image(&bytes)?))
            }
            MediaKind::Svg => {
                let bytes = self.resolver.read_bytes(&item.source)?;
                let tree = parse_svg(&bytes)?;
                let (w, h) = svg_intrinsic_size(&tree, item.width, item.height)?;
                Ok(OpenSource::Still(rasterize_svg(&tree, w, h)?))
            }
            MediaKind::Video => {
                let path = self.resolver.resolve(&item.source)?;
                let info = probe_video(&self.tools, &path)?;
                Ok(OpenSource::Video(VideoStream::new(
                    self.tools.clone(),
                    Arc::new(info),
                    item.frame_rate_hint,
                    self.restart_window_sec,
                )))
            }
            MediaKind::Font => Err(ReelpressError::evaluation(
                "font media cannot be opened as a raster source",
            )),
        }
    }
}

impl MediaDecoder for SourceDecoder {
    fn open(&mut self, media: &MediaRef, item: &MediaItem) -> ReelpressResult<DecodeHandle> {
        let source = self.open_source(item).map_err(|e| {
            ReelpressError::evaluation(format!("open media '{media}' ({}): {e}", item.source))
        })?;
        self.next_id += 1;
        self.open.insert(self.next_id, source);
        Ok(DecodeHandle(self.next_id))
    }

    fn seek_and_read(&mut self, handle: DecodeHandle, local_time: f64) -> ReelpressResult<Raster> {
        let source = self.open.get_mut(&handle.0).ok_or_else(|| {
            ReelpressError::evaluation(format!("unknown decode handle {}", handle.0))
        })?;
        match source {
            OpenSource::Still(raster) => Ok(raster.clone()),
            OpenSource::Video(stream) => {
                let frame = stream.frame_at(local_time)?;
                let (w, h) = (stream.info().width, stream.info().height);
                Raster::from_straight(w, h, frame.as_ref().clone())
            }
        }
    }

    fn close(&mut self, handle: DecodeHandle) {
        // Dropping a video stream terminates its ffmpeg process.
        if let Some(OpenSource::Video(stream)) = self.open.remove(&handle.0) {
            tracing::debug!(
                source = %stream.info().source_path.display(),
                restarts = stream.restarts(),
                "video stream closed"
            );
        }
    }

    fn read_font(&mut self, media: &MediaRef, item: &MediaItem) -> ReelpressResult<Arc<Vec<u8>>> {
        if item.kind != MediaKind::Font {
            return Err(ReelpressError::evaluation(format!(
                "media '{media}' is not a font"
            )));
        }
        Ok(Arc::new(self.resolver.read_bytes(&item.source)?))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/decode/source.rs"]
mod tests;
