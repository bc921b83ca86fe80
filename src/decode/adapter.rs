use std::collections::HashMap;
use std::sync::Arc;

use crate::assets::decode::Raster;
use crate::foundation::error::{ReelpressError, ReelpressResult};
use crate::timeline::model::{MediaItem, MediaKind, MediaRef, Timeline};

/// Opaque handle to an open decode context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DecodeHandle(pub u64);

/// Uniform "produce a raster at local time T" contract over source decoding.
///
/// `seek_and_read` must block until the frame at (or immediately preceding) `local_time` is
/// available; returning a stale buffer from an earlier request is a contract violation.
pub trait MediaDecoder: Send {
    /// Open a decode context for one media item.
    fn open(&mut self, media: &MediaRef, item: &MediaItem) -> ReelpressResult<DecodeHandle>;

    /// Produce the raster at `local_time` seconds into the source.
    fn seek_and_read(&mut self, handle: DecodeHandle, local_time: f64) -> ReelpressResult<Raster>;

    /// Release a decode context. Unknown handles are ignored.
    fn close(&mut self, handle: DecodeHandle);

    /// Load raw font bytes for text overlays.
    fn read_font(&mut self, media: &MediaRef, item: &MediaItem) -> ReelpressResult<Arc<Vec<u8>>>;
}

/// Lifecycle of decode contexts within one export job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodePolicy {
    /// Open, read and close on every frame request.
    Ephemeral,
    /// Open every referenced source once before the first frame and close after the last.
    Preloaded,
}

/// Decode front-end used by the compositor.
///
/// Owns the decoder for the duration of a job and enforces the selected [`DecodePolicy`].
/// Dropping the adapter closes every context still open.
pub struct DecodeAdapter {
    decoder: Box<dyn MediaDecoder>,
    policy: DecodePolicy,
    preloaded: HashMap<MediaRef, Result<DecodeHandle, String>>,
    fonts: HashMap<MediaRef, Arc<Vec<u8>>>,
}

impl DecodeAdapter {
    /// Wrap `decoder` with `policy`.
    pub fn new(decoder: Box<dyn MediaDecoder>, policy: DecodePolicy) -> Self {
        Self {
            decoder,
            policy,
            preloaded: HashMap::new(),
            fonts: HashMap::new(),
        }
    }

    /// Selected policy.
    pub fn policy(&self) -> DecodePolicy {
        self.policy
    }

    /// Open every media item the timeline draws (Preloaded policy only).
    ///
    /// Sources that fail to open are remembered and reported on each frame that needs them, so a
    /// broken source degrades to skipped elements rather than a failed job.
    pub fn prepare(&mut self, timeline: &Timeline) -> ReelpressResult<()> {
        if self.policy != DecodePolicy::Preloaded {
            return Ok(());
        }
        for media in timeline.referenced_media() {
            let item = timeline.media_item(&media)?;
            if item.kind == MediaKind::Font || self.preloaded.contains_key(&media) {
                continue;
            }
            let opened = self.decoder.open(&media, item).map_err(|e| {
                tracing::warn!(media = %media, error = %e, "failed to preload media");
                e.to_string()
            });
            self.preloaded.insert(media, opened);
        }
        Ok(())
    }

    /// Raster of `media` at `local_time`.
    pub fn raster_at(
        &mut self,
        media: &MediaRef,
        item: &MediaItem,
        local_time: f64,
    ) -> ReelpressResult<Raster> {
        match self.policy {
            DecodePolicy::Ephemeral => {
                let handle = self.decoder.open(media, item)?;
                let out = self.decoder.seek_and_read(handle, local_time);
                self.decoder.close(handle);
                out
            }
            DecodePolicy::Preloaded => {
                let handle = match self.preloaded.get(media) {
                    Some(Ok(h)) => *h,
                    Some(Err(msg)) => return Err(ReelpressError::evaluation(msg.clone())),
                    None => {
                        // Not part of the prepared set; keep it open for the rest of the job.
                        let h = self.decoder.open(media, item)?;
                        self.preloaded.insert(media.clone(), Ok(h));
                        h
                    }
                };
                self.decoder.seek_and_read(handle, local_time)
            }
        }
    }

    /// Font bytes for `media`, loaded once per job.
    pub fn font(&mut self, media: &MediaRef, item: &MediaItem) -> ReelpressResult<Arc<Vec<u8>>> {
        if let Some(bytes) = self.fonts.get(media) {
            return Ok(bytes.clone());
        }
        let bytes = self.decoder.read_font(media, item)?;
        self.fonts.insert(media.clone(), bytes.clone());
        Ok(bytes)
    }

    /// Close every preloaded context.
    pub fn release(&mut self) {
        for (_, opened) in self.preloaded.drain() {
            if let Ok(handle) = opened {
                self.decoder.close(handle);
            }
        }
    }
}

impl Drop for DecodeAdapter {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/decode/adapter.rs"]
mod tests;
