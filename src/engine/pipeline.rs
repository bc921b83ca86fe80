use std::sync::mpsc;

use crate::decode::adapter::DecodeAdapter;
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::engine::ExportJob;
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{ReelpressError, ReelpressResult};
use crate::render::compositor::{AssetWarning, FrameCompositor};
use crate::render::frame::FrameRGBA;

/// Pipeline parameters for one render pass.
#[derive(Clone, Debug)]
pub struct PipelineOpts {
    /// Frames composited but not yet consumed, including the one being composited.
    pub depth: usize,
    /// Progress range covered by this pass.
    pub progress_start: f32,
    /// End of the progress range.
    pub progress_end: f32,
    /// Stage message sent with per-frame progress.
    pub stage: &'static str,
}

/// Counters from one render pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PipelineStats {
    /// Frames composited by the producer.
    pub frames_composited: u64,
    /// Frames accepted by the sink.
    pub frames_delivered: u64,
    /// Elements skipped during compositing.
    pub warnings: Vec<AssetWarning>,
}

struct FrameMsg {
    idx: FrameIndex,
    frame: FrameRGBA,
}

/// Composite every frame of `job` and hand it to `sink`, in order.
///
/// Compositing runs on the calling thread; the sink runs on a scoped consumer thread. Exactly
/// `opts.depth` frame buffers circulate between the two, so a slow sink blocks the compositor.
/// `sink.end()` runs only after every frame was delivered; any failure or cancellation calls
/// `sink.abort()` instead.
#[tracing::instrument(skip_all, fields(frames = job.settings.frame_count(), depth = opts.depth))]
pub fn run_pipeline(
    job: &ExportJob<'_>,
    compositor: &mut FrameCompositor,
    adapter: &mut DecodeAdapter,
    sink: &mut dyn FrameSink,
    opts: &PipelineOpts,
) -> ReelpressResult<PipelineStats> {
    let settings = job.settings;
    let total = settings.frame_count();
    let depth = opts.depth.max(1);

    job.abort.check()?;
    sink.begin(SinkConfig {
        width: settings.width,
        height: settings.height,
        fps: settings.fps,
    })?;

    let ((produce_res, mut stats), consume_res) = std::thread::scope(|scope| {
        let (tx, rx) = mpsc::sync_channel::<FrameMsg>(depth);
        let (recycle_tx, recycle_rx) = mpsc::sync_channel::<FrameRGBA>(depth);
        let sink_ref: &mut dyn FrameSink = &mut *sink;
        let abort = job.abort;
        let reporter = job.reporter;

        let consumer = scope.spawn(move || -> ReelpressResult<u64> {
            let mut delivered = 0u64;
            while let Ok(msg) = rx.recv() {
                if abort.is_aborted() {
                    break;
                }
                sink_ref.push_frame(msg.idx, &msg.frame)?;
                delivered += 1;
                reporter.report_span(
                    opts.progress_start,
                    opts.progress_end,
                    delivered as f64 / total.max(1) as f64,
                    opts.stage,
                );
                // The producer may already be gone; the buffer is then simply dropped.
                let _ = recycle_tx.send(msg.frame);
            }
            Ok(delivered)
        });

        let mut stats = PipelineStats::default();
        let mut free: Vec<FrameRGBA> = (0..depth)
            .map(|_| FrameRGBA::new(settings.canvas()))
            .collect();
        let produce_res = (|| -> ReelpressResult<()> {
            for i in 0..total {
                job.abort.check()?;
                let mut frame = match free.pop() {
                    Some(f) => f,
                    None => match recycle_rx.recv() {
                        Ok(f) => f,
                        // Consumer stopped; its result explains why.
                        Err(_) => return Ok(()),
                    },
                };
                job.abort.check()?;
                let idx = FrameIndex(i);
                let t = settings.frame_time_secs(idx);
                let warnings = compositor.render_frame_into(job.timeline, t, adapter, &mut frame)?;
                stats.frames_composited += 1;
                stats.warnings.extend(warnings);
                if tx.send(FrameMsg { idx, frame }).is_err() {
                    return Ok(());
                }
            }
            Ok(())
        })();
        drop(tx);

        let consume_res = consumer
            .join()
            .unwrap_or_else(|_| Err(ReelpressError::evaluation("frame consumer thread panicked")));
        ((produce_res, stats), consume_res)
    });

    let outcome = match (produce_res, consume_res) {
        _ if job.abort.is_aborted() => Err(ReelpressError::Cancelled),
        (_, Err(e)) => Err(e),
        (Err(e), _) => Err(e),
        (Ok(()), Ok(delivered)) if delivered != total => Err(ReelpressError::evaluation(format!(
            "frame consumer stopped after {delivered} of {total} frames"
        ))),
        (Ok(()), Ok(delivered)) => {
            stats.frames_delivered = delivered;
            Ok(())
        }
    };

    match outcome {
        Ok(()) => {
            sink.end()?;
            tracing::debug!(
                frames = stats.frames_delivered,
                warnings = stats.warnings.len(),
                "render pass complete"
            );
            Ok(stats)
        }
        Err(e) => {
            sink.abort();
            Err(e)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/pipeline.rs"]
mod tests;
