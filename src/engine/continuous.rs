use crate::decode::adapter::{DecodeAdapter, DecodePolicy};
use crate::encode::args::EncodeTarget;
use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
use crate::engine::pipeline::{PipelineOpts, run_pipeline};
use crate::engine::{EngineContext, EngineKind, EngineOutput, ExportEngine, ExportJob};
use crate::foundation::error::{ReelpressError, ReelpressResult};
use crate::render::compositor::FrameCompositor;

/// Share of the progress range spent streaming frames; the rest belongs to finalisation.
pub(crate) const STREAM_PROGRESS_END: f32 = 95.0;

/// Streams composited frames straight into an `ffmpeg` process via stdin.
///
/// The plain variant decodes sources per frame; the optimized variant opens every source once
/// per job.
#[derive(Debug)]
pub struct ContinuousCaptureEngine {
    ctx: EngineContext,
    policy: DecodePolicy,
}

impl ContinuousCaptureEngine {
    /// Per-frame decode variant.
    pub fn new(ctx: EngineContext) -> Self {
        Self {
            ctx,
            policy: DecodePolicy::Ephemeral,
        }
    }

    /// Preloaded decode variant.
    pub fn optimized(ctx: EngineContext) -> Self {
        Self {
            ctx,
            policy: DecodePolicy::Preloaded,
        }
    }

    /// Capability check: a runnable `ffmpeg`.
    pub fn probe(ctx: &EngineContext, kind: EngineKind) -> ReelpressResult<()> {
        if ctx.config.tools().has_ffmpeg() {
            Ok(())
        } else {
            Err(ReelpressError::engine_init(
                kind.label(),
                format!(
                    "ffmpeg not runnable at '{}'",
                    ctx.config.ffmpeg_program.display()
                ),
            ))
        }
    }
}

impl ExportEngine for ContinuousCaptureEngine {
    fn kind(&self) -> EngineKind {
        match self.policy {
            DecodePolicy::Ephemeral => EngineKind::ContinuousCapture,
            DecodePolicy::Preloaded => EngineKind::ContinuousCaptureOptimized,
        }
    }

    fn export(&mut self, job: &ExportJob<'_>) -> ReelpressResult<EngineOutput> {
        let codec = job.settings.container.software_codec();
        stream_export(&self.ctx, job, codec, self.policy)
    }
}

/// Composite `job` and stream it into `codec`.
pub(crate) fn stream_export(
    ctx: &EngineContext,
    job: &ExportJob<'_>,
    codec: &str,
    policy: DecodePolicy,
) -> ReelpressResult<EngineOutput> {
    let settings = job.settings;
    let mut adapter = DecodeAdapter::new(ctx.decoder(), policy);
    if policy == DecodePolicy::Preloaded {
        job.reporter.report(0.0, "opening sources");
        adapter.prepare(job.timeline)?;
    }
    let mut compositor = FrameCompositor::new(settings.canvas(), settings.background_rgba)?;
    let mut sink = FfmpegSink::new(FfmpegSinkOpts {
        tools: ctx.config.tools(),
        target: EncodeTarget::from_settings(settings, codec),
        bg_rgba: settings.background_rgba,
    });

    tracing::info!(codec, ?policy, frames = settings.frame_count(), "streaming export");
    let stats = run_pipeline(
        job,
        &mut compositor,
        &mut adapter,
        &mut sink,
        &PipelineOpts {
            depth: ctx.config.pipeline_depth,
            progress_start: 0.0,
            progress_end: STREAM_PROGRESS_END,
            stage: "encoding frames",
        },
    )?;
    adapter.release();

    Ok(EngineOutput {
        path: settings.output_path.clone(),
        frame_count: stats.frames_delivered,
        warnings: stats.warnings,
    })
}
