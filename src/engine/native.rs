use crate::decode::adapter::{DecodeAdapter, DecodePolicy};
use crate::encode::args::{EncodeTarget, image_sequence_args};
use crate::encode::ffmpeg::{ensure_parent_dir, run_encoder};
use crate::encode::sink::PngSequenceSink;
use crate::engine::pipeline::{PipelineOpts, run_pipeline};
use crate::engine::{EngineContext, EngineKind, EngineOutput, ExportEngine, ExportJob};
use crate::foundation::error::{ReelpressError, ReelpressResult};
use crate::render::compositor::FrameCompositor;

/// Progress value at which frame rendering hands over to the external encoder.
pub const ENCODE_STAGE_START: f32 = 50.0;

/// Writes every frame as a PNG into the session scratch directory, then runs one `ffmpeg`
/// process over the sequence.
#[derive(Debug)]
pub struct NativeProcessEngine {
    ctx: EngineContext,
}

impl NativeProcessEngine {
    /// Create the engine.
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    /// Capability check: a runnable `ffmpeg`.
    pub fn probe(ctx: &EngineContext) -> ReelpressResult<()> {
        if ctx.config.tools().has_ffmpeg() {
            Ok(())
        } else {
            Err(ReelpressError::engine_init(
                EngineKind::NativeProcess.label(),
                format!(
                    "ffmpeg not runnable at '{}'",
                    ctx.config.ffmpeg_program.display()
                ),
            ))
        }
    }
}

impl ExportEngine for NativeProcessEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::NativeProcess
    }

    fn export(&mut self, job: &ExportJob<'_>) -> ReelpressResult<EngineOutput> {
        let settings = job.settings;
        let frames_dir = job.scratch_dir.ok_or_else(|| {
            ReelpressError::evaluation("native export requires a session scratch directory")
        })?;

        let mut adapter = DecodeAdapter::new(self.ctx.decoder(), DecodePolicy::Ephemeral);
        let mut compositor = FrameCompositor::new(settings.canvas(), settings.background_rgba)?;
        let mut sink = PngSequenceSink::new(frames_dir, settings.background_rgba);
        let stats = run_pipeline(
            job,
            &mut compositor,
            &mut adapter,
            &mut sink,
            &PipelineOpts {
                depth: self.ctx.config.pipeline_depth,
                progress_start: 0.0,
                progress_end: ENCODE_STAGE_START,
                stage: "rendering frames",
            },
        )?;
        drop(adapter);

        job.abort.check()?;
        job.reporter.report(ENCODE_STAGE_START, "encoding");
        ensure_parent_dir(&settings.output_path)?;
        let target = EncodeTarget::software(settings);
        let args = image_sequence_args(
            &target,
            frames_dir,
            settings.width,
            settings.height,
            settings.fps,
        );
        let total_frames = stats.frames_delivered;
        let total_secs = settings.encoded_duration_secs();
        run_encoder(&self.ctx.config.tools(), &args, job.abort, |p| {
            job.reporter.report_span(
                ENCODE_STAGE_START,
                100.0,
                p.fraction(total_frames, total_secs),
                "encoding",
            );
        })?;

        Ok(EngineOutput {
            path: settings.output_path.clone(),
            frame_count: total_frames,
            warnings: stats.warnings,
        })
    }
}
