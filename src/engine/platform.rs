use std::process::{Command, Stdio};

use crate::decode::adapter::DecodePolicy;
use crate::encode::args::trial_encode_args;
use crate::encode::ffmpeg::list_encoders;
use crate::engine::continuous::stream_export;
use crate::engine::{EngineContext, EngineKind, EngineOutput, ExportEngine, ExportJob};
use crate::foundation::error::{ReelpressError, ReelpressResult};
use crate::timeline::settings::{Container, ExportSettings};

fn init_err(msg: impl Into<String>) -> ReelpressError {
    ReelpressError::engine_init(EngineKind::PlatformCodec.label(), msg)
}

/// Streams frames into a hardware/platform H.264 encoder exposed by the local `ffmpeg`.
#[derive(Debug)]
pub struct PlatformCodecEngine {
    ctx: EngineContext,
    codec: String,
}

impl PlatformCodecEngine {
    /// Cheap capability check: runnable `ffmpeg`, an H.264 container and candidate encoders.
    pub fn probe(ctx: &EngineContext, settings: &ExportSettings) -> ReelpressResult<()> {
        if settings.container == Container::Webm {
            return Err(init_err("platform encoders produce H.264, not WebM"));
        }
        if ctx.config.hardware_encoders.is_empty() {
            return Err(init_err("no hardware encoders configured"));
        }
        if !ctx.config.tools().has_ffmpeg() {
            return Err(init_err("ffmpeg not runnable"));
        }
        Ok(())
    }

    /// Pick the first configured encoder the local `ffmpeg` lists and that survives a one-frame
    /// trial encode at the export resolution.
    pub fn new(ctx: EngineContext, settings: &ExportSettings) -> ReelpressResult<Self> {
        let tools = ctx.config.tools();
        let available = list_encoders(&tools).map_err(|e| init_err(e.to_string()))?;
        let candidates = ctx.config.hardware_encoders.clone();
        let mut rejected = Vec::new();
        for codec in candidates {
            if !available.iter().any(|a| *a == codec) {
                rejected.push(format!("{codec}: not built into ffmpeg"));
                continue;
            }
            let out = Command::new(&tools.ffmpeg)
                .args(trial_encode_args(
                    &codec,
                    settings.quality,
                    settings.width,
                    settings.height,
                ))
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .output()
                .map_err(|e| init_err(format!("failed to run trial encode: {e}")))?;
            if out.status.success() {
                tracing::info!(codec = codec.as_str(), "platform encoder accepted trial frame");
                return Ok(Self { ctx, codec });
            }
            let stderr = String::from_utf8_lossy(&out.stderr);
            let reason = stderr.lines().last().unwrap_or("trial encode failed").trim();
            tracing::debug!(
                codec = codec.as_str(),
                reason,
                "platform encoder rejected trial frame"
            );
            rejected.push(format!("{codec}: {reason}"));
        }
        Err(init_err(if rejected.is_empty() {
            "no usable platform encoder".to_string()
        } else {
            rejected.join(", ")
        }))
    }

    /// Encoder chosen at construction.
    pub fn codec(&self) -> &str {
        &self.codec
    }
}

impl ExportEngine for PlatformCodecEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::PlatformCodec
    }

    fn export(&mut self, job: &ExportJob<'_>) -> ReelpressResult<EngineOutput> {
        stream_export(&self.ctx, job, &self.codec, DecodePolicy::Preloaded)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/platform.rs"]
mod tests;
