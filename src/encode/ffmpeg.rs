use std::ffi::OsString;
use std::io::{BufRead as _, BufReader, Write as _};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::config::FfmpegTools;
use crate::encode::args::{EncodeTarget, raw_stream_args};
use crate::encode::progress::EncodeProgress;
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{ReelpressError, ReelpressResult};
use crate::foundation::math::flatten_premul_over_bg;
use crate::render::frame::FrameRGBA;
use crate::session::abort::AbortSignal;

const ABORT_POLL: Duration = Duration::from_millis(50);

/// Options for [`FfmpegSink`].
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// External tool locations.
    pub tools: FfmpegTools,
    /// Codec, quality and output file.
    pub target: EncodeTarget,
    /// Background color used to flatten alpha (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
}

/// Sink that spawns the system `ffmpeg` and streams raw frames to its stdin.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<JoinHandle<String>>,

    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl FfmpegSink {
    /// Create a new sink that streams into `ffmpeg`.
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            scratch: Vec::new(),
            cfg: None,
            last_idx: None,
        }
    }

    /// Close stdin, wait for the encoder and collect its diagnostics.
    fn finish_process(&mut self) -> ReelpressResult<(ExitStatus, String)> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| ReelpressError::evaluation("ffmpeg sink not started"))?;
        let status = child.wait().map_err(|e| {
            ReelpressError::evaluation(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        Ok((status, join_drain(self.stderr_drain.take())))
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> ReelpressResult<()> {
        if cfg.fps.num == 0 || cfg.fps.den == 0 {
            return Err(ReelpressError::validation("fps must be non-zero"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(ReelpressError::validation(
                "ffmpeg sink width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(ReelpressError::validation(
                "ffmpeg sink width/height must be even (required for yuv420p output)",
            ));
        }
        ensure_parent_dir(&self.opts.target.out_path)?;

        let args = raw_stream_args(&self.opts.target, cfg.width, cfg.height, cfg.fps);
        tracing::debug!(
            program = %self.opts.tools.ffmpeg.display(),
            ?args,
            "spawning stream encoder"
        );
        let mut child = Command::new(&self.opts.tools.ffmpeg)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ReelpressError::evaluation(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ReelpressError::evaluation("failed to open ffmpeg stdin"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReelpressError::evaluation("failed to open ffmpeg stderr"))?;

        self.scratch = vec![0u8; (cfg.width as usize) * (cfg.height as usize) * 4];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(spawn_drain(stderr));
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ReelpressResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| ReelpressError::evaluation("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(ReelpressError::evaluation(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);

        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(ReelpressError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        if frame.data.len() != self.scratch.len() {
            return Err(ReelpressError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }

        // ffmpeg has no notion of premultiplied input.
        flatten_premul_over_bg(&mut self.scratch, &frame.data, self.opts.bg_rgba);

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(ReelpressError::evaluation("ffmpeg sink is already finalized"));
        };
        if let Err(write_err) = stdin.write_all(&self.scratch) {
            // A broken pipe means the encoder exited; its stderr says why.
            let (status, diagnostics) = self.finish_process()?;
            let diagnostics = if diagnostics.trim().is_empty() {
                format!("failed to write frame to ffmpeg stdin: {write_err}")
            } else {
                diagnostics
            };
            return Err(ReelpressError::encode_process(status.code(), diagnostics));
        }
        Ok(())
    }

    fn end(&mut self) -> ReelpressResult<()> {
        let (status, diagnostics) = self.finish_process()?;
        self.cfg = None;
        if !status.success() {
            return Err(ReelpressError::encode_process(
                status.code(),
                diagnostics.trim().to_string(),
            ));
        }
        Ok(())
    }

    fn abort(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        let _ = join_drain(self.stderr_drain.take());
        self.cfg = None;
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if self.child.is_some() {
            self.abort();
        }
    }
}

fn spawn_drain<R: std::io::Read + Send + 'static>(mut reader: R) -> JoinHandle<String> {
    std::thread::spawn(move || {
        let mut bytes = Vec::new();
        match reader.read_to_end(&mut bytes) {
            Ok(_) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => format!("<failed to read ffmpeg stderr: {e}>"),
        }
    })
}

fn join_drain(handle: Option<JoinHandle<String>>) -> String {
    match handle {
        Some(h) => h
            .join()
            .unwrap_or_else(|_| "<ffmpeg stderr drain thread panicked>".to_string()),
        None => String::new(),
    }
}

/// Run `ffmpeg args` to completion, reporting `-progress pipe:1` updates.
///
/// Polls `abort` while the process runs and kills it once cancellation is requested. A non-zero
/// exit becomes [`ReelpressError::EncodeProcess`] carrying the captured stderr.
pub fn run_encoder(
    tools: &FfmpegTools,
    args: &[OsString],
    abort: &AbortSignal,
    mut on_progress: impl FnMut(&EncodeProgress),
) -> ReelpressResult<()> {
    abort.check()?;
    tracing::debug!(program = %tools.ffmpeg.display(), ?args, "spawning encoder");
    let mut child = Command::new(&tools.ffmpeg)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ReelpressError::evaluation(format!("failed to start ffmpeg: {e}")))?;
    tracing::info!(pid = child.id(), "encoder process started");

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| ReelpressError::evaluation("failed to capture ffmpeg stdout"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| ReelpressError::evaluation("failed to capture ffmpeg stderr"))?;
    let stderr_drain = spawn_drain(stderr);

    let (tx, rx) = mpsc::channel::<String>();
    let stdout_reader = std::thread::spawn(move || {
        for line in BufReader::new(stdout).lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let mut progress = EncodeProgress::default();
    let mut cancelled = false;
    loop {
        if abort.is_aborted() {
            cancelled = true;
            let _ = child.kill();
            break;
        }
        match rx.recv_timeout(ABORT_POLL) {
            Ok(line) => {
                if progress.feed_line(&line) {
                    tracing::debug!(
                        frame = ?progress.frame,
                        out_time = ?progress.out_time_secs,
                        "encoder progress"
                    );
                    on_progress(&progress);
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    let status = child
        .wait()
        .map_err(|e| ReelpressError::evaluation(format!("failed to wait on ffmpeg: {e}")))?;
    let _ = stdout_reader.join();
    let diagnostics = join_drain(Some(stderr_drain));

    if cancelled {
        return Err(ReelpressError::Cancelled);
    }
    if !status.success() {
        return Err(ReelpressError::encode_process(
            status.code(),
            diagnostics.trim().to_string(),
        ));
    }
    Ok(())
}

/// Return the encoder names the local `ffmpeg` reports.
pub fn list_encoders(tools: &FfmpegTools) -> ReelpressResult<Vec<String>> {
    let out = Command::new(&tools.ffmpeg)
        .args(["-hide_banner", "-encoders"])
        .stdin(Stdio::null())
        .output()
        .map_err(|e| ReelpressError::evaluation(format!("failed to run ffmpeg -encoders: {e}")))?;
    if !out.status.success() {
        return Err(ReelpressError::encode_process(
            out.status.code(),
            String::from_utf8_lossy(&out.stderr).trim().to_string(),
        ));
    }
    Ok(parse_encoder_list(&String::from_utf8_lossy(&out.stdout)))
}

/// Parse `ffmpeg -encoders` output into video encoder names.
pub fn parse_encoder_list(listing: &str) -> Vec<String> {
    listing
        .lines()
        .filter_map(|line| {
            let mut cols = line.split_whitespace();
            let flags = cols.next()?;
            let name = cols.next()?;
            // Capability column is six characters, the first being the media type.
            (flags.len() == 6 && flags.starts_with('V') && name != "=")
                .then(|| name.to_string())
        })
        .collect()
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> ReelpressResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
