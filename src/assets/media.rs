use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::Arc;

use crate::config::FfmpegTools;
use crate::foundation::error::{ReelpressError, ReelpressResult};

/// Fallback decode rate when neither the media table nor `ffprobe` report one.
const FALLBACK_FRAME_RATE: f64 = 30.0;

/// Basic metadata about a source video file.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoSourceInfo {
    /// Absolute source path used for probing/decoding.
    pub source_path: PathBuf,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Container duration in seconds, when reported.
    pub duration_sec: Option<f64>,
    /// Average frame rate of the first video stream, when reported.
    pub frame_rate: Option<f64>,
}

/// Probe source video metadata through `ffprobe`.
pub fn probe_video(tools: &FfmpegTools, source_path: &Path) -> ReelpressResult<VideoSourceInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        avg_frame_rate: Option<String>,
        r_frame_rate: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = Command::new(&tools.ffprobe)
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| ReelpressError::evaluation(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(ReelpressError::evaluation(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| ReelpressError::evaluation(format!("ffprobe json parse failed: {e}")))?;
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| ReelpressError::evaluation("no video stream found"))?;
    let width = video_stream
        .width
        .ok_or_else(|| ReelpressError::evaluation("missing video width from ffprobe"))?;
    let height = video_stream
        .height
        .ok_or_else(|| ReelpressError::evaluation("missing video height from ffprobe"))?;
    let frame_rate = video_stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_rational)
        .or_else(|| video_stream.r_frame_rate.as_deref().and_then(parse_rational));
    let duration_sec = parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0);

    Ok(VideoSourceInfo {
        source_path: source_path.to_path_buf(),
        width,
        height,
        duration_sec,
        frame_rate,
    })
}

/// Parse an ffprobe rational such as `30000/1001`. Zero or malformed values yield `None`.
pub(crate) fn parse_rational(s: &str) -> Option<f64> {
    let (num, den) = match s.split_once('/') {
        Some((n, d)) => (n.trim().parse::<f64>().ok()?, d.trim().parse::<f64>().ok()?),
        None => (s.trim().parse::<f64>().ok()?, 1.0),
    };
    if den == 0.0 {
        return None;
    }
    let v = num / den;
    (v.is_finite() && v > 0.0).then_some(v)
}

/// Forward-streaming decoder over one video source.
///
/// A long-running `ffmpeg` emits raw RGBA frames at a fixed rate starting from a seek point.
/// Requests for monotonically increasing times read forward through the pipe; backward seeks or
/// jumps beyond the restart window respawn the process at the new position. Every returned frame
/// is the one whose timestamp is at or immediately before the requested time.
pub(crate) struct VideoStream {
    tools: FfmpegTools,
    info: Arc<VideoSourceInfo>,
    rate: f64,
    restart_window_sec: f64,

    child: Option<Child>,
    stdout: Option<ChildStdout>,
    stream_start_sec: f64,
    frames_read: u64,
    exhausted: bool,
    current: Option<(f64, Arc<Vec<u8>>)>,
    restarts: u64,
}

impl VideoStream {
    pub(crate) fn new(
        tools: FfmpegTools,
        info: Arc<VideoSourceInfo>,
        rate_hint: Option<f64>,
        restart_window_sec: f64,
    ) -> Self {
        let rate = rate_hint
            .filter(|r| r.is_finite() && *r > 0.0)
            .or(info.frame_rate)
            .unwrap_or(FALLBACK_FRAME_RATE);
        Self {
            tools,
            info,
            rate,
            restart_window_sec,
            child: None,
            stdout: None,
            stream_start_sec: 0.0,
            frames_read: 0,
            exhausted: false,
            current: None,
            restarts: 0,
        }
    }

    pub(crate) fn info(&self) -> &VideoSourceInfo {
        &self.info
    }

    /// Number of times the decoder process was (re)spawned.
    pub(crate) fn restarts(&self) -> u64 {
        self.restarts
    }

    fn next_frame_time(&self) -> f64 {
        self.stream_start_sec + (self.frames_read as f64) / self.rate
    }

    fn frame_len(&self) -> usize {
        (self.info.width as usize) * (self.info.height as usize) * 4
    }

    /// Float drift tolerated between a requested time and the decode grid.
    fn grid_epsilon(&self) -> f64 {
        1e-3 / self.rate
    }

    /// Return the straight-alpha RGBA8 frame at or immediately before `t`.
    pub(crate) fn frame_at(&mut self, t: f64) -> ReelpressResult<Arc<Vec<u8>>> {
        let t = t.max(0.0);
        let eps = self.grid_epsilon();
        let needs_restart = match (&self.child, &self.current) {
            (None, _) => true,
            (Some(_), Some((cur_t, _))) => {
                t + eps < *cur_t || t > self.next_frame_time() + self.restart_window_sec
            }
            (Some(_), None) => t + eps < self.stream_start_sec,
        };
        if needs_restart {
            self.restart_at(t)?;
        }

        while !self.exhausted && self.next_frame_time() <= t + eps {
            self.read_one()?;
        }

        match &self.current {
            Some((_, frame)) => Ok(frame.clone()),
            None => Err(ReelpressError::evaluation(format!(
                "ffmpeg returned no video frames for '{}' at {t:.3}s",
                self.info.source_path.display()
            ))),
        }
    }

    /// Respawn the decoder so its first frame is the grid frame at or before `t`.
    fn restart_at(&mut self, t: f64) -> ReelpressResult<()> {
        self.close();
        let start = ((t * self.rate + 1e-3).floor() / self.rate).max(0.0);
        // Accurate seek drops every frame before the seek point. Seeking a quarter frame early
        // keeps the frame on `start` and stays clear of the fps filter's rounding ties.
        let seek = (start - 0.25 / self.rate).max(0.0);
        let mut child = Command::new(&self.tools.ffmpeg)
            .args(["-v", "error", "-ss", &format!("{seek:.6}")])
            .arg("-i")
            .arg(&self.info.source_path)
            .args([
                "-an",
                "-vf",
                &format!("fps={}", self.rate),
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "pipe:1",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                ReelpressError::evaluation(format!("failed to run ffmpeg for video decode: {e}"))
            })?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReelpressError::evaluation("failed to open ffmpeg stdout"))?;

        tracing::debug!(
            source = %self.info.source_path.display(),
            start_sec = start,
            requested_sec = t,
            "video stream (re)started"
        );
        self.child = Some(child);
        self.stdout = Some(stdout);
        self.stream_start_sec = start;
        self.frames_read = 0;
        self.exhausted = false;
        self.restarts += 1;
        Ok(())
    }

    fn read_one(&mut self) -> ReelpressResult<()> {
        let len = self.frame_len();
        if len == 0 {
            return Err(ReelpressError::evaluation(
                "decoded video frame size is zero (invalid source dimensions)",
            ));
        }
        let Some(stdout) = self.stdout.as_mut() else {
            self.exhausted = true;
            return Ok(());
        };
        let mut buf = vec![0u8; len];
        match stdout.read_exact(&mut buf) {
            Ok(()) => {
                let ts = self.next_frame_time();
                self.frames_read += 1;
                self.current = Some((ts, Arc::new(buf)));
                Ok(())
            }
            // End of stream: hold the last decoded frame.
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                self.exhausted = true;
                Ok(())
            }
            Err(e) => Err(ReelpressError::evaluation(format!(
                "failed to read decoded frame from ffmpeg: {e}"
            ))),
        }
    }

    /// Terminate the decoder process, if any.
    pub(crate) fn close(&mut self) {
        drop(self.stdout.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        self.current = None;
    }
}

impl Drop for VideoStream {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/media.rs"]
mod tests;
