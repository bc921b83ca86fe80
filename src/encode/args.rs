use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::foundation::core::Fps;
use crate::timeline::settings::{Container, ExportSettings, QualityPreset};

/// `printf`-style pattern `ffmpeg` uses to read a frame sequence.
pub const FRAME_PATTERN: &str = "frame-%04d.png";

/// Codec, quality and destination of one encode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodeTarget {
    /// `ffmpeg` video encoder name (`libx264`, `h264_nvenc`, ...).
    pub codec: String,
    /// Quality preset mapped onto the codec's own rate-control flags.
    pub quality: QualityPreset,
    /// Output container.
    pub container: Container,
    /// Output file.
    pub out_path: PathBuf,
}

impl EncodeTarget {
    /// Target for `settings` using `codec`.
    pub fn from_settings(settings: &ExportSettings, codec: impl Into<String>) -> Self {
        Self {
            codec: codec.into(),
            quality: settings.quality,
            container: settings.container,
            out_path: settings.output_path.clone(),
        }
    }

    /// Target for `settings` using the container's software codec.
    pub fn software(settings: &ExportSettings) -> Self {
        Self::from_settings(settings, settings.container.software_codec())
    }
}

fn nvenc_preset(quality: QualityPreset) -> &'static str {
    match quality {
        QualityPreset::Draft => "p2",
        QualityPreset::Normal => "p4",
        QualityPreset::High => "p6",
        QualityPreset::Lossless => "p7",
    }
}

fn videotoolbox_quality(quality: QualityPreset) -> u8 {
    match quality {
        QualityPreset::Draft => 45,
        QualityPreset::Normal => 60,
        QualityPreset::High => 75,
        QualityPreset::Lossless => 100,
    }
}

/// Rate-control flags for `codec` at `quality`.
pub fn quality_args(codec: &str, quality: QualityPreset) -> Vec<String> {
    let crf = quality.crf();
    // Hardware encoders treat 0 as "automatic" rather than lossless.
    let hw_q = crf.max(1).to_string();
    match codec {
        "libx264" | "libx265" => vec![
            "-preset".into(),
            quality.speed_preset().into(),
            "-crf".into(),
            crf.to_string(),
        ],
        "libvpx-vp9" => {
            if quality == QualityPreset::Lossless {
                vec!["-lossless".into(), "1".into()]
            } else {
                vec![
                    "-crf".into(),
                    quality.vp9_crf().to_string(),
                    "-b:v".into(),
                    "0".into(),
                ]
            }
        }
        c if c.ends_with("_nvenc") => vec![
            "-preset".into(),
            nvenc_preset(quality).into(),
            "-rc".into(),
            "vbr".into(),
            "-cq".into(),
            hw_q,
        ],
        c if c.ends_with("_videotoolbox") => {
            vec!["-q:v".into(), videotoolbox_quality(quality).to_string()]
        }
        c if c.ends_with("_qsv") => vec!["-global_quality".into(), hw_q],
        c if c.ends_with("_amf") => vec![
            "-rc".into(),
            "cqp".into(),
            "-qp_i".into(),
            hw_q.clone(),
            "-qp_p".into(),
            hw_q,
        ],
        _ => vec!["-crf".into(), crf.to_string()],
    }
}

fn push_all(args: &mut Vec<OsString>, items: impl IntoIterator<Item = impl Into<OsString>>) {
    args.extend(items.into_iter().map(Into::into));
}

fn push_codec(args: &mut Vec<OsString>, target: &EncodeTarget) {
    push_all(args, ["-c:v", target.codec.as_str()]);
    push_all(args, quality_args(&target.codec, target.quality));
}

fn push_output_format(args: &mut Vec<OsString>, target: &EncodeTarget) {
    push_all(args, ["-pix_fmt", "yuv420p"]);
    if target.container.supports_faststart() {
        push_all(args, ["-movflags", "+faststart"]);
    }
}

/// Arguments that encode the `frame-NNNN.png` sequence in `frames_dir`.
///
/// Layout: `-y -framerate <fps> -i <dir>/frame-%04d.png -c:v <codec> <quality flags>
/// -vf scale=<w>:<h> -pix_fmt yuv420p [-movflags +faststart] -progress pipe:1 -nostats <out>`.
pub fn image_sequence_args(
    target: &EncodeTarget,
    frames_dir: &Path,
    width: u32,
    height: u32,
    fps: Fps,
) -> Vec<OsString> {
    let mut args = Vec::new();
    push_all(&mut args, ["-y", "-framerate"]);
    args.push(fps.to_ffmpeg_rate().into());
    args.push("-i".into());
    args.push(frames_dir.join(FRAME_PATTERN).into_os_string());
    push_codec(&mut args, target);
    args.push("-vf".into());
    args.push(format!("scale={width}:{height}").into());
    push_output_format(&mut args, target);
    push_all(&mut args, ["-progress", "pipe:1", "-nostats"]);
    args.push(target.out_path.clone().into_os_string());
    args
}

/// Arguments that encode raw RGBA8 frames read from stdin.
pub fn raw_stream_args(target: &EncodeTarget, width: u32, height: u32, fps: Fps) -> Vec<OsString> {
    let mut args = Vec::new();
    push_all(
        &mut args,
        ["-y", "-loglevel", "error", "-f", "rawvideo", "-pix_fmt", "rgba", "-s"],
    );
    args.push(format!("{width}x{height}").into());
    // For rawvideo input, `-r` before `-i` sets the input frame rate.
    args.push("-r".into());
    args.push(fps.to_ffmpeg_rate().into());
    push_all(&mut args, ["-i", "pipe:0", "-an"]);
    push_codec(&mut args, target);
    push_output_format(&mut args, target);
    args.push(target.out_path.clone().into_os_string());
    args
}

/// One-frame `lavfi` encode used to check that `codec` accepts the output configuration.
pub fn trial_encode_args(
    codec: &str,
    quality: QualityPreset,
    width: u32,
    height: u32,
) -> Vec<OsString> {
    let mut args = Vec::new();
    push_all(&mut args, ["-hide_banner", "-loglevel", "error", "-f", "lavfi", "-i"]);
    args.push(format!("color=c=black:s={width}x{height}:d=0.1").into());
    push_all(&mut args, ["-frames:v", "1", "-c:v", codec]);
    push_all(&mut args, quality_args(codec, quality));
    push_all(&mut args, ["-pix_fmt", "yuv420p", "-f", "null", "-"]);
    args
}

#[cfg(test)]
#[path = "../../tests/unit/encode/args.rs"]
mod tests;
