use super::*;
use crate::foundation::core::Fps;

fn strings(args: &[OsString]) -> Vec<String> {
    args.iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

fn settings(container: Container, quality: QualityPreset) -> ExportSettings {
    let mut s = ExportSettings::new(
        1280,
        720,
        Fps::new(30, 1).unwrap(),
        2.0,
        PathBuf::from("/out/movie.mp4"),
    );
    s.container = container;
    s.quality = quality;
    s
}

#[test]
fn image_sequence_args_follow_fixed_layout() {
    let target = EncodeTarget::software(&settings(Container::Mp4, QualityPreset::Normal));
    let args = strings(&image_sequence_args(
        &target,
        Path::new("/tmp/session"),
        1280,
        720,
        Fps::new(30, 1).unwrap(),
    ));
    let pattern = Path::new("/tmp/session")
        .join(FRAME_PATTERN)
        .to_string_lossy()
        .into_owned();
    let expected: Vec<String> = [
        "-y",
        "-framerate",
        "30",
        "-i",
        pattern.as_str(),
        "-c:v",
        "libx264",
        "-preset",
        "medium",
        "-crf",
        "23",
        "-vf",
        "scale=1280:720",
        "-pix_fmt",
        "yuv420p",
        "-movflags",
        "+faststart",
        "-progress",
        "pipe:1",
        "-nostats",
        "/out/movie.mp4",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    assert_eq!(args, expected);
}

#[test]
fn webm_uses_vp9_without_faststart() {
    let target = EncodeTarget::software(&settings(Container::Webm, QualityPreset::High));
    let args = strings(&image_sequence_args(
        &target,
        Path::new("frames"),
        640,
        360,
        Fps::new(24, 1).unwrap(),
    ));
    assert!(args.windows(2).any(|w| w == ["-c:v", "libvpx-vp9"]));
    assert!(args.windows(2).any(|w| w == ["-crf", "24"]));
    assert!(args.windows(2).any(|w| w == ["-b:v", "0"]));
    assert!(!args.iter().any(|a| a == "-movflags"));
}

#[test]
fn fractional_rates_are_passed_as_rationals() {
    let target = EncodeTarget::software(&settings(Container::Mov, QualityPreset::Draft));
    let args = strings(&raw_stream_args(
        &target,
        64,
        32,
        Fps::new(30000, 1001).unwrap(),
    ));
    assert!(args.windows(2).any(|w| w == ["-r", "30000/1001"]));
    assert!(args.windows(2).any(|w| w == ["-s", "64x32"]));
    assert!(args.windows(2).any(|w| w == ["-i", "pipe:0"]));
    assert_eq!(args.last().map(String::as_str), Some("/out/movie.mp4"));
}

#[test]
fn hardware_quality_flags_per_family() {
    assert_eq!(
        quality_args("h264_nvenc", QualityPreset::High),
        ["-preset", "p6", "-rc", "vbr", "-cq", "18"]
    );
    assert_eq!(
        quality_args("h264_videotoolbox", QualityPreset::Normal),
        ["-q:v", "60"]
    );
    assert_eq!(
        quality_args("h264_qsv", QualityPreset::Lossless),
        ["-global_quality", "1"]
    );
    assert_eq!(
        quality_args("h264_amf", QualityPreset::Draft),
        ["-rc", "cqp", "-qp_i", "28", "-qp_p", "28"]
    );
    assert_eq!(
        quality_args("libvpx-vp9", QualityPreset::Lossless),
        ["-lossless", "1"]
    );
}

#[test]
fn trial_encode_targets_null_muxer() {
    let args = strings(&trial_encode_args(
        "h264_nvenc",
        QualityPreset::Normal,
        1920,
        1080,
    ));
    assert!(args.windows(2).any(|w| w == ["-c:v", "h264_nvenc"]));
    assert!(args.windows(2).any(|w| w == ["-frames:v", "1"]));
    assert!(args.iter().any(|a| a == "color=c=black:s=1920x1080:d=0.1"));
    assert_eq!(&args[args.len() - 3..], ["-f", "null", "-"]);
}
