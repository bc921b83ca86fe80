use std::path::PathBuf;

use super::*;
use crate::config::{ExportConfig, FfmpegTools};
use crate::foundation::core::Fps;

fn settings(container: Container) -> ExportSettings {
    let mut s = ExportSettings::new(
        64,
        36,
        Fps::new(10, 1).unwrap(),
        1.0,
        PathBuf::from("out.mp4"),
    );
    s.container = container;
    s
}

fn context(encoders: &[&str]) -> EngineContext {
    EngineContext::new(ExportConfig {
        hardware_encoders: encoders.iter().map(|e| e.to_string()).collect(),
        ..ExportConfig::default()
    })
}

#[test]
fn probe_rejects_webm_and_empty_candidates() {
    let err = PlatformCodecEngine::probe(&context(&["h264_nvenc"]), &settings(Container::Webm))
        .unwrap_err();
    assert!(err.to_string().contains("WebM"), "{err}");

    let err = PlatformCodecEngine::probe(&context(&[]), &settings(Container::Mp4)).unwrap_err();
    assert!(err.to_string().contains("no hardware encoders"), "{err}");
}

#[test]
fn unlisted_encoders_are_rejected_with_reasons() {
    if !FfmpegTools::default().has_ffmpeg() {
        eprintln!("skipping: ffmpeg not available");
        return;
    }
    let ctx = context(&["h264_reelpress_missing", "hevc_reelpress_missing"]);
    let err = PlatformCodecEngine::new(ctx, &settings(Container::Mp4)).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("h264_reelpress_missing: not built into ffmpeg"), "{msg}");
    assert!(msg.contains("hevc_reelpress_missing: not built into ffmpeg"), "{msg}");
}

#[test]
fn first_candidate_passing_the_trial_encode_is_kept() {
    let tools = FfmpegTools::default();
    if !tools.has_ffmpeg() || !list_encoders(&tools).unwrap().iter().any(|e| e == "libx264") {
        eprintln!("skipping: ffmpeg with libx264 not available");
        return;
    }
    // A software encoder stands in for hardware so the trial path runs on any machine.
    let ctx = context(&["h264_reelpress_missing", "libx264"]);
    let engine = PlatformCodecEngine::new(ctx, &settings(Container::Mp4)).unwrap();
    assert_eq!(engine.codec(), "libx264");
    assert_eq!(engine.kind(), EngineKind::PlatformCodec);
}
