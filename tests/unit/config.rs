use std::collections::HashMap;

use super::*;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |k| map.get(k).cloned()
}

#[test]
fn defaults_are_sane() {
    let cfg = ExportConfig::default();
    assert_eq!(cfg.pipeline_depth, DEFAULT_PIPELINE_DEPTH);
    assert_eq!(cfg.ffmpeg_program, PathBuf::from("ffmpeg"));
    assert!(cfg.engine_order.is_none());
    assert!(!cfg.hardware_encoders.is_empty());
}

#[test]
fn env_overrides_apply() {
    let cfg = ExportConfig::default()
        .with_overrides(env(&[
            ("REELPRESS_FFMPEG", "/opt/ff/ffmpeg"),
            ("REELPRESS_PIPELINE_DEPTH", "4"),
            ("REELPRESS_HW_ENCODERS", "h264_nvenc, ,h264_qsv"),
            ("REELPRESS_ENGINE_ORDER", "optimized,continuous"),
        ]))
        .unwrap();
    assert_eq!(cfg.ffmpeg_program, PathBuf::from("/opt/ff/ffmpeg"));
    assert_eq!(cfg.pipeline_depth, 4);
    assert_eq!(cfg.hardware_encoders, vec!["h264_nvenc", "h264_qsv"]);
    assert_eq!(
        cfg.engine_order,
        Some(vec![
            EngineKind::ContinuousCaptureOptimized,
            EngineKind::ContinuousCapture
        ])
    );
}

#[test]
fn pipeline_depth_is_clamped() {
    let cfg = ExportConfig::default()
        .with_overrides(env(&[("REELPRESS_PIPELINE_DEPTH", "0")]))
        .unwrap();
    assert_eq!(cfg.pipeline_depth, 1);

    let cfg = ExportConfig::default()
        .with_overrides(env(&[("REELPRESS_PIPELINE_DEPTH", "999")]))
        .unwrap();
    assert_eq!(cfg.pipeline_depth, MAX_PIPELINE_DEPTH);
}

#[test]
fn invalid_env_values_are_rejected() {
    assert!(
        ExportConfig::default()
            .with_overrides(env(&[("REELPRESS_PIPELINE_DEPTH", "three")]))
            .is_err()
    );
    assert!(
        ExportConfig::default()
            .with_overrides(env(&[("REELPRESS_ENGINE_ORDER", "warp-drive")]))
            .is_err()
    );
}

#[test]
fn json_config_fills_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cfg.json");
    std::fs::write(&path, r#"{"pipeline_depth": 2, "engine_order": ["native"]}"#).unwrap();
    let cfg = ExportConfig::from_path(&path).unwrap();
    assert_eq!(cfg.pipeline_depth, 2);
    assert_eq!(cfg.engine_order, Some(vec![EngineKind::NativeProcess]));
    assert_eq!(cfg.ffprobe_program, PathBuf::from("ffprobe"));
}
