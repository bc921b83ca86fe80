use super::*;

fn settings() -> ExportSettings {
    ExportSettings::new(64, 48, Fps::new(5, 1).unwrap(), 5.0, "out/video.mp4")
}

#[test]
fn frame_count_and_times() {
    let s = settings();
    assert_eq!(s.frame_count(), 25);
    assert_eq!(s.frame_time_secs(FrameIndex(10)), 2.0);
    assert_eq!(s.encoded_duration_secs(), 5.0);
}

#[test]
fn validate_rejects_odd_or_zero_size() {
    let mut s = settings();
    s.validate().unwrap();
    s.width = 63;
    assert!(s.validate().is_err());
    s.width = 0;
    assert!(s.validate().is_err());
}

#[test]
fn validate_rejects_sub_frame_duration() {
    let mut s = settings();
    s.total_duration_sec = 0.01;
    assert!(s.validate().is_err());
    s.total_duration_sec = f64::NAN;
    assert!(s.validate().is_err());
}

#[test]
fn quality_presets_map_to_crf_and_speed() {
    assert_eq!(QualityPreset::Draft.crf(), 28);
    assert_eq!(QualityPreset::Normal.speed_preset(), "medium");
    assert_eq!(QualityPreset::High.crf(), 18);
    assert_eq!(QualityPreset::parse("LOW").unwrap(), QualityPreset::Draft);
    assert!(QualityPreset::parse("ultra").is_err());
}

#[test]
fn container_codecs() {
    assert_eq!(Container::Mp4.software_codec(), "libx264");
    assert_eq!(Container::Webm.software_codec(), "libvpx-vp9");
    assert!(!Container::Webm.supports_faststart());
    assert_eq!(Container::parse("mov").unwrap().extension(), "mov");
}

#[test]
fn settings_deserialize_with_defaults() {
    let s: ExportSettings = serde_json::from_str(
        r#"{"width":64,"height":64,"fps":{"num":30,"den":1},"total_duration_sec":1.0,"output_path":"a.mp4"}"#,
    )
    .unwrap();
    assert_eq!(s.quality, QualityPreset::Normal);
    assert_eq!(s.container, Container::Mp4);
    assert_eq!(s.background_rgba, [0, 0, 0, 255]);
}
