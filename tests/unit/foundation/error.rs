use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ReelpressError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        ReelpressError::evaluation("x")
            .to_string()
            .contains("evaluation error:")
    );
    assert!(
        ReelpressError::asset_decode("clip-1", "missing file")
            .to_string()
            .contains("element 'clip-1'")
    );
}

#[test]
fn encode_process_reports_status_and_diagnostics() {
    let err = ReelpressError::encode_process(Some(1), "Unknown encoder 'libfoo'");
    let msg = err.to_string();
    assert!(msg.contains("exit code 1"));
    assert!(msg.contains("Unknown encoder"));

    let killed = ReelpressError::encode_process(None, "");
    assert!(killed.to_string().contains("terminated by signal"));
}

#[test]
fn no_usable_engine_joins_attempts() {
    let err = ReelpressError::NoUsableEngine {
        attempts: vec!["native: no ffmpeg".to_string(), "platform: no codec".to_string()],
    };
    assert_eq!(
        err.to_string(),
        "no usable export engine: native: no ffmpeg; platform: no codec"
    );
}

#[test]
fn classification_helpers() {
    assert!(ReelpressError::Cancelled.is_cancelled());
    assert!(!ReelpressError::Cancelled.is_fatal());
    assert!(!ReelpressError::engine_init("native", "x").is_fatal());
    assert!(!ReelpressError::asset_decode("e", "x").is_fatal());
    assert!(ReelpressError::ExportInProgress.is_fatal());
    assert!(ReelpressError::encode_process(Some(2), "x").is_fatal());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ReelpressError::Other(anyhow::Error::new(base));
    assert_eq!(err.to_string(), "boom");
}
