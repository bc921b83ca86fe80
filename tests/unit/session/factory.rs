use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use super::*;
use crate::config::ExportConfig;
use crate::foundation::core::Fps;
use crate::test_support::fake_provider;

fn settings() -> ExportSettings {
    ExportSettings::new(16, 16, Fps::new(10, 1).unwrap(), 1.0, PathBuf::from("out.mp4"))
}

fn unreachable_tools() -> EngineContext {
    EngineContext::new(ExportConfig {
        ffmpeg_program: PathBuf::from("reelpress-missing-ffmpeg"),
        ffprobe_program: PathBuf::from("reelpress-missing-ffprobe"),
        ..ExportConfig::default()
    })
}

#[test]
fn default_chain_order() {
    assert_eq!(
        EngineFactory::default().order(),
        EngineKind::DEFAULT_ORDER.to_vec()
    );
}

#[test]
fn with_order_drops_duplicates() {
    let f = EngineFactory::with_order(&[
        EngineKind::ContinuousCapture,
        EngineKind::NativeProcess,
        EngineKind::ContinuousCapture,
    ]);
    assert_eq!(
        f.order(),
        vec![EngineKind::ContinuousCapture, EngineKind::NativeProcess]
    );
}

#[test]
fn builtin_providers_declare_scratch_needs() {
    assert!(EngineProvider::builtin(EngineKind::NativeProcess).needs_scratch_dir());
    assert!(!EngineProvider::builtin(EngineKind::PlatformCodec).needs_scratch_dir());
    assert!(!EngineProvider::builtin(EngineKind::ContinuousCapture).needs_scratch_dir());
}

#[test]
fn constructor_failure_falls_back_to_next_candidate() {
    let seen = Arc::new(Mutex::new(None));
    let factory = EngineFactory::new(vec![
        fake_provider(
            EngineKind::NativeProcess,
            true,
            Some("encoder missing"),
            None,
            seen.clone(),
        ),
        fake_provider(EngineKind::PlatformCodec, false, None, None, seen.clone()),
        fake_provider(EngineKind::ContinuousCapture, false, None, None, seen),
    ]);
    let selected = factory.select(&unreachable_tools(), &settings()).unwrap();
    assert_eq!(selected.engine.kind(), EngineKind::PlatformCodec);
    assert!(!selected.needs_scratch_dir);
    assert_eq!(selected.rejected.len(), 1);
    assert!(selected.rejected[0].starts_with("native:"));
}

#[test]
fn every_builtin_fails_without_ffmpeg() {
    let err = EngineFactory::default()
        .select(&unreachable_tools(), &settings())
        .err()
        .unwrap();
    match err {
        ReelpressError::NoUsableEngine { attempts } => {
            assert_eq!(attempts.len(), 4);
            assert!(attempts[0].starts_with("native:"));
            assert!(attempts[3].starts_with("continuous:"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn platform_probe_rejects_webm() {
    let mut s = settings();
    s.container = crate::timeline::settings::Container::Webm;
    s.output_path = PathBuf::from("out.webm");
    let err = PlatformCodecEngine::probe(&EngineContext::new(ExportConfig::default()), &s)
        .unwrap_err();
    assert!(matches!(err, ReelpressError::EngineInit { .. }));
}
