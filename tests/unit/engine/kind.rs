use super::*;

#[test]
fn labels_round_trip_through_parse() {
    for kind in EngineKind::DEFAULT_ORDER {
        assert_eq!(EngineKind::parse(kind.label()).unwrap(), kind);
        assert_eq!(kind.to_string(), kind.label());
    }
    assert_eq!(
        EngineKind::parse(" Optimized ").unwrap(),
        EngineKind::ContinuousCaptureOptimized
    );
    assert!(matches!(
        EngineKind::parse("gpu"),
        Err(ReelpressError::Validation(_))
    ));
}

#[test]
fn default_order_prefers_native_then_platform() {
    assert_eq!(
        EngineKind::DEFAULT_ORDER,
        [
            EngineKind::NativeProcess,
            EngineKind::PlatformCodec,
            EngineKind::ContinuousCaptureOptimized,
            EngineKind::ContinuousCapture,
        ]
    );
}

#[test]
fn serde_uses_short_labels() {
    let json = serde_json::to_string(&EngineKind::PlatformCodec).unwrap();
    assert_eq!(json, "\"platform\"");
    let kind: EngineKind = serde_json::from_str("\"continuous\"").unwrap();
    assert_eq!(kind, EngineKind::ContinuousCapture);
}

#[test]
fn context_builds_a_decoder_per_call() {
    let ctx = EngineContext::new(ExportConfig::default()).with_decoders(Arc::new(|| {
        Box::new(crate::test_support::FakeDecoder::new()) as Box<dyn MediaDecoder>
    }));
    let _a = ctx.decoder();
    let _b = ctx.decoder();
    assert!(format!("{ctx:?}").contains("EngineContext"));
}
