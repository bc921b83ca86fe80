use super::*;
use std::sync::Arc;

fn recording() -> (ProgressReporter, Arc<Mutex<Vec<(f32, String)>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink_seen = seen.clone();
    let reporter = ProgressReporter::new(move |pct: f32, stage: &str| {
        sink_seen.lock().unwrap().push((pct, stage.to_string()));
    });
    (reporter, seen)
}

#[test]
fn reports_are_clamped_and_monotonic() {
    let (reporter, seen) = recording();
    reporter.report(10.0, "a");
    reporter.report(5.0, "b");
    reporter.report(150.0, "c");
    reporter.report(f32::NAN, "d");

    let seen = seen.lock().unwrap();
    let pcts: Vec<f32> = seen.iter().map(|(p, _)| *p).collect();
    assert_eq!(pcts, vec![10.0, 10.0, 100.0, 100.0]);
    assert_eq!(seen[1].1, "b");
    assert_eq!(reporter.last(), 100.0);
}

#[test]
fn spans_map_fractions_into_range() {
    let (reporter, seen) = recording();
    reporter.report_span(50.0, 100.0, 0.0, "encode");
    reporter.report_span(50.0, 100.0, 0.5, "encode");
    reporter.report_span(50.0, 100.0, 2.0, "encode");
    let pcts: Vec<f32> = seen.lock().unwrap().iter().map(|(p, _)| *p).collect();
    assert_eq!(pcts, vec![50.0, 75.0, 100.0]);
}

#[test]
fn concurrent_reporters_stay_ordered() {
    let (reporter, seen) = recording();
    std::thread::scope(|s| {
        for t in 0..4 {
            let reporter = &reporter;
            s.spawn(move || {
                for i in 0..50 {
                    reporter.report((i * 2 + t) as f32, "frames");
                }
            });
        }
    });
    let pcts: Vec<f32> = seen.lock().unwrap().iter().map(|(p, _)| *p).collect();
    assert_eq!(pcts.len(), 200);
    assert!(pcts.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn silent_reporter_still_tracks_last_value() {
    let reporter = ProgressReporter::silent();
    reporter.report(42.0, "x");
    assert_eq!(reporter.last(), 42.0);
}
