use super::*;

#[test]
fn progress_blocks_update_frame_and_time() {
    let mut p = EncodeProgress::default();
    assert!(!p.feed_line("frame=12"));
    assert!(!p.feed_line("fps=0.00"));
    assert!(!p.feed_line("out_time=00:00:00.480000"));
    assert!(p.feed_line("progress=continue"));
    assert_eq!(p.frame, Some(12));
    assert!((p.out_time_secs.unwrap() - 0.48).abs() < 1e-9);
    assert!(!p.complete);

    assert!(p.feed_line("progress=end"));
    assert!(p.complete);
    assert_eq!(p.fraction(100, 4.0), 1.0);
}

#[test]
fn out_time_ms_is_microseconds() {
    let mut p = EncodeProgress::default();
    p.feed_line("out_time_ms=1500000");
    assert_eq!(p.out_time_secs, Some(1.5));
    p.feed_line("out_time_us=2500000");
    assert_eq!(p.out_time_secs, Some(2.5));
}

#[test]
fn stderr_status_lines_are_understood() {
    let mut p = EncodeProgress::default();
    p.feed_line(
        "frame=   48 fps= 24 q=-1.0 Lsize=     256kB time=00:00:01.92 bitrate=1092.3kbits/s speed=0.9x",
    );
    assert_eq!(p.frame, Some(48));
    assert!((p.out_time_secs.unwrap() - 1.92).abs() < 1e-9);
}

#[test]
fn unavailable_or_negative_times_are_ignored() {
    let mut p = EncodeProgress::default();
    p.feed_line("out_time=N/A");
    p.feed_line("out_time=-577014:32:22.775808");
    p.feed_line("out_time_us=-9223372036854775807");
    assert_eq!(p.out_time_secs, None);
}

#[test]
fn fraction_prefers_frames_then_time_and_clamps() {
    let mut p = EncodeProgress::default();
    assert_eq!(p.fraction(10, 1.0), 0.0);
    p.out_time_secs = Some(0.5);
    assert_eq!(p.fraction(10, 2.0), 0.25);
    p.frame = Some(5);
    assert_eq!(p.fraction(10, 2.0), 0.5);
    p.frame = Some(50);
    assert_eq!(p.fraction(10, 2.0), 1.0);
    p.frame = None;
    assert_eq!(p.fraction(0, 0.0), 0.0);
}

#[test]
fn parse_timestamp_accepts_hours_minutes_seconds() {
    assert_eq!(parse_timestamp("01:02:03.5"), Some(3723.5));
    assert_eq!(parse_timestamp("00:00:00"), Some(0.0));
    assert_eq!(parse_timestamp("12.5"), None);
    assert_eq!(parse_timestamp("1:2:3:4"), None);
}
