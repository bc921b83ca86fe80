use super::*;

#[test]
fn frame_count_rounds_duration_times_fps() {
    let fps = Fps::new(5, 1).unwrap();
    assert_eq!(fps.frame_count_for(5.0), 25);
    assert_eq!(fps.frame_count_for(0.0), 0);
    assert_eq!(fps.frame_count_for(-1.0), 0);

    let ntsc = Fps::new(30000, 1001).unwrap();
    assert_eq!(ntsc.frame_count_for(10.0), 300);
}

#[test]
fn frame_time_is_exact_for_integer_rates() {
    let fps = Fps::new(5, 1).unwrap();
    for i in 0..25u64 {
        assert_eq!(fps.frame_time_secs(FrameIndex(i)), (i as f64) / 5.0);
    }
}

#[test]
fn fps_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
}

#[test]
fn fps_parses_integer_and_rational() {
    assert_eq!("30".parse::<Fps>().unwrap(), Fps { num: 30, den: 1 });
    assert_eq!(
        "30000/1001".parse::<Fps>().unwrap(),
        Fps {
            num: 30000,
            den: 1001
        }
    );
    assert!("abc".parse::<Fps>().is_err());
    assert!("30/0".parse::<Fps>().is_err());
}

#[test]
fn ffmpeg_rate_formatting() {
    assert_eq!(Fps::new(24, 1).unwrap().to_ffmpeg_rate(), "24");
    assert_eq!(Fps::new(30000, 1001).unwrap().to_ffmpeg_rate(), "30000/1001");
}

#[test]
fn canvas_rgba8_len() {
    let c = Canvas {
        width: 4,
        height: 2,
    };
    assert_eq!(c.rgba8_len(), 32);
}
