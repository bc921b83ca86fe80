use super::*;
use crate::foundation::core::Canvas;

fn cfg(width: u32, height: u32) -> SinkConfig {
    SinkConfig {
        width,
        height,
        fps: Fps::new(30, 1).unwrap(),
    }
}

fn solid(width: u32, height: u32, px: [u8; 4]) -> FrameRGBA {
    let mut frame = FrameRGBA::new(Canvas { width, height });
    for chunk in frame.data.chunks_exact_mut(4) {
        chunk.copy_from_slice(&px);
    }
    frame
}

#[test]
fn in_memory_sink_records_lifecycle() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg(2, 2)).unwrap();
    sink.push_frame(FrameIndex(0), &solid(2, 2, [1, 2, 3, 255]))
        .unwrap();
    sink.push_frame(FrameIndex(1), &solid(2, 2, [4, 5, 6, 255]))
        .unwrap();
    sink.end().unwrap();

    assert_eq!(sink.config(), Some(cfg(2, 2)));
    assert_eq!(sink.frames().len(), 2);
    assert_eq!(sink.frames()[1].0, FrameIndex(1));
    assert!(sink.ended());
    assert!(!sink.aborted());
}

#[test]
fn frame_file_names_are_zero_padded() {
    assert_eq!(frame_file_name(FrameIndex(0)), "frame-0000.png");
    assert_eq!(frame_file_name(FrameIndex(42)), "frame-0042.png");
    assert_eq!(frame_file_name(FrameIndex(12345)), "frame-12345.png");
}

#[test]
fn png_sequence_sink_writes_flattened_frames() {
    let dir = tempfile::tempdir().unwrap();
    let frames_dir = dir.path().join("frames");
    let mut sink = PngSequenceSink::new(&frames_dir, [0, 0, 255, 255]);
    sink.begin(cfg(2, 2)).unwrap();
    // Fully transparent premultiplied pixels flatten to the background.
    sink.push_frame(FrameIndex(0), &solid(2, 2, [0, 0, 0, 0]))
        .unwrap();
    sink.push_frame(FrameIndex(1), &solid(2, 2, [255, 0, 0, 255]))
        .unwrap();
    sink.end().unwrap();
    assert_eq!(sink.written(), 2);

    let first = image::open(frames_dir.join("frame-0000.png"))
        .unwrap()
        .to_rgba8();
    assert_eq!(first.get_pixel(0, 0).0, [0, 0, 255, 255]);
    let second = image::open(frames_dir.join("frame-0001.png"))
        .unwrap()
        .to_rgba8();
    assert_eq!(second.get_pixel(1, 1).0, [255, 0, 0, 255]);
}

#[test]
fn png_sequence_sink_rejects_size_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = PngSequenceSink::new(dir.path(), [0, 0, 0, 255]);
    sink.begin(cfg(2, 2)).unwrap();
    let err = sink
        .push_frame(FrameIndex(0), &solid(4, 4, [0, 0, 0, 255]))
        .unwrap_err();
    assert!(matches!(err, ReelpressError::Validation(_)));
}

#[test]
fn png_sequence_sink_requires_begin() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = PngSequenceSink::new(dir.path(), [0, 0, 0, 255]);
    assert!(
        sink.push_frame(FrameIndex(0), &solid(2, 2, [0, 0, 0, 255]))
            .is_err()
    );
}
