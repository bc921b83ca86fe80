use super::*;
use crate::test_support::FakeDecoder;
use crate::timeline::dsl::{TimelineBuilder, image_clip, image_item, video_clip, video_item};
use crate::timeline::model::FitMode;

fn timeline() -> Timeline {
    TimelineBuilder::new()
        .media("v0", video_item("clip.mp4", 4, 4, 10.0))
        .unwrap()
        .media("img", image_item("logo.png"))
        .unwrap()
        .media("unused", image_item("unused.png"))
        .unwrap()
        .track("main", vec![video_clip("a", "v0", 0.0, 5.0)])
        .track("top", vec![image_clip("b", "img", 0.0, 5.0, FitMode::Contain)])
        .build()
        .unwrap()
}

#[test]
fn ephemeral_opens_and_closes_every_request() {
    let tl = timeline();
    let fake = FakeDecoder::new();
    let log = fake.log();
    let mut adapter = DecodeAdapter::new(Box::new(fake), DecodePolicy::Ephemeral);
    adapter.prepare(&tl).unwrap();
    assert!(log.lock().unwrap().opens.is_empty());

    let v0 = MediaRef::new("v0");
    let item = tl.media_item(&v0).unwrap().clone();
    for i in 0..5 {
        adapter.raster_at(&v0, &item, f64::from(i) * 0.2).unwrap();
    }
    let log = log.lock().unwrap();
    assert_eq!(log.opens.len(), 5);
    assert_eq!(log.closes, 5);
    let expected: Vec<f64> = (0..5).map(|i| f64::from(i) * 0.2).collect();
    assert_eq!(log.reads_of("v0"), expected);
}

#[test]
fn preloaded_opens_referenced_media_once() {
    let tl = timeline();
    let fake = FakeDecoder::new();
    let log = fake.log();
    let mut adapter = DecodeAdapter::new(Box::new(fake), DecodePolicy::Preloaded);
    adapter.prepare(&tl).unwrap();
    assert_eq!(log.lock().unwrap().opens, vec!["img", "v0"]);

    let v0 = MediaRef::new("v0");
    let item = tl.media_item(&v0).unwrap().clone();
    for i in 0..10 {
        adapter.raster_at(&v0, &item, f64::from(i)).unwrap();
    }
    assert_eq!(log.lock().unwrap().opens.len(), 2);
    assert_eq!(log.lock().unwrap().closes, 0);

    drop(adapter);
    assert_eq!(log.lock().unwrap().closes, 2);
}

#[test]
fn preloaded_open_failure_surfaces_per_request() {
    let tl = timeline();
    let fake = FakeDecoder::new().failing("v0");
    let mut adapter = DecodeAdapter::new(Box::new(fake), DecodePolicy::Preloaded);
    adapter.prepare(&tl).unwrap();

    let v0 = MediaRef::new("v0");
    let item = tl.media_item(&v0).unwrap().clone();
    let err = adapter.raster_at(&v0, &item, 0.0).unwrap_err();
    assert!(err.to_string().contains("cannot open 'v0'"));

    let img = MediaRef::new("img");
    let item = tl.media_item(&img).unwrap().clone();
    assert!(adapter.raster_at(&img, &item, 0.0).is_ok());
}

#[test]
fn release_is_idempotent() {
    let tl = timeline();
    let fake = FakeDecoder::new();
    let log = fake.log();
    let mut adapter = DecodeAdapter::new(Box::new(fake), DecodePolicy::Preloaded);
    adapter.prepare(&tl).unwrap();
    adapter.release();
    adapter.release();
    drop(adapter);
    assert_eq!(log.lock().unwrap().closes, 2);
}
