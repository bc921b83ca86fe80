use std::io::Cursor;

use super::*;

fn write_png(dir: &std::path::Path, name: &str) {
    let img = image::RgbaImage::from_raw(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 255]).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    std::fs::write(dir.join(name), buf).unwrap();
}

fn decoder(root: &std::path::Path) -> SourceDecoder {
    SourceDecoder::new(MediaResolver::new(root), FfmpegTools::default(), 2.0)
}

#[test]
fn still_image_opens_reads_and_closes() {
    let dir = tempfile::tempdir().unwrap();
    write_png(dir.path(), "a.png");
    let mut dec = decoder(dir.path());
    let item = crate::timeline::dsl::image_item("a.png");
    let h = dec.open(&MediaRef::new("a"), &item).unwrap();
    assert_eq!(dec.open_count(), 1);

    let r0 = dec.seek_and_read(h, 0.0).unwrap();
    let r1 = dec.seek_and_read(h, 3.5).unwrap();
    assert_eq!((r0.width, r0.height), (2, 1));
    assert_eq!(r0, r1);
    assert_eq!(&r0.rgba8_premul[..4], &[255, 0, 0, 255]);

    dec.close(h);
    assert_eq!(dec.open_count(), 0);
    assert!(dec.seek_and_read(h, 0.0).is_err());
}

#[test]
fn svg_uses_size_override() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("s.svg"),
        br##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><rect width="10" height="10" fill="#00ff00"/></svg>"##,
    )
    .unwrap();
    let mut dec = decoder(dir.path());
    let mut item = crate::timeline::dsl::svg_item("s.svg");
    item.width = 20;
    item.height = 20;
    let h = dec.open(&MediaRef::new("s"), &item).unwrap();
    let r = dec.seek_and_read(h, 0.0).unwrap();
    assert_eq!((r.width, r.height), (20, 20));
}

#[test]
fn missing_source_fails_open_with_context() {
    let dir = tempfile::tempdir().unwrap();
    let mut dec = decoder(dir.path());
    let item = crate::timeline::dsl::image_item("nope.png");
    let err = dec.open(&MediaRef::new("n"), &item).unwrap_err();
    assert!(err.to_string().contains("open media 'n'"));
}

#[test]
fn fonts_are_not_rasters() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("f.ttf"), b"fontbytes").unwrap();
    let mut dec = decoder(dir.path());
    let item = crate::timeline::dsl::font_item("f.ttf");
    assert!(dec.open(&MediaRef::new("f"), &item).is_err());
    assert_eq!(
        dec.read_font(&MediaRef::new("f"), &item).unwrap().as_slice(),
        b"fontbytes"
    );
}
