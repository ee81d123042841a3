use std::path::Path;

use collage_frame::error::Error;
use collage_frame::tile::{render_tile, square_crop_bounds};
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use tempfile::tempdir;

#[test]
fn crop_bounds_follow_the_symmetric_rule() {
    // Wider than tall: columns [100, 300) of a 400x200 source survive.
    assert_eq!(square_crop_bounds(400, 200), (100, 0, 200));
    // Taller than wide: the mirror rule on rows.
    assert_eq!(square_crop_bounds(200, 400), (0, 100, 200));
    // Already square: untouched.
    assert_eq!(square_crop_bounds(300, 300), (0, 0, 300));
    // Odd differences floor toward the left/top.
    assert_eq!(square_crop_bounds(401, 200), (100, 0, 200));
}

#[test]
fn tile_is_exactly_edge_by_edge() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("wide.png");
    RgbImage::from_pixel(400, 200, Rgb([0, 200, 0]))
        .save(&path)
        .unwrap();

    let tile = render_tile(&path, 100).unwrap();
    assert_eq!(tile.edge, 100);
    assert_eq!(tile.pixels.dimensions(), (100, 100));
}

#[test]
fn center_crop_drops_the_flanks_before_resize() {
    // 400x200: left 100 columns red, middle 200 green, right 100 blue.
    // The crop keeps columns [100, 300) only, so the tile must be pure
    // green with no trace of the flanking colors.
    let mut src = RgbImage::new(400, 200);
    for (x, _, px) in src.enumerate_pixels_mut() {
        *px = if x < 100 {
            Rgb([255, 0, 0])
        } else if x < 300 {
            Rgb([0, 255, 0])
        } else {
            Rgb([0, 0, 255])
        };
    }
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("flanked.png");
    src.save(&path).unwrap();

    let tile = render_tile(&path, 100).unwrap();
    for (x, y, px) in tile.pixels.enumerate_pixels() {
        assert!(
            px.0[0] < 8 && px.0[1] > 247 && px.0[2] < 8,
            "pixel ({x},{y}) leaked flank color: {:?}",
            px.0
        );
    }
}

#[test]
fn transparency_is_flattened_to_opaque() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("translucent.png");
    RgbaImage::from_pixel(64, 64, Rgba([10, 20, 30, 40]))
        .save(&path)
        .unwrap();

    let tile = render_tile(&path, 32).unwrap();
    for px in tile.pixels.pixels() {
        assert_eq!(px.0[3], 255, "alpha must be discarded, not kept");
    }
}

#[test]
fn corrupt_source_reports_decode_error() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("broken.jpg");
    std::fs::write(&path, b"not an image at all").unwrap();

    match render_tile(&path, 64) {
        Err(Error::Decode { path: p, .. }) => assert_eq!(p, path),
        other => panic!("expected Decode error, got {other:?}"),
    }
}

#[test]
fn missing_source_reports_decode_error() {
    assert!(matches!(
        render_tile(Path::new("/definitely/not/here.png"), 64),
        Err(Error::Decode { .. })
    ));
}

#[test]
fn zero_edge_is_rejected() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("any.png");
    RgbImage::from_pixel(8, 8, Rgb([1, 2, 3])).save(&path).unwrap();
    assert!(matches!(render_tile(&path, 0), Err(Error::Resize { .. })));
}
