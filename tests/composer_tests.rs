use std::collections::HashSet;
use std::path::Path;

use collage_frame::catalog::Catalog;
use collage_frame::events::CollageUpdate;
use collage_frame::surface::Viewport;
use collage_frame::tasks::composer::compose_pass;
use tempfile::tempdir;

fn write_png(path: &Path, w: u32, h: u32, color: [u8; 3]) {
    image::RgbImage::from_pixel(w, h, image::Rgb(color))
        .save(path)
        .unwrap();
}

fn viewport(width: u32, height: u32) -> Viewport {
    Viewport { width, height }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn empty_catalog_yields_placeholder_update() {
    let update = compose_pass(&Catalog::default(), viewport(1200, 800), 12).await;
    assert!(matches!(update, Some(CollageUpdate::Empty)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn degenerate_viewport_skips_the_pass() {
    let tmp = tempdir().unwrap();
    write_png(&tmp.path().join("a.png"), 8, 8, [9, 9, 9]);
    let catalog = Catalog::scan(tmp.path()).unwrap();

    assert!(compose_pass(&catalog, viewport(1, 1), 12).await.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn five_images_fill_a_centered_gapless_grid() {
    let tmp = tempdir().unwrap();
    for i in 0..5 {
        write_png(
            &tmp.path().join(format!("img{i}.png")),
            300,
            180,
            [40 * i, 10, 10],
        );
    }
    let catalog = Catalog::scan(tmp.path()).unwrap();

    let update = compose_pass(&catalog, viewport(1200, 800), 12).await;
    let Some(CollageUpdate::Grid(frame)) = update else {
        panic!("expected a grid update, got {update:?}");
    };

    // n = min(12, 5) = 5 -> 2 cols x 3 rows of 266px tiles, centered.
    assert_eq!(frame.plan.cols, 2);
    assert_eq!(frame.plan.rows, 3);
    assert_eq!(frame.plan.edge, 266);
    assert_eq!(frame.tiles.len(), 5);

    let sources: HashSet<_> = frame.tiles.iter().map(|t| t.tile.source.clone()).collect();
    assert_eq!(sources.len(), 5, "no reference may repeat within a pass");

    let expected: HashSet<(u32, u32)> =
        HashSet::from([(334, 1), (600, 1), (334, 267), (600, 267), (334, 533)]);
    let actual: HashSet<(u32, u32)> = frame.tiles.iter().map(|t| (t.x, t.y)).collect();
    assert_eq!(actual, expected, "tiles must fill the grid row-major, centered");

    for placed in &frame.tiles {
        assert_eq!(placed.tile.pixels.dimensions(), (266, 266));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sample_size_is_bounded_by_max_tiles() {
    let tmp = tempdir().unwrap();
    for i in 0..5 {
        write_png(&tmp.path().join(format!("img{i}.png")), 16, 16, [i, i, i]);
    }
    let catalog = Catalog::scan(tmp.path()).unwrap();

    let update = compose_pass(&catalog, viewport(900, 900), 3).await;
    let Some(CollageUpdate::Grid(frame)) = update else {
        panic!("expected a grid update, got {update:?}");
    };
    assert_eq!(frame.tiles.len(), 3);
    let sources: HashSet<_> = frame.tiles.iter().map(|t| t.tile.source.clone()).collect();
    assert_eq!(sources.len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn a_bad_file_only_blanks_its_own_cell() {
    let tmp = tempdir().unwrap();
    for i in 0..3 {
        write_png(&tmp.path().join(format!("img{i}.png")), 16, 16, [i, i, i]);
    }
    let catalog = Catalog::scan(tmp.path()).unwrap();
    assert_eq!(catalog.len(), 3);

    // Corrupt one file after the scan validated it; the stale catalog
    // exercises the load-time failure path, and the pass must still
    // produce the surviving tiles.
    let victim = catalog.entries()[0].path.clone();
    std::fs::write(&victim, b"rotted after scan").unwrap();

    let update = compose_pass(&catalog, viewport(600, 600), 12).await;
    let Some(CollageUpdate::Grid(frame)) = update else {
        panic!("expected a grid update, got {update:?}");
    };
    assert_eq!(frame.tiles.len(), 2, "the corrupted tile is skipped");
    assert!(frame.tiles.iter().all(|t| t.tile.source != victim));
}
