use collage_frame::layout::{GridPlan, center_offset, plan, tile_position};

#[test]
fn zero_images_yields_no_plan() {
    assert!(plan(1200, 800, 0).is_none());
}

#[test]
fn plan_invariants_hold_over_a_sweep() {
    for &w in &[320_u32, 800, 1200, 1920] {
        for &h in &[200_u32, 600, 800, 1080] {
            for n in 1..=40_usize {
                let p = plan(w, h, n).unwrap();
                assert!(p.rows >= 1 && p.cols >= 1, "({w},{h},{n}) -> {p:?}");
                assert!(
                    (p.rows as usize) * (p.cols as usize) >= n,
                    "({w},{h},{n}) -> {p:?} has too few cells"
                );
                assert!(
                    p.cols * p.edge <= w,
                    "({w},{h},{n}) -> {p:?} overflows horizontally"
                );
                assert!(
                    p.rows * p.edge <= h,
                    "({w},{h},{n}) -> {p:?} overflows vertically"
                );
            }
        }
    }
}

#[test]
fn five_images_on_1200x800() {
    // cols = floor(sqrt(5 * 1200 / 800)) = floor(2.738) = 2
    // rows = ceil(5 / 2) = 3
    // edge = min(1200 / 2, 800 / 3) = min(600, 266) = 266
    let p = plan(1200, 800, 5).unwrap();
    assert_eq!(
        p,
        GridPlan {
            rows: 3,
            cols: 2,
            edge: 266
        }
    );
}

#[test]
fn tiny_viewport_collapses_edge_to_zero() {
    // 400 tiles on a 10x10 viewport cannot fit; the caller skips the pass.
    let p = plan(10, 10, 400).unwrap();
    assert_eq!(p.edge, 0);
}

#[test]
fn centering_uses_floor_division() {
    assert_eq!(center_offset(532, 798, 1200, 800), (334, 1));
    assert_eq!(center_offset(100, 100, 100, 100), (0, 0));
    // Never underflows when the grid somehow exceeds the viewport.
    assert_eq!(center_offset(200, 200, 100, 100), (0, 0));
}

#[test]
fn placement_is_row_major_and_gap_free() {
    let p = GridPlan {
        rows: 3,
        cols: 2,
        edge: 266,
    };
    let origin = center_offset(p.grid_width(), p.grid_height(), 1200, 800);

    assert_eq!(tile_position(&p, origin, 0), (334, 1));
    assert_eq!(tile_position(&p, origin, 1), (600, 1));
    assert_eq!(tile_position(&p, origin, 2), (334, 267));
    assert_eq!(tile_position(&p, origin, 3), (600, 267));
    assert_eq!(tile_position(&p, origin, 4), (334, 533));

    // Horizontally adjacent tiles touch with no spacing.
    let (x0, y0) = tile_position(&p, origin, 0);
    let (x1, y1) = tile_position(&p, origin, 1);
    assert_eq!(x1 - x0, p.edge);
    assert_eq!(y0, y1);
    // Vertically adjacent tiles touch as well.
    let (x2, y2) = tile_position(&p, origin, 2);
    assert_eq!(x2, x0);
    assert_eq!(y2 - y0, p.edge);
}
