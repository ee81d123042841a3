//! Gap-free square-tile grid planning.

/// Geometry of one collage pass. Derived purely from the viewport size and
/// the image count; recomputed every pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPlan {
    pub rows: u32,
    pub cols: u32,
    /// Tile edge length in pixels. May be zero for degenerate viewports;
    /// callers skip the pass in that case.
    pub edge: u32,
}

impl GridPlan {
    pub fn grid_width(&self) -> u32 {
        self.cols * self.edge
    }

    pub fn grid_height(&self) -> u32 {
        self.rows * self.edge
    }
}

/// Heuristic aspect-ratio-aware square packing.
///
/// Biases the grid shape toward the viewport's aspect ratio so tiles are
/// as large as possible while staying square and gapless. Intentionally
/// not optimal: it may leave `rows * cols > count` cells unused or
/// underfill the viewport. Returns `None` when there is nothing to lay
/// out.
pub fn plan(viewport_w: u32, viewport_h: u32, count: usize) -> Option<GridPlan> {
    if count == 0 {
        return None;
    }
    let aspect = f64::from(viewport_w.max(1)) / f64::from(viewport_h.max(1));
    let cols = ((count as f64 * aspect).sqrt().floor() as u32).max(1);
    let rows = (count as u32).div_ceil(cols).max(1);
    let edge = (viewport_w / cols).min(viewport_h / rows);
    Some(GridPlan { rows, cols, edge })
}

/// Offset that centers an `inner_w x inner_h` block inside the outer
/// rectangle (floor division).
pub fn center_offset(inner_w: u32, inner_h: u32, outer_w: u32, outer_h: u32) -> (u32, u32) {
    let ox = outer_w.saturating_sub(inner_w) / 2;
    let oy = outer_h.saturating_sub(inner_h) / 2;
    (ox, oy)
}

/// Top-left position of the tile at `index`, filling the grid row-major.
pub fn tile_position(plan: &GridPlan, origin: (u32, u32), index: usize) -> (u32, u32) {
    let col = (index as u32) % plan.cols;
    let row = (index as u32) / plan.cols;
    (origin.0 + col * plan.edge, origin.1 + row * plan.edge)
}
