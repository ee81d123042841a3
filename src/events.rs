//! Message types exchanged between the tasks and the UI thread.

use std::path::PathBuf;

use crate::catalog::Catalog;
use crate::layout::GridPlan;
use crate::surface::Viewport;
use crate::tile::PositionedTile;

/// Requests handled by the composer task. Sent by the viewer (toggle,
/// debounced resize, directory selection) and the rotation scheduler.
#[derive(Debug)]
pub enum ComposerCommand {
    /// Switch to a new library directory: scan it, replace the catalog,
    /// report the new count.
    SetDirectory(PathBuf),
    /// Run one collage pass against the current catalog.
    Compose,
}

/// Wholesale catalog replacement from the directory watcher. A pass
/// already in flight keeps its slightly stale catalog; the next pass uses
/// this one.
#[derive(Debug)]
pub struct CatalogSwap(pub Catalog);

/// Tells the watcher which directory to poll and the count the status
/// display currently shows.
#[derive(Debug, Clone)]
pub struct WatchTarget {
    pub directory: PathBuf,
    pub count: usize,
}

/// One finished rendering pass, handed to the viewer as a unit.
#[derive(Debug)]
pub struct CollageFrame {
    pub viewport: Viewport,
    pub plan: GridPlan,
    pub tiles: Vec<PositionedTile>,
}

/// Replacement for whatever the viewer currently displays.
#[derive(Debug)]
pub enum CollageUpdate {
    /// Swap in a freshly composed grid.
    Grid(CollageFrame),
    /// Nothing to show: clear the grid and render the placeholder text.
    Empty,
}

/// User events delivered to the winit loop via the surface port.
#[derive(Debug)]
pub enum FrameEvent {
    Collage(CollageUpdate),
    /// Status line plus the catalog count backing it; the viewer keeps the
    /// count to refuse starting rotation on an empty catalog.
    Status { text: String, count: usize },
    Cancelled,
}
