//! Collage composer: owns the current catalog and orchestrates one
//! rendering pass per request.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::task::{JoinSet, spawn_blocking};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::config::Configuration;
use crate::error::Error;
use crate::events::{
    CatalogSwap, CollageFrame, CollageUpdate, ComposerCommand, FrameEvent, WatchTarget,
};
use crate::layout::{self, GridPlan};
use crate::surface::{DisplayState, SurfacePort, Viewport};
use crate::tile::{self, PositionedTile, Tile};

/// Status line shown for a selected directory, mirroring the window title.
pub fn directory_status(dir: &Path, count: usize) -> String {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string());
    format!("Directory: {name} ({count} images)")
}

/// Command loop. `SetDirectory` rescans and replaces the owned catalog;
/// `Compose` runs one pass against it. Catalog swaps from the watcher
/// replace the catalog wholesale between passes.
pub async fn run(
    mut commands: Receiver<ComposerCommand>,
    mut swaps: Receiver<CatalogSwap>,
    to_watcher: Sender<WatchTarget>,
    port: SurfacePort,
    shared: Arc<DisplayState>,
    cfg: Configuration,
    cancel: CancellationToken,
) -> Result<()> {
    let mut catalog = Catalog::default();

    loop {
        select! {
            _ = cancel.cancelled() => {
                info!("cancel received; exiting composer");
                break;
            }

            Some(CatalogSwap(fresh)) = swaps.recv() => {
                debug!(count = fresh.len(), "catalog replaced by watcher rescan");
                catalog = fresh;
            }

            maybe_cmd = commands.recv() => {
                let Some(cmd) = maybe_cmd else {
                    debug!("command channel closed; exiting composer");
                    break;
                };
                match cmd {
                    ComposerCommand::SetDirectory(dir) => {
                        catalog = match spawn_blocking({
                            let dir = dir.clone();
                            move || Catalog::scan(&dir)
                        })
                        .await?
                        {
                            Ok(catalog) => catalog,
                            Err(Error::DirectoryUnavailable { path, source }) => {
                                warn!(path = %path.display(), error = %source, "directory unavailable; using empty catalog");
                                Catalog::default()
                            }
                            Err(err) => {
                                warn!(error = %err, "scan failed; using empty catalog");
                                Catalog::default()
                            }
                        };
                        info!(directory = %dir.display(), count = catalog.len(), "library selected");
                        port.post(FrameEvent::Status {
                            text: directory_status(&dir, catalog.len()),
                            count: catalog.len(),
                        })
                        .await;
                        let _ = to_watcher
                            .send(WatchTarget { directory: dir, count: catalog.len() })
                            .await;
                    }
                    ComposerCommand::Compose => {
                        if let Some(update) =
                            compose_pass(&catalog, shared.viewport(), cfg.max_tiles).await
                        {
                            port.post(FrameEvent::Collage(update)).await;
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

/// One rendering pass. Returns `None` when the pass must be skipped
/// without touching what is currently displayed (degenerate viewport or
/// zero tile edge).
pub async fn compose_pass(
    catalog: &Catalog,
    viewport: Viewport,
    max_tiles: usize,
) -> Option<CollageUpdate> {
    if catalog.is_empty() {
        return Some(CollageUpdate::Empty);
    }
    if viewport.is_degenerate() {
        debug!("viewport not usable yet; skipping pass");
        return None;
    }

    let sample = catalog.sample(max_tiles, &mut rand::rng());
    let plan = layout::plan(viewport.width, viewport.height, sample.len())?;
    if plan.edge == 0 {
        debug!(?plan, "tile edge collapsed to zero; skipping pass");
        return None;
    }

    let tiles = render_sample(&sample, &plan, viewport).await;
    debug!(
        requested = sample.len(),
        rendered = tiles.len(),
        rows = plan.rows,
        cols = plan.cols,
        edge = plan.edge,
        "pass composed"
    );
    Some(CollageUpdate::Grid(CollageFrame {
        viewport,
        plan,
        tiles,
    }))
}

/// Render every sampled reference concurrently. Placement follows the
/// sample order (row-major by index), never decode completion order; a
/// failed tile leaves its cell blank.
async fn render_sample(
    sample: &[crate::catalog::ImageRef],
    plan: &GridPlan,
    viewport: Viewport,
) -> Vec<PositionedTile> {
    let origin = layout::center_offset(
        plan.grid_width(),
        plan.grid_height(),
        viewport.width,
        viewport.height,
    );

    let mut jobs: JoinSet<(usize, Result<Tile, Error>)> = JoinSet::new();
    for (i, image_ref) in sample.iter().enumerate() {
        let path = image_ref.path.clone();
        let edge = plan.edge;
        jobs.spawn(async move {
            let job_path = path.clone();
            let result = spawn_blocking(move || tile::render_tile(&job_path, edge)).await;
            match result {
                Ok(tile) => (i, tile),
                Err(join_err) => (i, Err(render_failure(path, &join_err))),
            }
        });
    }

    let mut tiles = Vec::with_capacity(sample.len());
    while let Some(joined) = jobs.join_next().await {
        let Ok((index, rendered)) = joined else {
            continue;
        };
        match rendered {
            Ok(tile) => {
                let (x, y) = layout::tile_position(plan, origin, index);
                tiles.push(PositionedTile { tile, x, y });
            }
            Err(err) => {
                // One bad file never aborts the pass; its cell stays blank.
                warn!(error = %err, "tile skipped");
            }
        }
    }
    tiles
}

/// Error for a render job that died instead of returning. Keeps the source
/// path so the skip log names the offending file.
fn render_failure(path: std::path::PathBuf, cause: &dyn std::fmt::Display) -> Error {
    Error::Resize {
        path,
        reason: format!("render task failed: {cause}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn a_failed_render_job_names_its_source() {
        let err = render_failure(PathBuf::from("/library/a.png"), &"task panicked");
        match &err {
            Error::Resize { path, reason } => {
                assert_eq!(path, &PathBuf::from("/library/a.png"));
                assert!(reason.contains("task panicked"));
            }
            other => panic!("expected Resize, got {other:?}"),
        }
        assert!(err.to_string().contains("/library/a.png"));
    }
}
