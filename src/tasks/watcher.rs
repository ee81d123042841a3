//! Directory watcher: fixed-interval rescan loop that detects added or
//! removed images.
//!
//! Best-effort polling is deliberate here; the catalog and composer
//! contracts would not change if this were upgraded to OS file
//! notifications.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::task::spawn_blocking;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::error::Error;
use crate::events::{CatalogSwap, FrameEvent, WatchTarget};
use crate::surface::{DisplayState, SurfacePort};
use crate::tasks::composer::directory_status;

/// Single-writer watch state: only this loop touches it.
struct WatchState {
    directory: Option<PathBuf>,
    last_scan: Instant,
    known_count: usize,
}

/// Every `tick`, while rotation is active, rescan the watched directory
/// once at least `rescan_after` has elapsed since the previous scan. The
/// fresh catalog always replaces the composer's copy (the next pass picks
/// it up; an in-flight pass is not interrupted); the status display is
/// only notified when the count changed.
pub async fn run(
    mut targets: Receiver<WatchTarget>,
    to_composer: Sender<CatalogSwap>,
    port: SurfacePort,
    shared: Arc<DisplayState>,
    tick: Duration,
    rescan_after: Duration,
    cancel: CancellationToken,
) -> Result<()> {
    let mut state = WatchState {
        directory: None,
        last_scan: Instant::now(),
        known_count: 0,
    };

    loop {
        select! {
            _ = cancel.cancelled() => {
                info!("cancel received; exiting directory watcher");
                break;
            }

            Some(WatchTarget { directory, count }) = targets.recv() => {
                info!(directory = %directory.display(), count, "watching directory");
                state.directory = Some(directory);
                state.known_count = count;
                state.last_scan = Instant::now();
            }

            _ = sleep(tick) => {
                // Coupled lifecycle: the watcher only works while rotation runs.
                if !shared.rotation_active() {
                    continue;
                }
                let Some(dir) = state.directory.clone() else {
                    continue;
                };
                if state.last_scan.elapsed() < rescan_after {
                    continue;
                }
                state.last_scan = Instant::now();

                let scanned = spawn_blocking({
                    let dir = dir.clone();
                    move || Catalog::scan(&dir)
                })
                .await;
                let catalog = match scanned {
                    Ok(Ok(catalog)) => catalog,
                    Ok(Err(Error::DirectoryUnavailable { path, source })) => {
                        warn!(path = %path.display(), error = %source, "watched directory unavailable");
                        Catalog::default()
                    }
                    Ok(Err(err)) => {
                        warn!(error = %err, "rescan failed");
                        continue;
                    }
                    Err(err) => {
                        warn!(error = %err, "rescan task panicked");
                        continue;
                    }
                };

                let new_count = catalog.len();
                if new_count != state.known_count {
                    info!(old = state.known_count, new = new_count, "image count changed");
                    state.known_count = new_count;
                    port.post(FrameEvent::Status {
                        text: directory_status(&dir, new_count),
                        count: new_count,
                    })
                    .await;
                } else {
                    debug!(count = new_count, "rescan complete; count unchanged");
                }

                if to_composer.send(CatalogSwap(catalog)).await.is_err() {
                    debug!("composer channel closed; exiting directory watcher");
                    break;
                }
            }
        }
    }
    Ok(())
}
