//! Rotation scheduler: a sleep/wake loop that paces collage passes while
//! rotation is active.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::Sender;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::events::ComposerCommand;
use crate::surface::DisplayState;

/// Sleep `interval`, then request a pass if rotation is active; repeat.
///
/// The immediate pass on start is triggered by the UI thread when it flips
/// the flag, so this loop only covers the periodic part. Stopping flips
/// the shared flag, which the loop observes at its next wake; stop latency
/// is therefore bounded by one interval.
pub async fn run(
    shared: Arc<DisplayState>,
    to_composer: Sender<ComposerCommand>,
    interval: Duration,
    cancel: CancellationToken,
) -> Result<()> {
    info!(interval = ?interval, "rotation scheduler started");
    loop {
        select! {
            _ = cancel.cancelled() => {
                info!("cancel received; exiting rotation scheduler");
                break;
            }
            _ = sleep(interval) => {
                if !shared.rotation_active() {
                    continue;
                }
                debug!("rotation wake; requesting pass");
                if to_composer.send(ComposerCommand::Compose).await.is_err() {
                    debug!("composer channel closed; exiting rotation scheduler");
                    break;
                }
            }
        }
    }
    Ok(())
}
