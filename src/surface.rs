//! Hand-off boundary between the background tasks and the UI-owning
//! thread.
//!
//! Only the viewer thread may touch the window or the GPU surface.
//! Background loops post [`FrameEvent`]s through a [`SurfacePort`]; a
//! forwarder bridges them into the winit event-loop proxy so they are
//! delivered on the UI thread. The viewer keeps every presented tile set
//! alive until its replacement is fully drawn, then swaps atomically.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use tokio::sync::mpsc::{Receiver, Sender};
use tracing::debug;
use winit::event_loop::EventLoopProxy;

use crate::events::FrameEvent;

/// Pixel dimensions of the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// A freshly created window can report a degenerate size; passes are
    /// skipped until it is usable.
    pub fn is_degenerate(&self) -> bool {
        self.width <= 1 || self.height <= 1
    }
}

/// Process-wide display state shared between the viewer and the loops.
///
/// The UI thread is the only writer; the loops read on their own schedule,
/// so staleness of at most one wake interval is tolerated and no stricter
/// synchronization is needed.
#[derive(Debug)]
pub struct DisplayState {
    rotation_active: AtomicBool,
    viewport_w: AtomicU32,
    viewport_h: AtomicU32,
}

impl DisplayState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            rotation_active: AtomicBool::new(false),
            viewport_w: AtomicU32::new(0),
            viewport_h: AtomicU32::new(0),
        })
    }

    pub fn rotation_active(&self) -> bool {
        self.rotation_active.load(Ordering::Relaxed)
    }

    pub fn set_rotation_active(&self, active: bool) {
        self.rotation_active.store(active, Ordering::Relaxed);
    }

    pub fn viewport(&self) -> Viewport {
        Viewport {
            width: self.viewport_w.load(Ordering::Relaxed),
            height: self.viewport_h.load(Ordering::Relaxed),
        }
    }

    pub fn set_viewport(&self, width: u32, height: u32) {
        self.viewport_w.store(width, Ordering::Relaxed);
        self.viewport_h.store(height, Ordering::Relaxed);
    }
}

/// Sending half of the surface hand-off. Cloneable; held by every
/// background task that needs to present or report status.
#[derive(Debug, Clone)]
pub struct SurfacePort {
    tx: Sender<FrameEvent>,
}

impl SurfacePort {
    pub fn new(tx: Sender<FrameEvent>) -> Self {
        Self { tx }
    }

    /// Post an event toward the UI thread. Errors mean the viewer is gone,
    /// which only happens during shutdown, so they are ignored.
    pub async fn post(&self, event: FrameEvent) {
        if self.tx.send(event).await.is_err() {
            debug!("surface port closed; dropping event");
        }
    }
}

/// Pump posted events into the winit proxy so they wake the UI thread.
/// Runs until the port side closes or the event loop has exited.
pub async fn forward_to_event_loop(mut rx: Receiver<FrameEvent>, proxy: EventLoopProxy<FrameEvent>) {
    while let Some(event) = rx.recv().await {
        if proxy.send_event(event).is_err() {
            debug!("event loop closed; stopping surface forwarder");
            break;
        }
    }
}
