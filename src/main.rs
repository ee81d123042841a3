//! Binary entrypoint for the collage frame.
//!
//! Delegates all logic to the library crate; no local modules here.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};
use winit::event_loop::EventLoop;

use collage_frame::config::Configuration;
use collage_frame::events::{CatalogSwap, ComposerCommand, FrameEvent, WatchTarget};
use collage_frame::surface::{self, DisplayState, SurfacePort};
use collage_frame::tasks;

/// Simple CLI
#[derive(Debug, Parser)]
#[command(name = "collage-frame", about = "Dynamic image collage viewer")]
struct Cli {
    /// Path to YAML config file; defaults are used when omitted
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the image directory to display at startup
    #[arg(long, value_name = "DIR")]
    library: Option<PathBuf>,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    // map -v to log level
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("collage_frame={level}").parse()?)
        .add_directive("wgpu=warn".parse()?)
        .add_directive("winit=warn".parse()?);
    fmt().with_env_filter(filter).with_target(true).init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let mut cfg = match &cli.config {
        Some(path) => Configuration::from_yaml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Configuration::default(),
    };
    if let Some(dir) = cli.library {
        cfg.library_path = Some(dir);
    }
    let cfg = cfg.validated().context("validating configuration")?;
    info!(
        rotation_interval = %humantime::format_duration(cfg.rotation_interval),
        watch_tick = %humantime::format_duration(cfg.watch_tick),
        max_tiles = cfg.max_tiles,
        "configuration loaded"
    );

    // The event loop must be created on the main thread, before any task
    // needs the surface port.
    let event_loop = EventLoop::<FrameEvent>::with_user_event()
        .build()
        .context("failed to build viewer event loop")?;
    let proxy = event_loop.create_proxy();

    // Channels (small/bounded)
    let (composer_tx, composer_rx) = mpsc::channel::<ComposerCommand>(16);
    let (swap_tx, swap_rx) = mpsc::channel::<CatalogSwap>(4);
    let (watch_tx, watch_rx) = mpsc::channel::<WatchTarget>(4);
    let (frame_tx, frame_rx) = mpsc::channel::<FrameEvent>(16);

    let port = SurfacePort::new(frame_tx);
    let shared = DisplayState::new();
    let cancel = CancellationToken::new();

    // Ctrl-C cancels the pipeline
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    // Bridge posted frame events and cancellation into the winit loop.
    tokio::spawn(surface::forward_to_event_loop(frame_rx, proxy.clone()));
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            cancel.cancelled().await;
            let _ = proxy.send_event(FrameEvent::Cancelled);
        });
    }

    let mut background = JoinSet::new();

    background.spawn({
        let port = port.clone();
        let shared = shared.clone();
        let cfg = cfg.clone();
        let cancel = cancel.clone();
        async move {
            tasks::composer::run(composer_rx, swap_rx, watch_tx, port, shared, cfg, cancel)
                .await
                .context("composer task failed")
        }
    });

    background.spawn({
        let shared = shared.clone();
        let composer_tx = composer_tx.clone();
        let interval = cfg.rotation_interval;
        let cancel = cancel.clone();
        async move {
            tasks::rotation::run(shared, composer_tx, interval, cancel)
                .await
                .context("rotation task failed")
        }
    });

    background.spawn({
        let port = port.clone();
        let shared = shared.clone();
        let tick = cfg.watch_tick;
        let rescan_after = cfg.rescan_after;
        let cancel = cancel.clone();
        async move {
            tasks::watcher::run(watch_rx, swap_tx, port, shared, tick, rescan_after, cancel)
                .await
                .context("watcher task failed")
        }
    });

    if let Some(dir) = cfg.library_path.clone() {
        composer_tx
            .send(ComposerCommand::SetDirectory(dir))
            .await
            .context("queueing startup library scan")?;
    }

    // Run the windowed viewer on the main thread (blocking); this returns
    // when the window closes or cancellation occurs.
    if let Err(e) =
        tasks::viewer::run_windowed(event_loop, cfg, cancel.clone(), shared, composer_tx)
    {
        tracing::error!("{e:?}");
    }
    cancel.cancel();

    while let Some(res) = background.join_next().await {
        match res {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("task error: {e:?}"),
            Err(e) => tracing::error!("join error: {e}"),
        }
    }

    Ok(())
}
