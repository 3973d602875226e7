//! pattern-trainer: randomized image/timing trainer daemon
//!
//! This daemon runs in the background and provides:
//! - A level-based state machine that shows images for random durations
//! - Audio cues for new images, countdowns and a per-level background loop
//! - IPC server so a front-end can render the current image and reset
//!
//! Scope:
//! - Built-in image catalog and level table
//! - One-second tick with countdown near the end of each image
//! - NO rendering, persistence or configurable levels

mod audio;
mod catalog;
mod config;
mod events;
mod ipc;
mod lifecycle;
mod scheduler;
mod state;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::audio::{AudioGateway, HeadlessGateway, SoundRegistry};
use crate::config::Config;
use crate::events::TrainerEvent;
use crate::ipc::Server;
use crate::lifecycle::ShutdownSignal;
use crate::scheduler::IntervalTicks;
use crate::state::Trainer;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "pattern-trainer starting");

    // Load configuration
    let config = Config::load()?;
    config.ensure_dirs()?;
    info!(?config.socket_path, ?config.assets_dir, "configuration loaded");

    // Start loading sounds right away; playback waits for them
    let registry = Arc::new(SoundRegistry::new(&config.assets_dir));
    registry.preload();

    #[cfg(feature = "playback")]
    match rodio::OutputStream::try_default() {
        Ok((_stream, handle)) => {
            info!("audio output opened");
            return run(config, audio::RodioGateway::new(registry, handle)).await;
        }
        Err(e) => {
            warn!(?e, "no audio output, continuing without sound");
        }
    }

    run(config, HeadlessGateway::new(registry)).await
}

async fn run<A: AudioGateway>(config: Config, gateway: A) -> Result<()> {
    // Create shutdown signal handler
    let shutdown = ShutdownSignal::new();

    // Create channels for inter-component communication
    // IPC server -> Trainer (reset requests)
    let (command_tx, command_rx) = mpsc::channel(8);
    // Trainer -> IPC server (display state and notifications)
    let (event_tx, _event_rx) = broadcast::channel::<TrainerEvent>(64);

    // Create the trainer
    let mut trainer = Trainer::new(Arc::new(gateway), event_tx.clone())?;

    // Create IPC server with event subscription
    let server = Server::with_events(&config.socket_path, command_tx, event_tx.subscribe())?;
    server.set_display(*trainer.display()).await;

    // Subscribe to trainer events for status updates
    let mut display_rx = event_tx.subscribe();
    let server_for_events = &server;

    info!("daemon initialized, entering main loop");

    // Main event loop
    tokio::select! {
        // Run the trainer (one tick per second, plus reset commands)
        _ = trainer.run(IntervalTicks::every_second(), command_rx) => {
            info!("trainer exited");
        }

        // Run the IPC server (accepts client connections)
        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }

        // Keep the IPC server's display state current
        _ = async {
            loop {
                match display_rx.recv().await {
                    Ok(event) => {
                        debug!(%event, "trainer event");
                        if let Some(display) = event.display() {
                            server_for_events.set_display(*display).await;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "trainer event receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        } => {
            info!("trainer event handler exited");
        }

        // Wait for shutdown signal
        _ = shutdown.wait() => {
            info!("shutdown signal received");
        }
    }

    // Cleanup
    info!("shutting down...");

    trainer.stop_background().await;
    server.shutdown().await;

    info!("pattern-trainer stopped");

    Ok(())
}
