//! Crosswalk controller entry point.
//!
//! The controller owns the scene state machine. Peripherals report button
//! presses and timer expiries over NATS; the controller picks a scene,
//! broadcasts `play_scene` to the display and audio peripherals, and
//! answers API requests from operator tools.
//!
//! # Architecture
//!
//! ```text
//! interactions ─┐
//! heartbeats  ──┼─> ControllerService ──> control
//! api (req)   ──┘           └───────────> api (reply)
//! ```

mod config;
mod error;
mod runner;

use tracing::info;
use tracing_subscriber::EnvFilter;
use xwalk_bus::BusClient;
use xwalk_core::{Controller, ControllerService};
use xwalk_library::AnimationLibrary;

use crate::config::ControllerConfig;
use crate::runner::ControllerRunner;

/// Application entry point.
///
/// Initializes logging, loads configuration and the animation catalogue,
/// connects to NATS, then runs the controller loop until Ctrl-C.
///
/// # Errors
///
/// Returns an error if start-up fails. A missing or invalid animation
/// configuration is fatal.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("xwalk-controller starting");

    let config = ControllerConfig::from_env()?;
    info!(
        nats_url = config.nats_url,
        animation_config = %config.animation_config.display(),
        sound_dir = %config.sound_dir.display(),
        poll_timeout_ms = config.poll_timeout.as_millis(),
        "configuration loaded"
    );

    let library = AnimationLibrary::from_file(&config.animation_config, &config.sound_dir)?;
    info!(walks = library.walk_names().len(), "animation library ready");

    let bus = BusClient::connect(&config.nats_url).await?;

    let service = ControllerService::new(Controller::new(library));
    ControllerRunner::new(bus, service, config.poll_timeout)
        .run()
        .await?;

    Ok(())
}
