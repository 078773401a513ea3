//! Scene timer peripheral entry point.
//!
//! Listens on the Control subject for `play_scene`, waits out the scene, and
//! reports `timer_expired` on the Interactions subject. Publishes heartbeats
//! so the controller resynchronises it after a restart.

mod config;
mod error;
mod timer;

use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use xwalk_bus::{BusClient, CONTROL, HeartbeatTask, INTERACTIONS};
use xwalk_types::Message;

use crate::config::TimerConfig;
use crate::error::TimerError;
use crate::timer::SceneTimer;

/// Component name reported in heartbeats.
const COMPONENT: &str = "timer";

/// How long shutdown waits for the heartbeat task.
const HEARTBEAT_STOP_GRACE: Duration = Duration::from_secs(2);

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration or the NATS connection fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("xwalk-timer starting");

    let config = TimerConfig::from_env()?;
    info!(
        nats_url = config.nats_url,
        hostname = config.hostname,
        heartbeat_interval_ms = config.heartbeat_interval.as_millis(),
        "configuration loaded"
    );

    let bus = BusClient::connect(&config.nats_url).await?;
    run(bus, config).await?;
    Ok(())
}

/// Serve the scene timer until Ctrl-C.
async fn run(bus: BusClient, config: TimerConfig) -> Result<(), TimerError> {
    let mut control = bus.subscribe(CONTROL).await?;
    let heartbeat = HeartbeatTask::spawn(
        bus.clone(),
        config.hostname,
        COMPONENT.to_owned(),
        config.heartbeat_interval,
    );

    let (expired_tx, mut expired_rx) = mpsc::unbounded_channel();
    let mut timer = SceneTimer::new(expired_tx);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;
            signal = &mut shutdown => {
                if let Err(e) = signal {
                    warn!(error = %e, "failed to listen for interrupt");
                }
                info!("shutting down scene timer");
                break;
            }
            Some(message) = control.next() => {
                match Message::parse(&message.payload) {
                    Ok(message) => timer.handle(&message),
                    Err(e) => warn!(error = %e, "malformed control message dropped"),
                }
            }
            Some(expired) = expired_rx.recv() => {
                if let Err(e) = bus.publish(INTERACTIONS, &Message::TimerExpired(expired)).await {
                    warn!(error = %e, "failed to publish timer expiry");
                }
            }
        }
    }

    timer.stop();
    heartbeat.stop(HEARTBEAT_STOP_GRACE).await;
    if let Err(e) = control.unsubscribe().await {
        warn!(error = %e, "failed to unsubscribe during shutdown");
    }
    if let Err(e) = bus.flush().await {
        warn!(error = %e, "failed to flush bus during shutdown");
    }
    info!("scene timer stopped");
    Ok(())
}
