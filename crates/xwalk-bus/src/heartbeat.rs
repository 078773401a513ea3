//! Background heartbeat publisher.
//!
//! Every component announces itself on [`HEARTBEATS`] at a fixed interval.
//! The first [`INITIAL_BEATS`] beats after start-up are flagged `initial`
//! so the controller treats a restarted component like a new one even if
//! its identity is already in the liveness table.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use xwalk_types::{Heartbeat, Message};

use crate::client::{BusClient, HEARTBEATS};

/// Beats flagged `initial` after start-up.
pub const INITIAL_BEATS: u64 = 2;

/// Build the `seq`-th heartbeat (zero-based) for a component.
pub fn heartbeat_message(host: &str, component: &str, seq: u64) -> Message {
    Message::Heartbeat(Heartbeat {
        host: host.to_owned(),
        component: component.to_owned(),
        sent_at: Utc::now(),
        initial: seq < INITIAL_BEATS,
    })
}

/// A running heartbeat task. Stop it with [`HeartbeatTask::stop`].
#[derive(Debug)]
pub struct HeartbeatTask {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl HeartbeatTask {
    /// Start publishing heartbeats for `component` on `host` every
    /// `interval`. The first beat goes out immediately.
    pub fn spawn(bus: BusClient, host: String, component: String, interval: Duration) -> Self {
        let (stop, mut stop_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            info!(
                host = %host,
                component = %component,
                interval_ms = interval.as_millis(),
                "heartbeat task started"
            );
            let mut ticker = tokio::time::interval(interval);
            let mut seq: u64 = 0;
            loop {
                tokio::select! {
                    biased;
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        let beat = heartbeat_message(&host, &component, seq);
                        if let Err(e) = bus.publish(HEARTBEATS, &beat).await {
                            warn!(component = %component, error = %e, "failed to publish heartbeat");
                        }
                        seq = seq.saturating_add(1);
                    }
                }
            }
            debug!(component = %component, beats = seq, "heartbeat task stopped");
        });
        Self { stop, handle }
    }

    /// Signal the task to stop and wait up to `grace` for it to finish.
    /// A task that does not finish in time is aborted.
    pub async fn stop(mut self, grace: Duration) {
        if self.stop.send(true).is_err() {
            debug!("heartbeat task already finished");
        }
        match tokio::time::timeout(grace, &mut self.handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "heartbeat task ended abnormally"),
            Err(_) => {
                warn!(grace_ms = grace.as_millis(), "heartbeat task did not stop in time, aborting");
                self.handle.abort();
            }
        }
    }
}
