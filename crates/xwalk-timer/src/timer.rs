//! Scene timer.
//!
//! On `play_scene` the timer waits the scene's total duration plus a small
//! buffer, then reports `timer_expired` so the controller can return to
//! `ready`. A new scene replaces any running timer; `end_scene` and `reset`
//! cancel it. Expiries are delivered through a channel so the bus loop
//! stays the only publisher.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use xwalk_types::{Message, TimerExpired};

/// Extra wait added to every scene so the last audio frame finishes.
pub const TIMER_BUFFER_SECS: f64 = 0.1;

/// Prefix of every timer id.
const TIMER_ID_PREFIX: &str = "scene_timer_";

struct RunningTimer {
    id: String,
    handle: JoinHandle<()>,
}

/// Tracks at most one running scene timer.
pub struct SceneTimer {
    next_id: u64,
    current: Option<RunningTimer>,
    expired_tx: mpsc::UnboundedSender<TimerExpired>,
}

impl SceneTimer {
    /// A timer that sends expiries to `expired_tx`.
    pub const fn new(expired_tx: mpsc::UnboundedSender<TimerExpired>) -> Self {
        Self {
            next_id: 0,
            current: None,
            expired_tx,
        }
    }

    /// React to a Control message.
    pub fn handle(&mut self, message: &Message) {
        match message {
            Message::PlayScene(scene) => {
                info!(walk = %scene.walk, total_duration = scene.total_duration, "play scene");
                self.start(scene.total_duration);
            }
            Message::EndScene(_) | Message::Reset(_) => {
                self.stop();
            }
            other => debug!(kind = other.kind(), "control message ignored"),
        }
    }

    /// Start a timer for a scene of `total_duration` seconds, replacing any
    /// running one. Returns the new timer id, or `None` if the duration is
    /// not a usable number of seconds.
    pub fn start(&mut self, total_duration: f64) -> Option<String> {
        let wait = match Duration::try_from_secs_f64(total_duration + TIMER_BUFFER_SECS) {
            Ok(wait) => wait,
            Err(e) => {
                warn!(total_duration, error = %e, "invalid scene duration, timer not started");
                return None;
            }
        };
        self.cancel_current();

        self.next_id = self.next_id.saturating_add(1);
        let id = format!("{TIMER_ID_PREFIX}{}", self.next_id);
        let expired = TimerExpired {
            timer_id: id.clone(),
            duration: total_duration,
        };
        let tx = self.expired_tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            info!(timer_id = %expired.timer_id, duration = expired.duration, "scene timer expired");
            if tx.send(expired).is_err() {
                debug!("timer receiver closed, expiry dropped");
            }
        });
        info!(timer_id = %id, wait_ms = wait.as_millis(), "scene timer started");
        self.current = Some(RunningTimer {
            id: id.clone(),
            handle,
        });
        Some(id)
    }

    /// Cancel the running timer. Returns whether one was still pending.
    pub fn stop(&mut self) -> bool {
        let stopped = self.cancel_current();
        if stopped {
            info!("scene timer stopped");
        }
        stopped
    }

    /// Id of the most recent timer that has not been cancelled.
    pub fn current_id(&self) -> Option<&str> {
        self.current.as_ref().map(|timer| timer.id.as_str())
    }

    fn cancel_current(&mut self) -> bool {
        let Some(timer) = self.current.take() else {
            return false;
        };
        let pending = !timer.handle.is_finished();
        if pending {
            timer.handle.abort();
            debug!(timer_id = %timer.id, "scene timer cancelled");
        }
        pending
    }
}

impl Drop for SceneTimer {
    fn drop(&mut self) {
        self.cancel_current();
    }
}
