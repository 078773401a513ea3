//! Transport-free controller message handling.
//!
//! [`ControllerService`] owns every piece of controller-side state: the
//! state machine, the component liveness table, and the outbound command
//! buffer. The bus loop hands it raw payloads from each channel and
//! publishes whatever [`ControllerService::take_outbox`] returns to the
//! Control channel. Nothing here awaits, so one message is always handled
//! to completion before the next.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, Utc};
use tracing::{debug, error, info, warn};
use xwalk_types::{ALL_WALKS, ApiRequest, ApiResponse, CurrentState, Heartbeat, Message};

use crate::error::ControllerError;
use crate::fsm::{Controller, FireOutcome, Trigger};

/// Controller state plus liveness tracking and dispatch.
#[derive(Debug)]
pub struct ControllerService {
    controller: Controller,
    components: BTreeMap<String, DateTime<Utc>>,
    playing: bool,
    outbox: Vec<Message>,
}

impl ControllerService {
    /// Wrap a controller.
    pub fn new(controller: Controller) -> Self {
        let playing = controller.state().is_playing();
        Self {
            controller,
            components: BTreeMap::new(),
            playing,
            outbox: Vec::new(),
        }
    }

    /// The wrapped controller.
    pub const fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Last heartbeat time per component.
    pub const fn components(&self) -> &BTreeMap<String, DateTime<Utc>> {
        &self.components
    }

    /// Whether a scene is playing.
    pub const fn playing(&self) -> bool {
        self.playing
    }

    /// Drain the commands queued for the Control channel, in emission order.
    pub fn take_outbox(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.outbox)
    }

    /// Handle a payload from the Heartbeats channel.
    ///
    /// A component seen for the first time, or one announcing a restart,
    /// gets the current state broadcast so it can synchronise. Returns
    /// whether that happened. Malformed payloads are logged and dropped.
    pub fn handle_heartbeat(&mut self, data: &[u8]) -> bool {
        let beat = match Message::parse(data) {
            Ok(Message::Heartbeat(beat)) => beat,
            Ok(other) => {
                warn!(kind = other.kind(), "non-heartbeat message on heartbeat channel, dropped");
                return false;
            }
            Err(e) => {
                warn!(error = %e, "malformed heartbeat dropped");
                return false;
            }
        };
        self.record_heartbeat(&beat)
    }

    /// Update the liveness table from a parsed heartbeat.
    pub fn record_heartbeat(&mut self, beat: &Heartbeat) -> bool {
        let key = beat.liveness_key();
        let is_new = self.components.insert(key.clone(), beat.sent_at).is_none();
        debug!(component = %key, initial = beat.initial, "heartbeat");
        if !(is_new || beat.initial) {
            return false;
        }
        let state = self.controller.state();
        info!(
            component = %key,
            first_seen = is_new,
            restarted = beat.initial,
            state = %state,
            "new component, broadcasting current state"
        );
        self.outbox.push(Message::CurrentState(CurrentState { state }));
        true
    }

    /// Handle a payload from the Interactions channel.
    ///
    /// Button presses, timer expiries, and resets drive the state machine.
    /// Anything else, or anything unparseable, is logged and dropped, as is
    /// a failed transition.
    pub fn handle_interaction(&mut self, data: &[u8]) {
        let message = match Message::parse(data) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "malformed interaction dropped");
                return;
            }
        };
        let trigger = match &message {
            Message::ButtonPress(press) => {
                info!(
                    host = %press.host,
                    component = %press.component,
                    press_duration = press.press_duration,
                    "button pressed"
                );
                Trigger::ButtonPress
            }
            Message::TimerExpired(expired) => {
                info!(timer_id = %expired.timer_id, duration = expired.duration, "timer expired");
                Trigger::TimerExpired
            }
            Message::Reset(_) => Trigger::Reset,
            other => {
                debug!(kind = other.kind(), "interaction ignored");
                return;
            }
        };
        if let Err(e) = self.fire(trigger) {
            error!(trigger = %trigger, error = %e, "transition failed, state unchanged");
        }
    }

    /// Handle one API request payload and build its reply.
    ///
    /// Always returns a response: unparseable requests and failed actions
    /// produce `success = false` with an explanation.
    pub fn handle_api_request(&mut self, data: &[u8]) -> ApiResponse {
        let request = match ApiRequest::parse(data) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "malformed API request");
                return self.response(false, format!("Invalid request: {e}"));
            }
        };
        debug!(kind = request.kind(), "API request");
        match self.dispatch(&request) {
            Ok(message) => self.response(true, message),
            Err(e) => {
                error!(kind = request.kind(), error = %e, "API request failed");
                self.response(false, format!("Error handling {}: {e}", request.kind()))
            }
        }
    }

    fn dispatch(&mut self, request: &ApiRequest) -> Result<String, ControllerError> {
        match request {
            ApiRequest::Status => Ok("Status retrieved successfully".to_owned()),
            ApiRequest::QueueWalk { walk } => {
                let added = self.controller.queue_walk(walk)?;
                if walk == ALL_WALKS {
                    Ok(format!("Queued {added} walks"))
                } else {
                    Ok(format!("Queued walk '{walk}'"))
                }
            }
            ApiRequest::QueueClear => {
                let removed = self.controller.clear_queue();
                Ok(format!("Cleared {removed} queued walks"))
            }
            ApiRequest::PressButton => self.fire(Trigger::ButtonPress).map(|outcome| match outcome {
                FireOutcome::Transitioned { .. } => "Button pressed, scene started".to_owned(),
                FireOutcome::Ignored { state } => {
                    format!("Button press ignored, controller is in state '{state}'")
                }
            }),
            ApiRequest::TimerExpired => {
                self.fire(Trigger::TimerExpired).map(|outcome| match outcome {
                    FireOutcome::Transitioned { .. } => "Timer expired, scene ended".to_owned(),
                    FireOutcome::Ignored { state } => {
                        format!("Timer expiry ignored, controller is in state '{state}'")
                    }
                })
            }
        }
    }

    fn fire(&mut self, trigger: Trigger) -> Result<FireOutcome, ControllerError> {
        let outcome = self.controller.fire(trigger, &mut self.outbox)?;
        self.refresh_playing();
        Ok(outcome)
    }

    /// Recompute `playing`, logging only when it changes.
    fn refresh_playing(&mut self) {
        let playing = self.controller.state().is_playing();
        if playing != self.playing {
            self.playing = playing;
            info!(playing, "playing changed");
        }
    }

    fn response(&self, success: bool, message: String) -> ApiResponse {
        let library = self.controller.library();
        ApiResponse {
            success,
            message,
            playing: self.playing,
            components: self.components.clone(),
            timestamp: Utc::now(),
            state: self.controller.state(),
            animations: Some(library.config().clone()),
            walk_queue: self.controller.walk_queue(),
            walk_history: self.controller.walk_history(),
            active_menu: library.active_menu_item(Local::now().naive_local()).cloned(),
        }
    }
}
