//! The controller's bus loop.
//!
//! One task owns the [`ControllerService`] and multiplexes the three inbound
//! subjects plus Ctrl-C with `tokio::select!`. Each received message is
//! handled to completion, then any commands it produced are published to
//! the Control subject before the next wait. A wait with no traffic ends
//! after the poll timeout and simply loops.

use std::time::Duration;

use futures::StreamExt;
use tracing::{debug, info, trace, warn};
use xwalk_bus::{API, BusClient, CONTROL, HEARTBEATS, INTERACTIONS};
use xwalk_core::ControllerService;

use crate::error::ControllerAppError;

/// Drives a [`ControllerService`] from the bus.
pub struct ControllerRunner {
    bus: BusClient,
    service: ControllerService,
    poll_timeout: Duration,
}

impl ControllerRunner {
    /// Create a runner.
    pub const fn new(bus: BusClient, service: ControllerService, poll_timeout: Duration) -> Self {
        Self {
            bus,
            service,
            poll_timeout,
        }
    }

    /// Run until interrupted.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerAppError::Bus`] if a subscription cannot be
    /// created. Nothing after start-up is fatal.
    pub async fn run(mut self) -> Result<(), ControllerAppError> {
        let mut heartbeats = self.bus.subscribe(HEARTBEATS).await?;
        let mut interactions = self.bus.subscribe(INTERACTIONS).await?;
        let mut api = self.bus.subscribe(API).await?;

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        info!(
            poll_timeout_ms = self.poll_timeout.as_millis(),
            state = %self.service.controller().state(),
            "controller running, press Ctrl-C to exit"
        );

        loop {
            tokio::select! {
                biased;
                signal = &mut shutdown => {
                    match signal {
                        Ok(()) => info!("interrupt received, shutting down controller"),
                        Err(e) => warn!(error = %e, "failed to listen for interrupt, shutting down"),
                    }
                    break;
                }
                Some(message) = heartbeats.next() => {
                    self.service.handle_heartbeat(&message.payload);
                }
                Some(message) = interactions.next() => {
                    debug!(payload_size = message.payload.len(), "interaction received");
                    self.service.handle_interaction(&message.payload);
                }
                Some(message) = api.next() => {
                    self.handle_api(message).await;
                }
                () = tokio::time::sleep(self.poll_timeout) => {
                    trace!("poll timeout");
                }
            }
            self.publish_outbox().await;
        }

        for (subject, subscriber) in [
            (HEARTBEATS, &mut heartbeats),
            (INTERACTIONS, &mut interactions),
            (API, &mut api),
        ] {
            if let Err(e) = subscriber.unsubscribe().await {
                warn!(subject = subject, error = %e, "failed to unsubscribe during shutdown");
            }
        }
        if let Err(e) = self.bus.flush().await {
            warn!(error = %e, "failed to flush bus during shutdown");
        }
        info!("controller stopped");
        Ok(())
    }

    /// Answer one API request. Replies are always sent when a reply subject
    /// exists, including for malformed requests.
    async fn handle_api(&mut self, message: async_nats::Message) {
        let response = self.service.handle_api_request(&message.payload);
        let Some(reply_to) = message.reply else {
            warn!(subject = %message.subject, "API request without reply subject, response dropped");
            return;
        };
        if let Err(e) = self.bus.reply(reply_to, &response).await {
            warn!(error = %e, "failed to send API response");
        }
    }

    /// Publish every command the last handled message produced.
    async fn publish_outbox(&mut self) {
        for command in self.service.take_outbox() {
            if let Err(e) = self.bus.publish(CONTROL, &command).await {
                warn!(kind = command.kind(), error = %e, "failed to publish control command");
            }
        }
    }
}
