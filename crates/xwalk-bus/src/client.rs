//! NATS connection wrapper shared by the controller and peripherals.
//!
//! The crosswalk uses three broadcast subjects and one request/reply
//! subject:
//!
//! | subject               | direction                   | carries                          |
//! |-----------------------|-----------------------------|----------------------------------|
//! | `xwalk.interactions`  | peripherals -> controller   | `button_press`, `timer_expired`  |
//! | `xwalk.control`       | controller -> peripherals   | `play_scene`, `end_scene`, ...   |
//! | `xwalk.heartbeats`    | everyone -> controller      | `heartbeat`                      |
//! | `xwalk.api`           | clients <-> controller      | `ApiRequest` / `ApiResponse`     |
//!
//! Delivery is at-most-once. A component that misses a message resyncs
//! through the `current_state` the controller sends when it sees a new or
//! restarted component.

use tracing::{debug, info};
use xwalk_types::{ApiResponse, Message};

use crate::error::BusError;

/// Events from peripherals to the controller.
pub const INTERACTIONS: &str = "xwalk.interactions";

/// Commands from the controller to peripherals.
pub const CONTROL: &str = "xwalk.control";

/// Liveness heartbeats from every component.
pub const HEARTBEATS: &str = "xwalk.heartbeats";

/// Request/reply API served by the controller.
pub const API: &str = "xwalk.api";

/// An owned handle on the bus. Cloning shares the connection.
#[derive(Clone)]
pub struct BusClient {
    client: async_nats::Client,
}

impl BusClient {
    /// Connect to a NATS server.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Nats`] if the connection cannot be established.
    pub async fn connect(url: &str) -> Result<Self, BusError> {
        info!(url = url, "connecting to NATS server");
        let client = async_nats::connect(url)
            .await
            .map_err(|e| BusError::Nats(format!("failed to connect to {url}: {e}")))?;
        info!("NATS connection established");
        Ok(Self { client })
    }

    /// Subscribe to one subject.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Nats`] if the subscription fails.
    pub async fn subscribe(&self, subject: &str) -> Result<async_nats::Subscriber, BusError> {
        let subscriber = self
            .client
            .subscribe(subject.to_owned())
            .await
            .map_err(|e| BusError::Nats(format!("failed to subscribe to {subject}: {e}")))?;
        info!(subject = subject, "subscribed");
        Ok(subscriber)
    }

    /// Publish a taxonomy message.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Serde`] if encoding fails or [`BusError::Nats`] if
    /// publishing fails.
    pub async fn publish(&self, subject: &str, message: &Message) -> Result<(), BusError> {
        let payload = message.to_json()?;
        debug!(subject = subject, kind = message.kind(), "publishing");
        self.publish_bytes(subject.to_owned(), payload).await
    }

    /// Send an API response to a request's reply subject.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Serde`] if encoding fails or [`BusError::Nats`] if
    /// publishing fails.
    pub async fn reply(
        &self,
        reply_to: async_nats::Subject,
        response: &ApiResponse,
    ) -> Result<(), BusError> {
        let payload = response.to_json()?;
        debug!(subject = %reply_to, success = response.success, "replying");
        self.publish_bytes(reply_to.to_string(), payload).await
    }

    /// Send a request and wait for the first reply, with no deadline of our
    /// own. Callers add one; see [`crate::ApiClient`].
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Nats`] if the request fails.
    pub async fn request(
        &self,
        subject: &str,
        payload: Vec<u8>,
    ) -> Result<async_nats::Message, BusError> {
        self.client
            .request(subject.to_owned(), payload.into())
            .await
            .map_err(|e| BusError::Nats(format!("request to {subject} failed: {e}")))
    }

    /// Flush all pending messages to the server.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Nats`] if the flush fails.
    pub async fn flush(&self) -> Result<(), BusError> {
        self.client
            .flush()
            .await
            .map_err(|e| BusError::Nats(format!("flush failed: {e}")))
    }

    async fn publish_bytes(&self, subject: String, payload: Vec<u8>) -> Result<(), BusError> {
        self.client
            .publish(subject.clone(), payload.into())
            .await
            .map_err(|e| BusError::Nats(format!("failed to publish to {subject}: {e}")))
    }
}

impl std::fmt::Debug for BusClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusClient")
            .field("state", &self.client.connection_state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subjects_are_distinct_and_namespaced() {
        let subjects = [INTERACTIONS, CONTROL, HEARTBEATS, API];
        for (i, a) in subjects.iter().enumerate() {
            assert!(a.starts_with("xwalk."));
            for b in subjects.iter().skip(i.saturating_add(1)) {
                assert_ne!(a, b);
            }
        }
    }

    // Tests that need a live NATS server are marked #[ignore].
    #[tokio::test]
    #[ignore]
    async fn connect_to_nats() {
        let result = BusClient::connect("nats://localhost:4222").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    #[ignore]
    async fn publish_reaches_subscriber() {
        use futures::StreamExt;
        use xwalk_types::{EndScene, Message};

        let Ok(bus) = BusClient::connect("nats://localhost:4222").await else {
            return;
        };
        let Ok(mut sub) = bus.subscribe(CONTROL).await else {
            return;
        };
        let sent = Message::EndScene(EndScene {});
        assert!(bus.publish(CONTROL, &sent).await.is_ok());
        let received = sub.next().await.map(|m| Message::parse(&m.payload));
        assert!(matches!(received, Some(Ok(Message::EndScene(_)))));
    }
}
