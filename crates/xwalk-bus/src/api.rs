//! Request/reply client for the controller API.

use std::time::Duration;

use tracing::{debug, warn};
use xwalk_types::{ApiRequest, ApiResponse};

use crate::client::{API, BusClient};
use crate::error::BusError;

/// How long a client waits for the controller to answer.
pub const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(5);

/// Sends [`ApiRequest`]s and waits for the matching [`ApiResponse`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    bus: BusClient,
    timeout: Duration,
}

impl ApiClient {
    /// A client using [`DEFAULT_API_TIMEOUT`].
    pub const fn new(bus: BusClient) -> Self {
        Self::with_timeout(bus, DEFAULT_API_TIMEOUT)
    }

    /// A client with a custom reply deadline.
    pub const fn with_timeout(bus: BusClient, timeout: Duration) -> Self {
        Self { bus, timeout }
    }

    /// Send one request and wait for its reply.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Timeout`] if no reply arrives in time,
    /// [`BusError::Serde`] if the reply cannot be decoded, and
    /// [`BusError::Nats`] for transport failures.
    pub async fn request(&self, request: &ApiRequest) -> Result<ApiResponse, BusError> {
        let payload = request.to_json()?;
        debug!(kind = request.kind(), "sending API request");
        let reply = tokio::time::timeout(self.timeout, self.bus.request(API, payload))
            .await
            .map_err(|elapsed| {
                warn!(kind = request.kind(), error = %elapsed, "API request timed out");
                BusError::Timeout {
                    subject: API.to_owned(),
                    timeout: self.timeout,
                }
            })??;
        let response = ApiResponse::parse(&reply.payload)?;
        debug!(success = response.success, message = %response.message, "API reply");
        Ok(response)
    }

    /// Shorthand for [`ApiRequest::Status`].
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn status(&self) -> Result<ApiResponse, BusError> {
        self.request(&ApiRequest::Status).await
    }
}
