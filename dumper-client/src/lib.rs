//! Dumper pub/sub client
//!
//! A small HTTP client for the pub/sub sidecar that owns the broker
//! connection. The agent only ever publishes through it; inbound delivery is
//! pushed by the sidecar to the agent's own HTTP API.
//!
//! # Example
//!
//! ```no_run
//! use dumper_client::PubSubClient;
//! use dumper_core::domain::topic::DUMPER_RESPONSE_TOPIC;
//!
//! #[tokio::main]
//! async fn main() -> dumper_client::Result<()> {
//!     let client = PubSubClient::new("http://localhost:3500", "mqtt-pubsub");
//!     client
//!         .publish(DUMPER_RESPONSE_TOPIC, &serde_json::json!({ "hello": "world" }))
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod error;

pub use error::{ClientError, Result};

use reqwest::{Client, Url};
use serde::Serialize;
use tracing::debug;

/// HTTP client for the sidecar publish API
#[derive(Debug, Clone)]
pub struct PubSubClient {
    /// Base URL of the sidecar (e.g., "http://localhost:3500")
    base_url: String,
    /// Name of the pub/sub component configured in the sidecar
    pubsub_name: String,
    /// HTTP client instance
    client: Client,
}

impl PubSubClient {
    /// Create a new pub/sub client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the sidecar (e.g., "http://localhost:3500")
    /// * `pubsub_name` - The pub/sub component to publish through
    pub fn new(base_url: impl Into<String>, pubsub_name: impl Into<String>) -> Self {
        Self::with_client(base_url, pubsub_name, Client::new())
    }

    /// Create a new pub/sub client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(
        base_url: impl Into<String>,
        pubsub_name: impl Into<String>,
        client: Client,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            pubsub_name: pubsub_name.into(),
            client,
        }
    }

    /// Get the base URL of the sidecar
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn pubsub_name(&self) -> &str {
        &self.pubsub_name
    }

    /// Publish a JSON payload on a topic
    ///
    /// The sidecar answers 204 once the broker accepted the message.
    pub async fn publish<T: Serialize + ?Sized>(&self, topic: &str, payload: &T) -> Result<()> {
        let url = self.publish_url(topic)?;
        let body = serde_json::to_vec(payload)?;

        debug!("Publishing {} bytes to {}", body.len(), topic);

        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }

    /// Build the publish endpoint for a topic
    ///
    /// Topics may contain `/`, so the topic is encoded as a single path segment.
    pub fn publish_url(&self, topic: &str) -> Result<Url> {
        if topic.is_empty() {
            return Err(ClientError::InvalidRequest("topic cannot be empty".into()));
        }

        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::InvalidRequest(format!("bad sidecar url: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidRequest("sidecar url cannot be a base".into()))?
            .pop_if_empty()
            .extend(["v1.0", "publish", self.pubsub_name.as_str(), topic]);

        Ok(url)
    }
}
