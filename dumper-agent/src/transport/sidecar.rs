//! Publishing through the pub/sub sidecar

use anyhow::{Context, Result};
use async_trait::async_trait;
use dumper_client::PubSubClient;
use std::sync::Arc;

use super::Publisher;

/// Publisher backed by the sidecar HTTP API
pub struct SidecarPublisher {
    client: Arc<PubSubClient>,
}

impl SidecarPublisher {
    pub fn new(client: Arc<PubSubClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Publisher for SidecarPublisher {
    async fn publish(&self, topic: &str, payload: &serde_json::Value) -> Result<()> {
        self.client
            .publish(topic, payload)
            .await
            .with_context(|| format!("Failed to publish to {}", topic))
    }
}
