//! Transport layer
//!
//! Outbound side of the pub/sub connection. Handlers publish through the
//! [`Publisher`] trait so they never depend on a concrete transport.

mod sidecar;
mod stdout;

use anyhow::Result;
use async_trait::async_trait;

pub use sidecar::SidecarPublisher;
pub use stdout::StdoutPublisher;

/// Publishes JSON payloads on named topics
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publishes a single message
    ///
    /// Returns once the transport accepted the message. No delivery
    /// acknowledgement from subscribers is awaited.
    async fn publish(&self, topic: &str, payload: &serde_json::Value) -> Result<()>;
}
