//! Topic dispatch
//!
//! Maps topic names to handlers. Handlers are registered once at startup;
//! the inbound side of the transport then calls [`Dispatcher::dispatch`] for
//! every delivered message. Each delivery runs in its own task so a slow
//! handler never holds up the transport.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::debug;

/// Reacts to messages on a topic
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handles one delivered message
    ///
    /// Handlers own their failures: nothing is returned to the transport.
    async fn handle(&self, payload: String);
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("no handler registered for topic '{0}'")]
    UnknownTopic(String),
}

/// Topic → handler table
#[derive(Default, Clone)]
pub struct Dispatcher {
    handlers: BTreeMap<String, Arc<dyn EventHandler>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the handler for a topic, replacing any previous one
    pub fn register(&mut self, topic: impl Into<String>, handler: Arc<dyn EventHandler>) {
        let topic = topic.into();
        debug!("Registered handler for {}", topic);
        self.handlers.insert(topic, handler);
    }

    /// Topics with a registered handler, in sorted order
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Hands a message to the topic's handler on a new task
    pub fn dispatch(&self, topic: &str, payload: String) -> Result<JoinHandle<()>, DispatchError> {
        let handler = self
            .handlers
            .get(topic)
            .cloned()
            .ok_or_else(|| DispatchError::UnknownTopic(topic.to_string()))?;

        debug!("Dispatching {} byte(s) on {}", payload.len(), topic);

        Ok(tokio::spawn(async move { handler.handle(payload).await }))
    }
}
