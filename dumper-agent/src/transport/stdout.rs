//! Publishing to standard output
//!
//! Used by the one-shot `dump` command: each message becomes one JSON line so
//! the output can be piped into other tools.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::Publisher;

pub struct StdoutPublisher {
    stdout: Mutex<tokio::io::Stdout>,
}

impl StdoutPublisher {
    pub fn new() -> Self {
        Self {
            stdout: Mutex::new(tokio::io::stdout()),
        }
    }
}

impl Default for StdoutPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Publisher for StdoutPublisher {
    async fn publish(&self, topic: &str, payload: &serde_json::Value) -> Result<()> {
        tracing::debug!("Writing message for {} to stdout", topic);

        let mut line = serde_json::to_vec(payload).context("Failed to encode payload")?;
        line.push(b'\n');

        let mut stdout = self.stdout.lock().await;
        stdout
            .write_all(&line)
            .await
            .context("Failed to write to stdout")?;
        stdout.flush().await.context("Failed to flush stdout")?;
        Ok(())
    }
}
