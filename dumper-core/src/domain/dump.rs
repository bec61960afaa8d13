//! Dump domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use uuid::Uuid;

/// A received fatal-safety trigger
///
/// The inbound payload is never interpreted; the id and timestamp exist only
/// to correlate log lines of one dump attempt.
#[derive(Debug, Clone)]
pub struct DumpRequest {
    pub id: Uuid,
    pub received_at: chrono::DateTime<chrono::Utc>,
}

impl DumpRequest {
    /// Stamps a new request at the current time
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            received_at: chrono::Utc::now(),
        }
    }
}

impl Default for DumpRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome code of a dump, encoded on the wire as `0` or `1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum DumpStatus {
    Success,
    Failure,
}

impl From<DumpStatus> for u8 {
    fn from(status: DumpStatus) -> Self {
        match status {
            DumpStatus::Success => 0,
            DumpStatus::Failure => 1,
        }
    }
}

impl TryFrom<u8> for DumpStatus {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(DumpStatus::Success),
            1 => Ok(DumpStatus::Failure),
            other => Err(format!("unknown dump status code: {}", other)),
        }
    }
}

/// Result of a dump attempt, published once per trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpResult {
    pub status: DumpStatus,
    pub message: String,
}

impl DumpResult {
    /// Result reported when every regular file was copied
    pub fn success(destination: &Path) -> Self {
        Self {
            status: DumpStatus::Success,
            message: format!("Dumped logs to {}", destination.display()),
        }
    }

    /// Result reported when the dump was aborted
    ///
    /// Files copied before the error stay in the destination.
    pub fn failure(error: impl fmt::Display) -> Self {
        Self {
            status: DumpStatus::Failure,
            message: format!("Failed to dump logs: {}", error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == DumpStatus::Success
    }
}
