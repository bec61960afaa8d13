//! Event DTOs

use serde::{Deserialize, Serialize};

use crate::domain::dump::DumpResult;

/// Outbound payload on the dumper response topic
///
/// Serializes as `{"result": {"status": <0|1>, "message": "..."}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub result: DumpResult,
}

impl From<DumpResult> for ResultEnvelope {
    fn from(result: DumpResult) -> Self {
        Self { result }
    }
}

/// Programmatic subscription advertised to the sidecar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub pubsubname: String,
    pub topic: String,
    pub route: String,
}

/// Delivery acknowledgement returned for an inbound event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAck {
    pub status: String,
}

impl EventAck {
    pub fn success() -> Self {
        Self {
            status: "SUCCESS".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_success_envelope_shape() {
        let envelope = ResultEnvelope::from(DumpResult::success(Path::new("/data/dump")));
        assert_eq!(
            serde_json::to_string(&envelope).unwrap(),
            r#"{"result":{"status":0,"message":"Dumped logs to /data/dump"}}"#
        );
    }

    #[test]
    fn test_failure_envelope_parses_back() {
        let raw = r#"{"result":{"status":1,"message":"Failed to dump logs: boom"}}"#;
        let envelope: ResultEnvelope = serde_json::from_str(raw).unwrap();
        assert!(!envelope.result.is_success());
        assert_eq!(envelope.result.message, "Failed to dump logs: boom");
    }
}
