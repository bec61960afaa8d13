//! Fatal-safety dump handler
//!
//! Reacts to a fatal safety event by dumping the logs and publishing exactly
//! one result on the response topic, whatever happened during the dump.

use async_trait::async_trait;
use dumper_core::domain::dump::{DumpRequest, DumpResult};
use dumper_core::domain::topic::{DUMPER_RESPONSE_TOPIC, SAFETY_FATAL_TOPIC};
use dumper_core::dto::event::ResultEnvelope;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

use crate::dispatch::EventHandler;
use crate::service::DumpService;
use crate::transport::Publisher;

/// Handler bound to the fatal-safety topic
pub struct DumpHandler {
    service: Arc<dyn DumpService>,
    publisher: Arc<dyn Publisher>,
    /// Bounds how many dumps overlap; triggers wait for a permit, none are dropped
    permits: Arc<Semaphore>,
}

impl DumpHandler {
    /// Creates a new dump handler
    ///
    /// # Arguments
    /// * `service` - Performs the actual copy
    /// * `publisher` - Receives the result notification
    /// * `max_concurrent` - Number of dumps allowed to run at once (at least 1)
    pub fn new(
        service: Arc<dyn DumpService>,
        publisher: Arc<dyn Publisher>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            service,
            publisher,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Runs one dump and publishes its result
    ///
    /// Never fails: dump errors become a failure result and publish errors
    /// are logged.
    pub async fn on_safety_fatal(&self, request: DumpRequest) -> DumpResult {
        debug!(
            "Event {} ({}). Dumping to {}",
            SAFETY_FATAL_TOPIC,
            request.id,
            self.service.destination().display()
        );

        let result = {
            // The semaphore is never closed
            let _permit = self.permits.acquire().await.ok();

            match self.service.dump().await {
                Ok(_) => DumpResult::success(self.service.destination()),
                Err(e) => {
                    error!("Failed to dump logs: {}", e);
                    DumpResult::failure(e)
                }
            }
        };

        self.publish_result(&request, &result).await;

        info!(
            "Dump {} finished with status: {}",
            request.id,
            if result.is_success() { "success" } else { "failure" }
        );

        result
    }

    async fn publish_result(&self, request: &DumpRequest, result: &DumpResult) {
        let payload = match serde_json::to_value(ResultEnvelope::from(result.clone())) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to encode result of dump {}: {}", request.id, e);
                return;
            }
        };

        if let Err(e) = self.publisher.publish(DUMPER_RESPONSE_TOPIC, &payload).await {
            error!("Failed to publish result of dump {}: {:#}", request.id, e);
        }
    }
}

#[async_trait]
impl EventHandler for DumpHandler {
    async fn handle(&self, _payload: String) {
        self.on_safety_fatal(DumpRequest::new()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Dispatcher;
    use crate::service::{DumpError, DumpReport, FsDumpService};
    use crate::transport::testing::RecordingPublisher;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    fn handler_for(source: &Path, destination: &Path) -> (DumpHandler, Arc<RecordingPublisher>) {
        let publisher = Arc::new(RecordingPublisher::default());
        let service = Arc::new(FsDumpService::new(source, destination));
        (DumpHandler::new(service, publisher.clone(), 1), publisher)
    }

    #[tokio::test]
    async fn test_success_publishes_one_result() {
        let root = TempDir::new().unwrap();
        let logs = root.path().join("logs");
        let dump = root.path().join("dump");
        std::fs::create_dir(&logs).unwrap();
        std::fs::create_dir(&dump).unwrap();
        std::fs::write(logs.join("a.log"), b"a").unwrap();
        std::fs::write(logs.join("b.log"), b"b").unwrap();
        std::fs::create_dir(logs.join("sub")).unwrap();

        let (handler, publisher) = handler_for(&logs, &dump);
        let result = handler.on_safety_fatal(DumpRequest::new()).await;

        assert!(result.is_success());
        let messages = publisher.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, DUMPER_RESPONSE_TOPIC);
        assert_eq!(
            messages[0].1,
            serde_json::json!({
                "result": {
                    "status": 0,
                    "message": format!("Dumped logs to {}", dump.display()),
                }
            })
        );
        assert!(dump.join("a.log").is_file());
        assert!(dump.join("b.log").is_file());
        assert!(!dump.join("sub").exists());
    }

    #[tokio::test]
    async fn test_missing_source_publishes_failure() {
        let root = TempDir::new().unwrap();
        let dump = root.path().join("dump");
        std::fs::create_dir(&dump).unwrap();

        let (handler, publisher) = handler_for(&root.path().join("logs"), &dump);
        let result = handler.on_safety_fatal(DumpRequest::new()).await;

        assert!(!result.is_success());
        let messages = publisher.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].1["result"]["status"], 1);
        assert!(
            messages[0].1["result"]["message"]
                .as_str()
                .unwrap()
                .starts_with("Failed to dump logs: ")
        );
        assert_eq!(std::fs::read_dir(&dump).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_copy_error_publishes_single_failure() {
        let root = TempDir::new().unwrap();
        let logs = root.path().join("logs");
        let dump = root.path().join("dump");
        std::fs::create_dir(&logs).unwrap();
        std::fs::create_dir(&dump).unwrap();
        std::fs::write(logs.join("a.log"), b"a").unwrap();
        std::fs::create_dir(dump.join("a.log")).unwrap();

        let (handler, publisher) = handler_for(&logs, &dump);
        let result = handler.on_safety_fatal(DumpRequest::new()).await;

        assert!(!result.is_success());
        let messages = publisher.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, DUMPER_RESPONSE_TOPIC);
        assert_eq!(messages[0].1["result"]["status"], 1);
        let message = messages[0].1["result"]["message"].as_str().unwrap();
        assert!(message.starts_with("Failed to dump logs: "));
        assert!(message.contains("a.log"));
    }

    #[tokio::test]
    async fn test_publish_failure_does_not_escalate() {
        let root = TempDir::new().unwrap();
        let publisher = Arc::new(RecordingPublisher::failing());
        let service = Arc::new(FsDumpService::new(root.path(), PathBuf::from("/nonexistent")));
        let handler = DumpHandler::new(service, publisher.clone(), 1);

        let result = handler.on_safety_fatal(DumpRequest::new()).await;

        // empty source: nothing to copy, so the missing destination is never touched
        assert!(result.is_success());
        assert_eq!(publisher.messages().len(), 1);
    }

    /// Counts how many dumps overlap
    struct SlowDump {
        running: AtomicUsize,
        peak: AtomicUsize,
        destination: PathBuf,
    }

    #[async_trait]
    impl DumpService for SlowDump {
        fn destination(&self) -> &Path {
            &self.destination
        }

        async fn dump(&self) -> Result<DumpReport, DumpError> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            Ok(DumpReport::default())
        }
    }

    #[tokio::test]
    async fn test_overlapping_triggers_are_serialized() {
        let service = Arc::new(SlowDump {
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            destination: PathBuf::from("/data/dump"),
        });
        let publisher = Arc::new(RecordingPublisher::default());
        let handler = Arc::new(DumpHandler::new(service.clone(), publisher.clone(), 1));

        let mut dispatcher = Dispatcher::new();
        dispatcher.register(SAFETY_FATAL_TOPIC, handler);

        let tasks: Vec<_> = (0..4)
            .map(|_| dispatcher.dispatch(SAFETY_FATAL_TOPIC, String::new()).unwrap())
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(service.peak.load(Ordering::SeqCst), 1);
        assert_eq!(publisher.messages().len(), 4);
    }
}
