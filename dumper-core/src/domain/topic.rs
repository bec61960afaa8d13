//! Well-known topics and filesystem locations

/// Inbound topic: a fatal safety condition was raised
pub const SAFETY_FATAL_TOPIC: &str = "safety/fatal";

/// Outbound topic carrying the dump result
pub const DUMPER_RESPONSE_TOPIC: &str = "dumper/dump";

/// Directory the logs are read from
pub const DEFAULT_LOG_PATH: &str = "/data/logs";

/// Directory the logs are dumped into
pub const DEFAULT_DUMP_PATH: &str = "/data/dump";
