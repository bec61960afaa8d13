//! Data Transfer Objects exchanged with the pub/sub sidecar

pub mod event;
