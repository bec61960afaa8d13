//! Dumper Core
//!
//! Core types shared by the log dumper agent and its pub/sub client.
//!
//! This crate contains:
//! - Domain types: dump requests, results and the well-known topics
//! - DTOs: wire envelopes exchanged with the pub/sub sidecar

pub mod domain;
pub mod dto;
