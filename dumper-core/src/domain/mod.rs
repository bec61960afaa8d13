//! Domain types
//!
//! Core entities of the dumper. These types carry no I/O and are shared
//! between the agent and any tooling that consumes its results.

pub mod dump;
pub mod topic;
