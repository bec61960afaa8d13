//! Service layer
//!
//! Services contain the business logic of the agent. They do not know which
//! transport delivered the trigger or where the result goes.
//!
//! All services are trait-based to enable testing and dependency injection.

mod dump;

// Re-export traits
pub use dump::DumpService;

// Re-export implementations
pub use dump::{DumpError, DumpReport, FsDumpService};
