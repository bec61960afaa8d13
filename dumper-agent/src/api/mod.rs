//! API Module
//!
//! HTTP API the pub/sub sidecar talks to:
//! - subscription discovery at startup
//! - push delivery of every message on a subscribed topic

pub mod error;
pub mod events;
pub mod health;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::dispatch::Dispatcher;

/// Route prefix under which topics are delivered
pub const EVENTS_ROUTE: &str = "/events";

/// Shared state of the API handlers
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub pubsub_name: String,
}

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Sidecar contract
        .route("/dapr/subscribe", get(events::list_subscriptions))
        .route("/events/{*topic}", post(events::receive_event))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
