//! Event API Handlers
//!
//! The sidecar asks which topics the agent wants, then pushes each message on
//! those topics to `/events/<topic>`. The message body is handed to the
//! topic's handler untouched.

use axum::{
    Json,
    extract::{Path, State},
};
use dumper_core::dto::event::{EventAck, Subscription};

use crate::api::error::ApiResult;
use crate::api::{AppState, EVENTS_ROUTE};

/// GET /dapr/subscribe
/// Subscriptions for every topic with a registered handler
pub async fn list_subscriptions(State(state): State<AppState>) -> Json<Vec<Subscription>> {
    let subscriptions = state
        .dispatcher
        .topics()
        .map(|topic| Subscription {
            pubsubname: state.pubsub_name.clone(),
            topic: topic.to_string(),
            route: format!("{}/{}", EVENTS_ROUTE, topic),
        })
        .collect();

    Json(subscriptions)
}

/// POST /events/{*topic}
/// Deliver one message; acknowledged as soon as its handler task is started
pub async fn receive_event(
    State(state): State<AppState>,
    Path(topic): Path<String>,
    body: String,
) -> ApiResult<Json<EventAck>> {
    tracing::debug!("Received event on {}", topic);

    // The handler task runs detached; its outcome is reported on its own topic
    state.dispatcher.dispatch(&topic, body)?;

    Ok(Json(EventAck::success()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::ApiError;
    use crate::dispatch::{Dispatcher, EventHandler};
    use async_trait::async_trait;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    struct Forward(mpsc::UnboundedSender<String>);

    #[async_trait]
    impl EventHandler for Forward {
        async fn handle(&self, payload: String) {
            let _ = self.0.send(payload);
        }
    }

    fn state_with(topic: &str) -> (AppState, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(topic, Arc::new(Forward(tx)));
        let state = AppState {
            dispatcher: Arc::new(dispatcher),
            pubsub_name: "mqtt-pubsub".to_string(),
        };
        (state, rx)
    }

    #[tokio::test]
    async fn test_subscriptions_cover_registered_topics() {
        let (state, _rx) = state_with("safety/fatal");

        let Json(subscriptions) = list_subscriptions(State(state)).await;

        assert_eq!(
            subscriptions,
            vec![Subscription {
                pubsubname: "mqtt-pubsub".to_string(),
                topic: "safety/fatal".to_string(),
                route: "/events/safety/fatal".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_event_is_dispatched_and_acknowledged() {
        let (state, mut rx) = state_with("safety/fatal");

        let Json(ack) = receive_event(
            State(state),
            Path("safety/fatal".to_string()),
            r#"{"data":"boom"}"#.to_string(),
        )
        .await
        .unwrap();

        assert_eq!(ack, EventAck::success());
        assert_eq!(rx.recv().await.unwrap(), r#"{"data":"boom"}"#);
    }

    #[tokio::test]
    async fn test_unknown_topic_is_not_found() {
        let (state, _rx) = state_with("safety/fatal");

        let result = receive_event(
            State(state),
            Path("safety/other".to_string()),
            String::new(),
        )
        .await;

        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }
}
