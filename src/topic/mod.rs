//! `Topic` — a named dispatch channel with four delivery disciplines.
//!
//! ## Example
//!
//! ```
//! use async_event_bus::topic::{Topic, TopicConfig};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let topic = Topic::new(TopicConfig::new("logger"));
//!
//! topic
//!     .subscribe(["info"], |_payload, _meta| async move { Ok(json!(true)) })
//!     .unwrap();
//!
//! let outcome = topic.publish("info", json!("hi"), None).await;
//! assert_eq!(outcome.count, 1);
//! # }
//! ```

mod ack;
mod dispatcher;
mod error;
mod metadata;
mod outcome;
mod registry;

pub use ack::Ack;
pub use error::{SubscriberError, TopicError};
pub use metadata::Metadata;
pub use outcome::{Outcome, SubscriberOutcome};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use registry::{BoxFuture, Handler, SharedRegistry};

/// Default acknowledgment timeout for `deliver`, per spec.md §3.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(3000);

/// Configuration for a [`Topic`].
#[derive(Debug, Clone)]
pub struct TopicConfig {
    pub topic: String,
    pub timeout: Duration,
}

impl TopicConfig {
    /// A topic configuration with the default 3000ms acknowledgment
    /// timeout.
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the acknowledgment timeout used by `deliver`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// A named dispatch channel. Owns a Subscription Registry and a configured
/// default acknowledgment timeout (spec.md §3).
///
/// `Topic` is cheap to clone — clones share the same underlying registry,
/// so a topic can be handed to multiple tasks without an outer `Arc`.
#[derive(Clone)]
pub struct Topic {
    name: Arc<str>,
    timeout: Duration,
    registry: SharedRegistry,
}

impl Topic {
    /// Create a new topic from the given configuration.
    pub fn new(config: TopicConfig) -> Self {
        Self {
            name: Arc::from(config.topic.as_str()),
            timeout: config.timeout,
            registry: SharedRegistry::new(),
        }
    }

    /// The topic's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a two-argument subscriber (payload, metadata) on one or
    /// more event names. Used by `emit`, `publish`, and `execute`.
    ///
    /// Returns `Err(TopicError::InvalidInput)` if `events` is empty.
    pub fn subscribe<I, S, F, Fut>(&self, events: I, handler: F) -> Result<String, TopicError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(Value, Metadata) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, SubscriberError>> + Send + 'static,
    {
        let events = to_event_names(events)?;
        let handler: registry::BasicFn = Arc::new(move |payload, meta| {
            Box::pin(handler(payload, meta)) as BoxFuture<Result<Value, SubscriberError>>
        });
        Ok(self.registry.add(events, Handler::Basic(handler)))
    }

    /// Register a three-argument subscriber (payload, metadata, ack) for
    /// `deliver`. The subscriber's own return value is ignored — only
    /// calling `ack` determines its per-call outcome.
    ///
    /// Returns `Err(TopicError::InvalidInput)` if `events` is empty.
    pub fn subscribe_ack<I, S, F, Fut>(&self, events: I, handler: F) -> Result<String, TopicError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(Value, Metadata, Ack) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let events = to_event_names(events)?;
        let handler: registry::AckFn =
            Arc::new(move |payload, meta, ack| Box::pin(handler(payload, meta, ack)) as BoxFuture<()>);
        Ok(self.registry.add(events, Handler::Ack(handler)))
    }

    /// Remove a subscription by identifier. Idempotent; returns whether
    /// anything was removed. A subscription may safely call this with its
    /// own `subscription_id` from inside its handler.
    pub fn unsubscribe(&self, subscription_id: &str) -> bool {
        self.registry.remove(subscription_id)
    }

    /// Fire-and-forget: schedules matching handlers and returns
    /// immediately. Handler errors never propagate to the caller.
    pub async fn emit(&self, event: &str, payload: Value, overrides: Option<Value>) -> Outcome {
        dispatcher::emit(&self.registry, &self.name, event, payload, overrides).await
    }

    /// Await all matching handlers, aggregating each one's outcome. The
    /// call resolves even if every handler rejected.
    pub async fn publish(&self, event: &str, payload: Value, overrides: Option<Value>) -> Outcome {
        dispatcher::publish(&self.registry, &self.name, event, payload, overrides).await
    }

    /// Identical dispatch to `publish`, but fails if any handler rejected.
    pub async fn execute(
        &self,
        event: &str,
        payload: Value,
        overrides: Option<Value>,
    ) -> Result<Outcome, TopicError> {
        dispatcher::execute(&self.registry, &self.name, event, payload, overrides).await
    }

    /// Await per-subscriber acknowledgment, racing each subscription
    /// against this topic's configured timeout.
    pub async fn deliver(&self, event: &str, payload: Value, overrides: Option<Value>) -> Outcome {
        dispatcher::deliver(
            &self.registry,
            &self.name,
            event,
            payload,
            overrides,
            self.timeout,
        )
        .await
    }
}

fn to_event_names<I, S>(events: I) -> Result<Vec<String>, TopicError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let events: Vec<String> = events.into_iter().map(Into::into).collect();
    if events.is_empty() {
        return Err(TopicError::InvalidInput(
            "subscribe requires at least one event name".to_string(),
        ));
    }
    Ok(events)
}
