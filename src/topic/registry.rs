//! Subscription Registry — maps event names to the live subscriptions that
//! listen for them, on a single topic.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};

use serde_json::Value;

use super::ack::Ack;
use super::error::SubscriberError;
use super::metadata::Metadata;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// A two-argument subscriber: receives the payload and metadata, and
/// produces an outcome directly. Used by `emit`, `publish`, and `execute`.
pub type BasicFn =
    Arc<dyn Fn(Value, Metadata) -> BoxFuture<Result<Value, SubscriberError>> + Send + Sync>;

/// A three-argument subscriber: receives the payload, metadata, and an
/// acknowledgment continuation. The subscriber's own return value is
/// ignored — only calling `ack` determines the outcome. Used by `deliver`.
pub type AckFn = Arc<dyn Fn(Value, Metadata, Ack) -> BoxFuture<()> + Send + Sync>;

/// The two subscriber shapes a registration can take (spec.md §9: represent
/// arity as distinct variants rather than reflecting on function arity).
#[derive(Clone)]
pub enum Handler {
    Basic(BasicFn),
    Ack(AckFn),
}

/// A single subscription: the event names it listens to, its handler, and
/// its unique identifier.
#[derive(Clone)]
pub struct Subscription {
    pub id: String,
    pub events: Vec<String>,
    pub handler: Handler,
}

/// Stores subscriptions and answers "which subscriptions listen to event
/// name E?" in O(matching count).
///
/// Registration order is preserved per event name, so dispatch order (and
/// therefore `results` order) is stable regardless of concurrent handler
/// completion.
#[derive(Default)]
pub struct Registry {
    by_event: HashMap<String, Vec<Arc<Subscription>>>,
    by_id: HashMap<String, Arc<Subscription>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one subscription bound to one or more event names.
    /// Returns the subscription's identifier.
    pub fn add(&mut self, events: Vec<String>, handler: Handler) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let subscription = Arc::new(Subscription {
            id: id.clone(),
            events: events.clone(),
            handler,
        });

        for event in &events {
            self.by_event
                .entry(event.clone())
                .or_default()
                .push(subscription.clone());
        }
        self.by_id.insert(id.clone(), subscription);
        id
    }

    /// Remove the subscription with the given identifier from every event
    /// name it was registered for. Idempotent; returns whether anything was
    /// removed.
    pub fn remove(&mut self, subscription_id: &str) -> bool {
        let Some(subscription) = self.by_id.remove(subscription_id) else {
            return false;
        };
        for event in &subscription.events {
            if let Some(subs) = self.by_event.get_mut(event) {
                subs.retain(|s| s.id != subscription_id);
            }
        }
        true
    }

    /// Subscriptions listening to `event`, in registration order.
    pub fn matching(&self, event: &str) -> Vec<Arc<Subscription>> {
        self.by_event.get(event).cloned().unwrap_or_default()
    }
}

/// Thread-safe handle to a topic's registry, shared across clones of `Topic`.
#[derive(Clone, Default)]
pub struct SharedRegistry {
    inner: Arc<RwLock<Registry>>,
}

impl SharedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, events: Vec<String>, handler: Handler) -> String {
        self.inner.write().unwrap().add(events, handler)
    }

    pub fn remove(&self, subscription_id: &str) -> bool {
        self.inner.write().unwrap().remove(subscription_id)
    }

    /// Frozen snapshot of the subscriptions matching `event` at this instant.
    /// Subscribe/unsubscribe calls made by a handler mid-dispatch only affect
    /// snapshots taken by future calls.
    pub fn matching(&self, event: &str) -> Vec<Arc<Subscription>> {
        self.inner.read().unwrap().matching(event)
    }
}
