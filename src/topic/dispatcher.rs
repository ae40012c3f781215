//! The four delivery disciplines, dispatched against a snapshot of the
//! Subscription Registry (spec.md §4.3).
//!
//! All four resolve the matching subscriptions *before* running any
//! handler, so a handler that subscribes or unsubscribes mid-dispatch
//! never changes the recipient set for the call already in flight
//! (spec.md §5, "snapshot isolation").

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use super::ack::{Ack, AckMachine};
use super::error::TopicError;
use super::metadata::Metadata;
use super::outcome::{Outcome, SubscriberOutcome};
use super::registry::{Handler, SharedRegistry, Subscription};

/// Fire-and-forget: schedule every matching handler to run concurrently and
/// return immediately. Handler errors are swallowed — they must not
/// propagate to the producer.
pub(crate) async fn emit(
    registry: &SharedRegistry,
    topic: &str,
    event: &str,
    payload: Value,
    overrides: Option<Value>,
) -> Outcome {
    let meta = Metadata::build(topic, event, overrides);
    let snapshot = registry.matching(event);
    let count = snapshot.len();

    tracing::debug!(topic, event, count, "emit: dispatching");

    for subscription in snapshot {
        let payload = payload.clone();
        let sub_meta = meta.for_subscriber(&subscription.id);
        let topic = topic.to_string();
        tokio::spawn(run_emit_one(subscription, payload, sub_meta, topic));
    }

    Outcome {
        count,
        meta,
        results: None,
    }
}

async fn run_emit_one(subscription: Arc<Subscription>, payload: Value, meta: Metadata, topic: String) {
    match &subscription.handler {
        Handler::Basic(handler) => {
            if let Err(error) = handler(payload, meta).await {
                tracing::warn!(
                    topic,
                    subscription = %subscription.id,
                    %error,
                    "emit: subscriber error swallowed"
                );
            }
        }
        Handler::Ack(handler) => {
            handler(payload, meta, Ack::detached()).await;
        }
    }
}

/// Await all handlers, aggregating each one's outcome independently. The
/// call resolves even if every handler rejected.
pub(crate) async fn publish(
    registry: &SharedRegistry,
    topic: &str,
    event: &str,
    payload: Value,
    overrides: Option<Value>,
) -> Outcome {
    let meta = Metadata::build(topic, event, overrides);
    let snapshot = registry.matching(event);
    let count = snapshot.len();

    tracing::debug!(topic, event, count, "publish: dispatching");

    let results = run_all(snapshot, payload, &meta).await;

    Outcome {
        count,
        meta,
        results: Some(results),
    }
}

/// Identical dispatch to `publish`; fails the call if any subscriber
/// rejected, carrying the full `results` for diagnosis.
pub(crate) async fn execute(
    registry: &SharedRegistry,
    topic: &str,
    event: &str,
    payload: Value,
    overrides: Option<Value>,
) -> Result<Outcome, TopicError> {
    let meta = Metadata::build(topic, event, overrides);
    let snapshot = registry.matching(event);
    let count = snapshot.len();

    tracing::debug!(topic, event, count, "execute: dispatching");

    let results = run_all(snapshot, payload, &meta).await;

    if results.iter().any(SubscriberOutcome::is_rejected) {
        return Err(TopicError::AggregateExecutionFailure { results, meta });
    }

    Ok(Outcome {
        count,
        meta,
        results: Some(results),
    })
}

async fn run_all(
    snapshot: Vec<Arc<Subscription>>,
    payload: Value,
    meta: &Metadata,
) -> Vec<SubscriberOutcome> {
    let futures = snapshot.into_iter().map(|subscription| {
        let payload = payload.clone();
        let sub_meta = meta.for_subscriber(&subscription.id);
        run_basic_one(subscription, payload, sub_meta)
    });
    futures::future::join_all(futures).await
}

async fn run_basic_one(
    subscription: Arc<Subscription>,
    payload: Value,
    meta: Metadata,
) -> SubscriberOutcome {
    match &subscription.handler {
        Handler::Basic(handler) => match handler(payload, meta).await {
            Ok(value) => SubscriberOutcome::Fulfilled(value),
            Err(error) => SubscriberOutcome::Rejected(error),
        },
        Handler::Ack(handler) => {
            let (ack, machine) = AckMachine::arm();
            handler(payload, meta, ack).await;
            machine.try_outcome_or_default()
        }
    }
}

/// Await per-subscription acknowledgment, racing each subscription's
/// outcome against the topic's configured timeout.
pub(crate) async fn deliver(
    registry: &SharedRegistry,
    topic: &str,
    event: &str,
    payload: Value,
    overrides: Option<Value>,
    timeout: Duration,
) -> Outcome {
    let meta = Metadata::build(topic, event, overrides);
    let snapshot = registry.matching(event);
    let count = snapshot.len();

    tracing::debug!(topic, event, count, timeout_ms = timeout.as_millis() as u64, "deliver: dispatching");

    let futures = snapshot.into_iter().map(|subscription| {
        let payload = payload.clone();
        let sub_meta = meta.for_subscriber(&subscription.id);
        run_deliver_one(subscription, payload, sub_meta, topic.to_string(), event.to_string(), timeout)
    });
    let results = futures::future::join_all(futures).await;

    Outcome {
        count,
        meta,
        results: Some(results),
    }
}

async fn run_deliver_one(
    subscription: Arc<Subscription>,
    payload: Value,
    meta: Metadata,
    topic: String,
    event: String,
    timeout: Duration,
) -> SubscriberOutcome {
    let (ack, machine) = AckMachine::arm();

    match &subscription.handler {
        Handler::Ack(handler) => {
            tokio::spawn(handler(payload, meta, ack));
        }
        Handler::Basic(handler) => {
            // A two-argument subscriber has no way to acknowledge; under
            // `deliver` it still runs (for its side effects) but can only
            // ever time out, since only `ack` contributes to the result.
            let fut = handler(payload, meta);
            tokio::spawn(async move {
                let _ = fut.await;
            });
        }
    }

    let outcome = machine.await_outcome(timeout, &topic, &event).await;
    if let SubscriberOutcome::Rejected(super::error::SubscriberError::Timeout { .. }) = &outcome {
        tracing::warn!(topic, event, subscription = %subscription.id, "deliver: subscriber timed out");
    }
    outcome
}
