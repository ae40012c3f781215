//! The acknowledgment continuation and timeout state machine used by
//! `deliver` (spec.md §4.3.1).
//!
//! Each subscription gets a single-shot slot: whichever of "the subscriber
//! calls `ack`" or "the timer elapses" happens first wins, and any later
//! write is a no-op. This is the re-architected form of the source's
//! continuation-style `ack(err, value)` callback — a channel with a
//! single send, raced against a timer, rather than a reflected callback.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::oneshot;

use super::error::SubscriberError;
use super::outcome::SubscriberOutcome;

/// The acknowledgment continuation passed to a `deliver` subscriber.
///
/// Calling `ack` (via [`Ack::ack`], [`Ack::fulfill`], or [`Ack::reject`])
/// more than once is a no-op after the first call — later calls are
/// silently dropped, matching the "idempotent in any terminal state"
/// invariant.
#[derive(Clone)]
pub struct Ack {
    slot: Arc<Mutex<Option<oneshot::Sender<SubscriberOutcome>>>>,
}

impl Ack {
    /// `ack(err, value)` as specified: a non-null `err` rejects, otherwise
    /// the subscription fulfills with `value` (defaulting to `Value::Null`).
    pub fn ack(&self, err: Option<SubscriberError>, value: Option<Value>) {
        let outcome = match err {
            Some(error) => SubscriberOutcome::Rejected(error),
            None => SubscriberOutcome::Fulfilled(value.unwrap_or(Value::Null)),
        };
        self.settle(outcome);
    }

    /// Convenience for `ack(None, Some(value))`.
    pub fn fulfill(&self, value: Value) {
        self.settle(SubscriberOutcome::Fulfilled(value));
    }

    /// Convenience for `ack(Some(error), None)`.
    pub fn reject(&self, error: SubscriberError) {
        self.settle(SubscriberOutcome::Rejected(error));
    }

    /// An `Ack` with no one listening, for `emit`'s fire-and-forget
    /// dispatch to ack-shaped subscribers: acknowledging is accepted but
    /// has nowhere to go.
    pub(crate) fn detached() -> Ack {
        let (tx, rx) = oneshot::channel();
        drop(rx);
        Ack {
            slot: Arc::new(Mutex::new(Some(tx))),
        }
    }

    fn settle(&self, outcome: SubscriberOutcome) {
        if let Some(sender) = self.slot.lock().unwrap().take() {
            // The receiver may already be gone (e.g. the timeout fired
            // first); that is exactly the no-op case this models.
            let _ = sender.send(outcome);
        }
    }
}

/// A single subscription's state machine, armed before its handler runs.
pub(crate) struct AckMachine {
    slot: Arc<Mutex<Option<oneshot::Sender<SubscriberOutcome>>>>,
    receiver: oneshot::Receiver<SubscriberOutcome>,
}

impl AckMachine {
    /// Arm the machine. The returned `Ack` must be handed to the subscriber
    /// before it starts running, so a synchronous throw-before-ack never
    /// races the machine's own construction.
    pub fn arm() -> (Ack, Self) {
        let (tx, rx) = oneshot::channel();
        let slot = Arc::new(Mutex::new(Some(tx)));
        let ack = Ack { slot: slot.clone() };
        (ack, AckMachine { slot, receiver: rx })
    }

    /// Used outside `deliver`, where there is no deadline: take whatever
    /// outcome the subscriber already acknowledged, or default to fulfilled
    /// with a null value if its handler finished without acknowledging.
    pub fn try_outcome_or_default(mut self) -> SubscriberOutcome {
        self.receiver
            .try_recv()
            .unwrap_or(SubscriberOutcome::Fulfilled(Value::Null))
    }

    /// Wait for the subscriber to acknowledge, or for `timeout` to elapse,
    /// whichever comes first. The timer is released deterministically on
    /// every exit path: `tokio::time::timeout` cancels its internal sleep
    /// when the receiver resolves first, and dropping the receiver on a
    /// timeout drops the sender, which makes any later `ack` call a no-op.
    pub async fn await_outcome(
        self,
        timeout: std::time::Duration,
        topic: &str,
        event: &str,
    ) -> SubscriberOutcome {
        match tokio::time::timeout(timeout, self.receiver).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => {
                // Sender dropped without sending: treat as fulfilled with
                // no value rather than silently hanging — the sender can
                // only be dropped by code holding the sole outstanding
                // clone of the slot, i.e. this machine itself on drop.
                SubscriberOutcome::Fulfilled(Value::Null)
            }
            Err(_) => {
                // Timer elapsed while still pending. Drop our slot clone so
                // a subsequent ack() finds no sender and is a no-op.
                drop(self.slot);
                SubscriberOutcome::Rejected(SubscriberError::Timeout {
                    topic: topic.to_string(),
                    event: event.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }
}
