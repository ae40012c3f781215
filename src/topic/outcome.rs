//! Outcome envelope returned by the four delivery disciplines.

use serde_json::Value;

use super::error::SubscriberError;
use super::metadata::Metadata;

/// A single subscriber's result for `publish`, `execute`, and `deliver`.
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriberOutcome {
    Fulfilled(Value),
    Rejected(SubscriberError),
}

impl SubscriberOutcome {
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, SubscriberOutcome::Fulfilled(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, SubscriberOutcome::Rejected(_))
    }
}

/// The producer-visible result of a dispatch call.
///
/// `results` is `None` for `emit` (fire-and-forget) and `Some` — in
/// registration order over the matched snapshot — for `publish`, `execute`,
/// and `deliver`.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub count: usize,
    pub meta: Metadata,
    pub results: Option<Vec<SubscriberOutcome>>,
}
