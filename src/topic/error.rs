//! Error taxonomy for `Topic` dispatch.

use std::fmt;

use super::metadata::Metadata;
use super::outcome::SubscriberOutcome;

/// An error raised by a subscriber handler under any discipline, or by the
/// acknowledgment machine when a `deliver` subscription times out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriberError {
    /// The handler returned or acknowledged an application-level error.
    Failed(String),
    /// A `deliver` subscription did not acknowledge within the topic's
    /// configured timeout.
    Timeout {
        topic: String,
        event: String,
        timeout_ms: u64,
    },
}

impl fmt::Display for SubscriberError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriberError::Failed(message) => write!(f, "{}", message),
            SubscriberError::Timeout {
                topic,
                event,
                timeout_ms,
            } => write!(
                f,
                "subscriber on topic '{}' did not acknowledge event '{}' within {}ms",
                topic, event, timeout_ms
            ),
        }
    }
}

impl std::error::Error for SubscriberError {}

impl From<&str> for SubscriberError {
    fn from(message: &str) -> Self {
        SubscriberError::Failed(message.to_string())
    }
}

impl From<String> for SubscriberError {
    fn from(message: String) -> Self {
        SubscriberError::Failed(message)
    }
}

/// Top-level error returned by `Topic` operations.
#[derive(Debug, Clone, PartialEq)]
pub enum TopicError {
    /// `subscribe` was called with an empty event-name list.
    InvalidInput(String),
    /// `execute` failed because at least one subscriber rejected.
    AggregateExecutionFailure {
        results: Vec<SubscriberOutcome>,
        meta: Metadata,
    },
}

impl fmt::Display for TopicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopicError::InvalidInput(message) => write!(f, "invalid input: {}", message),
            TopicError::AggregateExecutionFailure { results, meta } => {
                let failed = results
                    .iter()
                    .filter(|r| matches!(r, SubscriberOutcome::Rejected(_)))
                    .count();
                write!(
                    f,
                    "execute of '{}' on topic '{}' failed: {} of {} subscribers rejected",
                    meta.event,
                    meta.topic,
                    failed,
                    results.len()
                )
            }
        }
    }
}

impl std::error::Error for TopicError {}
