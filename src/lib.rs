//! An in-process asynchronous event bus.
//!
//! A producer publishes named events to a logical channel (a [`Topic`]);
//! subscribers registered on that topic receive them under one of four
//! delivery disciplines that differ in the producer's synchronization
//! contract with subscribers:
//!
//! - [`Topic::emit`] — fire-and-forget.
//! - [`Topic::publish`] — await all subscribers, aggregate outcomes.
//! - [`Topic::execute`] — await all subscribers, fail atomically if any
//!   rejected.
//! - [`Topic::deliver`] — await per-subscriber acknowledgment, racing each
//!   one against a configured timeout.
//!
//! A second, independent facility is [`wildcard::WildcardEmitter`], a
//! hierarchical-name emitter that dispatches by namespace prefix and
//! surfaces unhandled events.
//!
//! This crate has no durability, no cross-process transport, and no
//! delivery guarantees across restarts — it is purely an in-process
//! primitive.

pub mod topic;
pub mod wildcard;

pub use topic::{
    Ack, Metadata, Outcome, SubscriberError, SubscriberOutcome, Topic, TopicConfig, TopicError,
};
pub use wildcard::{WildcardConfig, WildcardEmitter, WildcardError};
