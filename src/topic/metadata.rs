//! Metadata Builder — constructs the per-publication metadata bundle that
//! threads through all four delivery disciplines (spec.md §4.2).

use serde::Serialize;
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};

/// Keys the bus itself controls; producer overrides for these are dropped —
/// the bus value always wins.
const AUTHORITATIVE_KEYS: [&str; 4] = ["id", "time", "topic", "event"];

/// Immutable per-publication metadata, shared by every subscriber of one
/// call.
///
/// `subscription_id` is only populated on the copy handed to a subscriber
/// (see [`Metadata::for_subscriber`]); the copy returned to the producer
/// always has it unset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub id: String,
    pub time: i64,
    pub topic: String,
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Metadata {
    /// Build a fresh metadata bundle for one publication.
    ///
    /// `overrides` is a producer-supplied JSON object merged into `extra`.
    /// Keys named `id`, `time`, `topic`, or `event` are silently dropped
    /// from the merge — those fields are bus-authoritative.
    pub(crate) fn build(topic: &str, event: &str, overrides: Option<Value>) -> Metadata {
        let time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);

        let mut extra = Map::new();
        if let Some(Value::Object(map)) = overrides {
            for (key, value) in map {
                if !AUTHORITATIVE_KEYS.contains(&key.as_str()) {
                    extra.insert(key, value);
                }
            }
        }

        Metadata {
            id: uuid::Uuid::new_v4().to_string(),
            time,
            topic: topic.to_string(),
            event: event.to_string(),
            subscription_id: None,
            extra,
        }
    }

    /// The per-subscriber copy: identical fields, with `subscription_id`
    /// set. Does not mutate the shared bundle.
    pub(crate) fn for_subscriber(&self, subscription_id: &str) -> Metadata {
        Metadata {
            subscription_id: Some(subscription_id.to_string()),
            ..self.clone()
        }
    }
}
