//! End-to-end scenarios for `Topic`'s four delivery disciplines.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_event_bus::{SubscriberError, SubscriberOutcome, Topic, TopicConfig, TopicError};
use serde_json::json;

/// Installs a `tracing` subscriber so `tracing::debug!`/`warn!` output from
/// the dispatcher is observable when running tests with `--nocapture`.
/// `try_init` tolerates being called from more than one test in this binary.
fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// S1: one subscriber, `publish` resolves with its fulfilled outcome.
#[tokio::test]
async fn s1_single_subscriber_fulfills() {
    init_tracing();
    let topic = Topic::new(TopicConfig::new("logger"));
    topic
        .subscribe(["info"], |_payload, _meta| async move { Ok(json!(true)) })
        .unwrap();

    let outcome = topic.publish("info", json!("hi"), None).await;

    assert_eq!(outcome.count, 1);
    assert_eq!(outcome.meta.topic, "logger");
    assert_eq!(outcome.meta.event, "info");
    assert!(outcome.meta.subscription_id.is_none());
    assert_eq!(
        outcome.results.unwrap(),
        vec![SubscriberOutcome::Fulfilled(json!(true))]
    );
}

/// S2: two subscribers, one throws — both results present, order preserved.
#[tokio::test]
async fn s2_one_subscriber_fails_other_unaffected() {
    let topic = Topic::new(TopicConfig::new("logger"));
    topic
        .subscribe(["info"], |_payload, _meta| async move { Ok(json!(true)) })
        .unwrap();
    topic
        .subscribe(["info"], |_payload, _meta| async move {
            Err(SubscriberError::from("BOOM!"))
        })
        .unwrap();

    let outcome = topic.publish("info", json!("hi"), None).await;
    let results = outcome.results.unwrap();

    assert_eq!(outcome.count, 2);
    assert_eq!(results.len(), 2);
    assert_eq!(results[0], SubscriberOutcome::Fulfilled(json!(true)));
    assert_eq!(
        results[1],
        SubscriberOutcome::Rejected(SubscriberError::from("BOOM!"))
    );
}

/// S3: same subscribers as S2, but `execute` fails with an aggregate error.
#[tokio::test]
async fn s3_execute_fails_on_any_rejection() {
    let topic = Topic::new(TopicConfig::new("logger"));
    topic
        .subscribe(["info"], |_payload, _meta| async move { Ok(json!(true)) })
        .unwrap();
    topic
        .subscribe(["info"], |_payload, _meta| async move {
            Err(SubscriberError::from("BOOM!"))
        })
        .unwrap();

    let err = topic.execute("info", json!("hi"), None).await.unwrap_err();

    match err {
        TopicError::AggregateExecutionFailure { results, meta } => {
            assert_eq!(meta.event, "info");
            assert_eq!(results.len(), 2);
            assert!(results[0].is_fulfilled());
            assert!(results[1].is_rejected());
        }
        other => panic!("expected AggregateExecutionFailure, got {:?}", other),
    }
}

/// execute succeeds, with the same shape as publish, when nothing rejected.
#[tokio::test]
async fn execute_succeeds_when_all_fulfill() {
    let topic = Topic::new(TopicConfig::new("logger"));
    topic
        .subscribe(["info"], |_payload, _meta| async move { Ok(json!(1)) })
        .unwrap();
    topic
        .subscribe(["info"], |_payload, _meta| async move { Ok(json!(2)) })
        .unwrap();

    let outcome = topic.execute("info", json!("hi"), None).await.unwrap();
    assert_eq!(outcome.count, 2);
    assert_eq!(outcome.results.unwrap().len(), 2);
}

/// S4 (ack branch): a subscriber that acks quickly fulfills well within the
/// configured timeout.
#[tokio::test]
async fn s4_ack_before_timeout_fulfills() {
    let topic = Topic::new(TopicConfig::new("logger").with_timeout(Duration::from_millis(50)));
    topic
        .subscribe_ack(["info"], |_payload, _meta, ack| async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            ack.fulfill(json!(true));
        })
        .unwrap();

    let outcome = topic.deliver("info", json!("hi"), None).await;

    assert_eq!(
        outcome.results.unwrap(),
        vec![SubscriberOutcome::Fulfilled(json!(true))]
    );
}

/// S4 (timeout branch): a subscriber that never acks rejects with a timeout.
#[tokio::test]
async fn s4_never_acking_subscriber_times_out() {
    init_tracing();
    let topic = Topic::new(TopicConfig::new("logger").with_timeout(Duration::from_millis(50)));
    topic
        .subscribe_ack(["info"], |_payload, _meta, _ack| async move {
            // Deliberately never calls ack.
        })
        .unwrap();

    let start = std::time::Instant::now();
    let outcome = topic.deliver("info", json!("hi"), None).await;
    let elapsed = start.elapsed();

    let results = outcome.results.unwrap();
    assert_eq!(results.len(), 1);
    assert!(matches!(
        &results[0],
        SubscriberOutcome::Rejected(SubscriberError::Timeout { .. })
    ));
    assert!(elapsed >= Duration::from_millis(45));
}

/// deliver: explicit ack(err, _) rejects.
#[tokio::test]
async fn deliver_ack_with_error_rejects() {
    let topic = Topic::new(TopicConfig::new("logger").with_timeout(Duration::from_millis(100)));
    topic
        .subscribe_ack(["info"], |_payload, _meta, ack| async move {
            ack.ack(Some(SubscriberError::from("nope")), None);
        })
        .unwrap();

    let outcome = topic.deliver("info", json!("hi"), None).await;
    assert_eq!(
        outcome.results.unwrap(),
        vec![SubscriberOutcome::Rejected(SubscriberError::from("nope"))]
    );
}

/// Property 8: a second ack call in a terminal state changes nothing
/// observable.
#[tokio::test]
async fn deliver_second_ack_is_noop() {
    let topic = Topic::new(TopicConfig::new("logger").with_timeout(Duration::from_millis(100)));
    topic
        .subscribe_ack(["info"], |_payload, _meta, ack| async move {
            ack.fulfill(json!(1));
            ack.fulfill(json!(2));
            ack.ack(Some(SubscriberError::from("late")), None);
        })
        .unwrap();

    let outcome = topic.deliver("info", json!("hi"), None).await;
    assert_eq!(
        outcome.results.unwrap(),
        vec![SubscriberOutcome::Fulfilled(json!(1))]
    );
}

/// Property 2: every subscriber sees the same id/time/topic/event, and its
/// own subscription_id.
#[tokio::test]
async fn all_subscribers_share_one_metadata_bundle() {
    let topic = Topic::new(TopicConfig::new("logger"));
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sub_a = {
        let seen = seen.clone();
        topic
            .subscribe(["info"], move |_payload, meta| {
                let seen = seen.clone();
                async move {
                    seen.lock().unwrap().push(meta);
                    Ok(json!(null))
                }
            })
            .unwrap()
    };
    let sub_b = {
        let seen = seen.clone();
        topic
            .subscribe(["info"], move |_payload, meta| {
                let seen = seen.clone();
                async move {
                    seen.lock().unwrap().push(meta);
                    Ok(json!(null))
                }
            })
            .unwrap()
    };

    topic.publish("info", json!("hi"), None).await;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].id, seen[1].id);
    assert_eq!(seen[0].time, seen[1].time);
    assert_eq!(seen[0].topic, "logger");
    assert_eq!(seen[0].event, "info");
    let ids: Vec<&str> = seen.iter().map(|m| m.subscription_id.as_deref().unwrap()).collect();
    assert!(ids.contains(&sub_a.as_str()));
    assert!(ids.contains(&sub_b.as_str()));
}

/// Property 4: overrides merge, except for bus-authoritative keys.
#[tokio::test]
async fn overrides_merge_except_authoritative_keys() {
    let topic = Topic::new(TopicConfig::new("logger"));
    topic
        .subscribe(["info"], |_payload, _meta| async move { Ok(json!(null)) })
        .unwrap();

    let overrides = json!({ "topic": "spoofed", "user": "alice" });
    let outcome = topic.publish("info", json!("hi"), Some(overrides)).await;

    assert_eq!(outcome.meta.topic, "logger");
    assert_eq!(outcome.meta.extra.get("user"), Some(&json!("alice")));
}

/// Property 9: a handler that unsubscribes itself mid-dispatch is still
/// counted for the in-flight call, and absent from the next one.
#[tokio::test]
async fn snapshot_isolation_across_self_unsubscribe() {
    let topic = Topic::new(TopicConfig::new("logger"));
    let calls = Arc::new(AtomicUsize::new(0));

    let topic_for_handler = topic.clone();
    let calls_for_handler = calls.clone();
    topic
        .subscribe(["info"], move |_payload, meta| {
            let topic = topic_for_handler.clone();
            let calls = calls_for_handler.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                topic.unsubscribe(meta.subscription_id.as_deref().unwrap());
                Ok(json!(null))
            }
        })
        .unwrap();

    let first = topic.publish("info", json!("hi"), None).await;
    assert_eq!(first.count, 1);

    let second = topic.publish("info", json!("hi"), None).await;
    assert_eq!(second.count, 0);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

/// subscribe with an empty event list is rejected synchronously.
#[test]
fn subscribe_with_no_events_is_invalid() {
    let topic = Topic::new(TopicConfig::new("logger"));
    let events: Vec<String> = vec![];
    let err = topic
        .subscribe(events, |_payload, _meta| async move { Ok(json!(null)) })
        .unwrap_err();
    assert!(matches!(err, TopicError::InvalidInput(_)));
}

/// unsubscribe is idempotent.
#[test]
fn unsubscribe_is_idempotent() {
    let topic = Topic::new(TopicConfig::new("logger"));
    let id = topic
        .subscribe(["info"], |_payload, _meta| async move { Ok(json!(null)) })
        .unwrap();

    assert!(topic.unsubscribe(&id));
    assert!(!topic.unsubscribe(&id));
}

/// emit never propagates a subscriber's error to the producer, and resolves
/// without waiting for the handler to finish.
#[tokio::test]
async fn emit_swallows_errors_and_does_not_await_handlers() {
    init_tracing();
    let topic = Topic::new(TopicConfig::new("logger"));
    let ran = Arc::new(AtomicUsize::new(0));
    let ran_for_handler = ran.clone();

    topic
        .subscribe(["info"], move |_payload, _meta| {
            let ran = ran_for_handler.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(30)).await;
                ran.fetch_add(1, Ordering::SeqCst);
                Err(SubscriberError::from("boom"))
            }
        })
        .unwrap();

    let outcome = topic.emit("info", json!("hi"), None).await;
    assert_eq!(outcome.count, 1);
    assert!(outcome.results.is_none());
    // emit must not have waited for the 30ms handler to complete.
    assert_eq!(ran.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(ran.load(Ordering::SeqCst), 1);
}

/// A Topic clone shares the same registry as its origin.
#[tokio::test]
async fn cloned_topic_shares_registry() {
    let topic = Topic::new(TopicConfig::new("logger"));
    let clone = topic.clone();

    clone
        .subscribe(["info"], |_payload, _meta| async move { Ok(json!(true)) })
        .unwrap();

    let outcome = topic.publish("info", json!("hi"), None).await;
    assert_eq!(outcome.count, 1);
}
