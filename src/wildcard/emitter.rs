//! `WildcardEmitter` — hierarchical-name dispatch with a synthesized
//! no-subscribers event (spec.md §4.4).

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};

use serde_json::{json, Value};

use super::error::WildcardError;
use super::pattern::Pattern;

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type ListenerFn = Arc<dyn Fn(Vec<Value>) -> BoxFuture<()> + Send + Sync>;

struct Listener {
    id: String,
    pattern: Pattern,
    callback: ListenerFn,
}

/// Configuration for a [`WildcardEmitter`].
#[derive(Debug, Clone)]
pub struct WildcardConfig {
    pub delimiter: String,
    pub wildcard: String,
    pub no_subscriptions_event: String,
}

impl Default for WildcardConfig {
    fn default() -> Self {
        Self {
            delimiter: "_".to_string(),
            wildcard: "%".to_string(),
            no_subscriptions_event: String::new(),
        }
    }
}

/// A hierarchical-name event emitter: dispatches by namespace prefix and
/// surfaces unhandled events.
///
/// Cheap to clone — clones share the same listener registry.
#[derive(Clone)]
pub struct WildcardEmitter {
    config: Arc<WildcardConfig>,
    listeners: Arc<RwLock<Vec<Arc<Listener>>>>,
}

impl WildcardEmitter {
    pub fn new(config: WildcardConfig) -> Self {
        Self {
            config: Arc::new(config),
            listeners: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Register a listener for `pattern`. Returns the listener's identifier.
    ///
    /// `pattern` may be an exact event name, the bare wildcard token
    /// (matches any non-empty name), or a hierarchical prefix ending in the
    /// wildcard token (e.g. `foo_bar_%`).
    pub fn on<F, Fut>(&self, pattern: &str, listener: F) -> Result<String, WildcardError>
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if pattern.is_empty() && pattern != self.config.no_subscriptions_event {
            return Err(WildcardError::InvalidPattern(
                "pattern must not be empty".to_string(),
            ));
        }

        let parsed = Pattern::parse(pattern, &self.config.delimiter, &self.config.wildcard);
        let id = uuid::Uuid::new_v4().to_string();
        let entry = Arc::new(Listener {
            id: id.clone(),
            pattern: parsed,
            callback: Arc::new(move |args| Box::pin(listener(args)) as BoxFuture<()>),
        });
        self.listeners.write().unwrap().push(entry);
        Ok(id)
    }

    /// Remove a listener by identifier. Idempotent; returns whether
    /// anything was removed.
    pub fn remove_listener(&self, listener_id: &str) -> bool {
        let mut listeners = self.listeners.write().unwrap();
        let before = listeners.len();
        listeners.retain(|l| l.id != listener_id);
        listeners.len() != before
    }

    /// Dispatch `name` to every listener whose pattern matches, in
    /// registration order. Exact matches receive `args` unchanged; wildcard
    /// matches receive a prepended `{"event": name}` argument.
    ///
    /// If nothing matched, and at least one listener is registered on the
    /// configured no-subscriptions event, that listener set is invoked once
    /// with `({"event": name}, ...args)`. This synthetic dispatch never
    /// recurses.
    ///
    /// Returns the number of listener invocations performed.
    pub async fn emit(&self, name: &str, args: Vec<Value>) -> usize {
        let snapshot = self.listeners.read().unwrap().clone();
        let delimiter = &self.config.delimiter;

        let matched: Vec<Arc<Listener>> = snapshot
            .iter()
            .filter(|listener| listener.pattern.matches(name, delimiter))
            .cloned()
            .collect();

        if !matched.is_empty() {
            for listener in &matched {
                dispatch_one(listener, name, &args).await;
            }
            return matched.len();
        }

        let fallback: Vec<Arc<Listener>> = snapshot
            .iter()
            .filter(|listener| match &listener.pattern {
                Pattern::Exact(exact) => exact == &self.config.no_subscriptions_event,
                Pattern::Wildcard { .. } => false,
            })
            .cloned()
            .collect();

        for listener in &fallback {
            let mut call_args = vec![json!({ "event": name })];
            call_args.extend(args.iter().cloned());
            (listener.callback)(call_args).await;
        }
        fallback.len()
    }
}

async fn dispatch_one(listener: &Listener, name: &str, args: &[Value]) {
    let call_args = if listener.pattern.is_wildcard() {
        let mut call_args = vec![json!({ "event": name })];
        call_args.extend(args.iter().cloned());
        call_args
    } else {
        args.to_vec()
    };
    (listener.callback)(call_args).await;
}
