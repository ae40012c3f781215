//! `WildcardEmitter` — hierarchical-name dispatch, independent of `Topic`.
//!
//! ## Example
//!
//! ```
//! use async_event_bus::wildcard::{WildcardConfig, WildcardEmitter};
//! use serde_json::json;
//! use std::sync::{Arc, Mutex};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let emitter = WildcardEmitter::new(WildcardConfig::default());
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let seen_clone = seen.clone();
//! emitter
//!     .on("foo_%", move |args| {
//!         let seen = seen_clone.clone();
//!         async move {
//!             seen.lock().unwrap().push(args);
//!         }
//!     })
//!     .unwrap();
//!
//! emitter.emit("foo_bar_baz", vec![json!("one")]).await;
//! assert_eq!(seen.lock().unwrap().len(), 1);
//! # }
//! ```

mod emitter;
mod error;
mod pattern;

pub use emitter::{WildcardConfig, WildcardEmitter};
pub use error::WildcardError;
