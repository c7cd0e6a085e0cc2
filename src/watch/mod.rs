// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Wiring up a cross-platform recursive filesystem watcher (`notify`).
//! - Turning raw events into debounced, per-path conversion jobs.
//! - `[watch].exclude` glob patterns.
//! - Content fingerprints used to skip events that did not change a file.

pub mod event_handler;
pub mod hash;
pub mod patterns;
pub mod watcher;

pub use event_handler::{DebounceQueue, EventFilter};
pub use hash::{compute_file_hash, ContentHashes};
pub use patterns::ExcludeMatcher;
pub use watcher::{ChangeWatcher, WatchOptions};
