// src/engine/mod.rs

//! Execution modes around the shared [`ConversionPipeline`]:
//!
//! - [`dispatcher`]: event-driven execution with at most one job per source
//!   path, used by the live watcher.
//! - [`resync`]: bulk execution over a full tree scan.
//!
//! [`ConversionPipeline`]: crate::pipeline::ConversionPipeline

pub mod dispatcher;
pub mod resync;

pub use dispatcher::JobDispatcher;
pub use resync::{resync, ResyncReport};
