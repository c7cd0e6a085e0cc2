// src/pipeline/mod.rs

//! The conversion-and-mirroring unit of work.
//!
//! - [`paths`]: pure source → derived → mirrored mapping.
//! - [`job`]: session roots, jobs and their results.
//! - [`copy`]: idempotent directory creation and atomic file replacement.
//! - [`sink`]: completion notifications and the bounded recent-change log.
//! - [`pipeline`]: [`ConversionPipeline`], shared by watch and resync.

pub mod copy;
pub mod job;
pub mod paths;
#[allow(clippy::module_inception)]
pub mod pipeline;
pub mod sink;

pub use job::{
    ConversionJob, ConversionResult, JobFailure, JobOrigin, JobOutcome, SessionRoots, SkipReason,
};
pub use paths::{map_paths, MappedPaths};
pub use pipeline::ConversionPipeline;
pub use sink::{NotificationSink, NullSink, RecentChangeLog};
