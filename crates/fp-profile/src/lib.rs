//! fp-profile - Dataset profiling engine for Featherprobe
//!
//! Resolves a table or ad-hoc query into a relation, computes per-column
//! statistics and a dataset summary, appends both to the configured output
//! tables, and records every phase in an audit table.
//!
//! The entry point is [`Profiler::run_profile`].

pub mod audit;
pub mod best_effort;
pub mod error;
pub mod pipeline;
pub mod resolver;
pub mod stats;
pub mod store;
pub mod summary;
pub mod writer;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use audit::{AuditLog, AuditStep, AuditStepRecord, StepStatus};
pub use error::{ProfileError, ProfileResult};
pub use pipeline::{ProfileOutcome, ProfileReport, ProfileRequest, Profiler};
