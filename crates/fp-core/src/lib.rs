//! fp-core - Core library for Featherprobe
//!
//! Shared configuration, run identifiers, source descriptors, and the
//! column/dataset profile records produced by the profiling engine.

pub mod config;
pub mod error;
pub mod ids;
mod newtype_string;
pub mod profile;
pub mod run;
pub mod source;
pub mod sql_utils;

pub use config::{Config, DbType};
pub use error::{CoreError, CoreResult};
pub use ids::{DatasetId, RunId};
pub use profile::{AlertLabel, ColumnKind, ColumnProfile, DatasetProfile, DerivedMetrics};
pub use run::ProfileRun;
pub use source::{MetadataKey, SourceDescriptor};
