//! fp-db - Database abstraction layer for Featherprobe
//!
//! This crate provides the `Database` trait and implementations
//! for DuckDB (and a Snowflake stub for future implementation).

pub mod duckdb;
pub mod error;
pub(crate) mod snowflake;
pub mod traits;

use fp_core::config::DatabaseConfig;
use fp_core::DbType;
use std::sync::Arc;

pub use duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use traits::{ColumnInfo, Database, QueryRows};

/// Open the backend selected by `config`.
pub fn connect(config: &DatabaseConfig) -> DbResult<Arc<dyn Database>> {
    log::debug!("Connecting to {:?} database at {}", config.db_type, config.path);
    match config.db_type {
        DbType::DuckDb => Ok(Arc::new(DuckDbBackend::new(&config.path)?)),
        DbType::Snowflake => Ok(Arc::new(snowflake::SnowflakeBackend::new(&config.path)?)),
    }
}
