//! Snowflake database backend stub

use crate::error::{DbError, DbResult};
use crate::traits::{ColumnInfo, Database, QueryRows};
use async_trait::async_trait;
use fp_core::MetadataKey;

/// Snowflake database backend (stub implementation)
///
/// Placeholder so `type: snowflake` in featherprobe.yml fails with a clear
/// error instead of a config parse failure.
pub struct SnowflakeBackend {}

fn not_implemented<T>(feature: &str) -> DbResult<T> {
    Err(DbError::NotImplemented {
        backend: "snowflake".to_string(),
        feature: feature.to_string(),
    })
}

impl SnowflakeBackend {
    /// Create a new Snowflake backend (not yet implemented)
    pub fn new(_connection_string: &str) -> DbResult<Self> {
        not_implemented("connect")
    }
}

#[async_trait]
impl Database for SnowflakeBackend {
    async fn execute(&self, _sql: &str) -> DbResult<usize> {
        not_implemented("execute")
    }

    async fn execute_batch(&self, _sql: &str) -> DbResult<()> {
        not_implemented("execute_batch")
    }

    async fn create_table_as(&self, _name: &str, _select: &str, _replace: bool) -> DbResult<()> {
        not_implemented("create_table_as")
    }

    async fn relation_exists(&self, _key: &MetadataKey) -> DbResult<bool> {
        not_implemented("relation_exists")
    }

    async fn query_count(&self, _sql: &str) -> DbResult<usize> {
        not_implemented("query_count")
    }

    async fn query_rows(&self, _sql: &str) -> DbResult<QueryRows> {
        not_implemented("query_rows")
    }

    async fn query_one(&self, _sql: &str) -> DbResult<Option<String>> {
        not_implemented("query_one")
    }

    async fn describe(&self, _relation: &str) -> DbResult<Vec<ColumnInfo>> {
        not_implemented("describe")
    }

    async fn current_database(&self) -> DbResult<String> {
        not_implemented("current_database")
    }

    async fn relation_size_bytes(&self, _key: &MetadataKey) -> DbResult<u64> {
        not_implemented("relation_size_bytes")
    }

    fn db_type(&self) -> &'static str {
        "snowflake"
    }

    async fn drop_if_exists(&self, _name: &str) -> DbResult<()> {
        not_implemented("drop_if_exists")
    }

    async fn create_schema_if_not_exists(&self, _schema: &str) -> DbResult<()> {
        not_implemented("create_schema_if_not_exists")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fp_core::config::DatabaseConfig;
    use fp_core::DbType;

    #[test]
    fn test_connect_reports_not_implemented() {
        let config = DatabaseConfig {
            db_type: DbType::Snowflake,
            path: "account".to_string(),
        };
        let err = crate::connect(&config).err().unwrap();
        assert!(matches!(err, DbError::NotImplemented { .. }));
        assert!(err.to_string().contains("snowflake"));
    }
}
