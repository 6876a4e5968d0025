//! Database trait definition

use crate::error::DbResult;
use async_trait::async_trait;
use fp_core::MetadataKey;

/// Name and engine type of one relation column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

/// A fully materialized result set with every cell rendered as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryRows {
    pub columns: Vec<String>,
    /// `None` marks SQL NULL
    pub rows: Vec<Vec<Option<String>>>,
}

impl QueryRows {
    /// The single row of an aggregate query.
    pub fn single_row(&self) -> Option<&[Option<String>]> {
        match self.rows.as_slice() {
            [row] => Some(row.as_slice()),
            _ => None,
        }
    }
}

/// Database abstraction trait for Featherprobe
///
/// Relation and schema arguments are expected to be quoted already (see
/// `fp_core::sql_utils`). Implementations must be Send + Sync.
#[async_trait]
pub trait Database: Send + Sync {
    /// Execute SQL that modifies data, returns affected rows
    async fn execute(&self, sql: &str) -> DbResult<usize>;

    /// Execute multiple SQL statements
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Create table from SELECT statement
    async fn create_table_as(&self, name: &str, select: &str, replace: bool) -> DbResult<()>;

    /// Check if a table or view exists
    async fn relation_exists(&self, key: &MetadataKey) -> DbResult<bool>;

    /// Execute query returning row count
    async fn query_count(&self, sql: &str) -> DbResult<usize>;

    /// Execute a query and return all of its rows as text
    async fn query_rows(&self, sql: &str) -> DbResult<QueryRows>;

    /// Execute a query and return the first column of the first row
    async fn query_one(&self, sql: &str) -> DbResult<Option<String>>;

    /// Column names and types of a relation, in ordinal order
    async fn describe(&self, relation: &str) -> DbResult<Vec<ColumnInfo>>;

    /// Name of the database unqualified relations resolve into
    async fn current_database(&self) -> DbResult<String>;

    /// Storage footprint of a relation in bytes, from the catalog
    async fn relation_size_bytes(&self, key: &MetadataKey) -> DbResult<u64>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;

    /// Drop a table or view if it exists
    async fn drop_if_exists(&self, name: &str) -> DbResult<()>;

    /// Create a schema if it does not exist
    async fn create_schema_if_not_exists(&self, schema: &str) -> DbResult<()>;
}
