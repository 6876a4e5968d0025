//! DuckDB database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::{ColumnInfo, Database, QueryRows};
use async_trait::async_trait;
use duckdb::types::ValueRef;
use duckdb::Connection;
use fp_core::sql_utils::{escape_sql_string, string_literal};
use fp_core::MetadataKey;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// DuckDB database backend
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

/// Read a cell as text, mapping SQL NULL to `None`.
///
/// Profiling queries cast their outputs to VARCHAR, so the string branch is
/// the common one; the numeric fallbacks cover catalog queries.
fn cell_as_string(row: &duckdb::Row<'_>, idx: usize) -> Option<String> {
    if matches!(row.get_ref(idx), Ok(ValueRef::Null)) {
        return None;
    }
    if let Ok(Some(s)) = row.get::<_, Option<String>>(idx) {
        return Some(s);
    }
    if let Ok(Some(n)) = row.get::<_, Option<i64>>(idx) {
        return Some(n.to_string());
    }
    if let Ok(Some(f)) = row.get::<_, Option<f64>>(idx) {
        return Some(f.to_string());
    }
    if let Ok(Some(b)) = row.get::<_, Option<bool>>(idx) {
        return Some(b.to_string());
    }
    None
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    /// Execute SQL synchronously
    fn execute_sync(&self, sql: &str) -> DbResult<usize> {
        let conn = self.lock()?;
        conn.execute(sql, [])
            .map_err(|e| DbError::from(e).in_statement(sql))
    }

    /// Execute batch SQL synchronously
    fn execute_batch_sync(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        Ok(conn.execute_batch(sql)?)
    }

    /// Query count synchronously
    fn query_count_sync(&self, sql: &str) -> DbResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM ({sql})"), [], |row| {
                row.get(0)
            })
            .map_err(|e| DbError::from(e).in_statement(sql))?;
        usize::try_from(count).map_err(|e| DbError::UnexpectedResult(e.to_string()))
    }

    /// Run a query and collect every cell as text.
    ///
    /// DuckDB panics on `stmt.column_count()` before execution, so rows are
    /// collected via `query_map` first and column metadata is read after.
    fn query_rows_sync(&self, sql: &str) -> DbResult<QueryRows> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| DbError::from(e).in_statement(sql))?;

        let rows: Vec<Vec<Option<String>>> = stmt
            .query_map([], |row| {
                let col_count = row.as_ref().column_count();
                Ok((0..col_count).map(|i| cell_as_string(row, i)).collect())
            })
            .map_err(|e| DbError::from(e).in_statement(sql))?
            .collect::<Result<Vec<_>, _>>()?;

        let columns = (0..stmt.column_count())
            .map(|i| {
                stmt.column_name(i)
                    .map_or("?".to_string(), |v| v.to_string())
            })
            .collect();

        Ok(QueryRows { columns, rows })
    }

    /// Check if relation exists synchronously
    fn relation_exists_sync(&self, key: &MetadataKey) -> DbResult<bool> {
        let sql = format!(
            "SELECT COUNT(*) FROM information_schema.tables \
             WHERE table_catalog = {} AND table_schema = {} AND table_name = {}",
            string_literal(Some(&key.database)),
            string_literal(Some(&key.schema)),
            string_literal(Some(&key.relation)),
        );
        let conn = self.lock()?;
        let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count > 0)
    }
}

#[async_trait]
impl Database for DuckDbBackend {
    async fn execute(&self, sql: &str) -> DbResult<usize> {
        self.execute_sync(sql)
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.execute_batch_sync(sql)
    }

    async fn create_table_as(&self, name: &str, select: &str, replace: bool) -> DbResult<()> {
        let sql = if replace {
            format!("CREATE OR REPLACE TABLE {name} AS {select}")
        } else {
            format!("CREATE TABLE {name} AS {select}")
        };
        self.execute_sync(&sql)?;
        Ok(())
    }

    async fn relation_exists(&self, key: &MetadataKey) -> DbResult<bool> {
        self.relation_exists_sync(key)
    }

    async fn query_count(&self, sql: &str) -> DbResult<usize> {
        self.query_count_sync(sql)
    }

    async fn query_rows(&self, sql: &str) -> DbResult<QueryRows> {
        self.query_rows_sync(sql)
    }

    async fn query_one(&self, sql: &str) -> DbResult<Option<String>> {
        let result = self.query_rows_sync(sql)?;
        Ok(result
            .rows
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next().flatten()))
    }

    async fn describe(&self, relation: &str) -> DbResult<Vec<ColumnInfo>> {
        let result = self.query_rows_sync(&format!("DESCRIBE SELECT * FROM {relation}"))?;
        result
            .rows
            .into_iter()
            .map(|row| match (row.first(), row.get(1)) {
                (Some(Some(name)), Some(Some(data_type))) => Ok(ColumnInfo {
                    name: name.clone(),
                    data_type: data_type.clone(),
                }),
                _ => Err(DbError::UnexpectedResult(format!(
                    "DESCRIBE of {relation} returned an incomplete row"
                ))),
            })
            .collect()
    }

    async fn current_database(&self) -> DbResult<String> {
        self.query_one("SELECT current_database()")
            .await?
            .ok_or_else(|| DbError::UnexpectedResult("current_database() is NULL".to_string()))
    }

    async fn relation_size_bytes(&self, key: &MetadataKey) -> DbResult<u64> {
        // Persistent blocks touched by the relation times the database block
        // size. In-memory relations own no persistent blocks and report 0.
        let sql = format!(
            "SELECT CAST(COUNT(DISTINCT block_id) * \
                    (SELECT block_size FROM pragma_database_size() WHERE database_name = {db}) \
                    AS BIGINT) \
             FROM pragma_storage_info('{relation}') \
             WHERE persistent",
            db = string_literal(Some(&key.database)),
            relation = escape_sql_string(&key.quoted()),
        );
        let bytes = self
            .query_one(&sql)
            .await?
            .ok_or_else(|| DbError::UnexpectedResult(format!("no storage info for {key}")))?;
        bytes
            .parse::<u64>()
            .map_err(|e| DbError::UnexpectedResult(format!("storage size '{bytes}': {e}")))
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }

    async fn drop_if_exists(&self, name: &str) -> DbResult<()> {
        // DROP TABLE on a view (and vice versa) is a type error in DuckDB.
        match self.execute_sync(&format!("DROP TABLE IF EXISTS {name}")) {
            Ok(_) => Ok(()),
            Err(table_err) => self
                .execute_sync(&format!("DROP VIEW IF EXISTS {name}"))
                .map(|_| ())
                .map_err(|_| table_err),
        }
    }

    async fn create_schema_if_not_exists(&self, schema: &str) -> DbResult<()> {
        let sql = format!("CREATE SCHEMA IF NOT EXISTS {schema}");
        self.execute_sync(&sql)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
