//! Test helpers: an in-memory backend with injectable query failures.

use async_trait::async_trait;
use fp_core::MetadataKey;
use fp_db::{ColumnInfo, Database, DbError, DbResult, DuckDbBackend, QueryRows};
use std::sync::Arc;

/// Wraps a real backend and fails any statement containing one of the
/// configured fragments.
///
/// Operations that take no SQL are matched on the statement the DuckDB
/// backend would issue for them (`DROP TABLE IF EXISTS <name>`,
/// `CREATE TABLE <name> AS <select>`, `DESCRIBE <relation>`) or on the
/// pseudo-statement `SIZE OF <key>` for the size lookup.
pub struct FaultyDatabase {
    inner: Arc<dyn Database>,
    faults: Vec<String>,
    panics: Vec<String>,
}

impl FaultyDatabase {
    pub fn new(inner: Arc<dyn Database>) -> Self {
        Self {
            inner,
            faults: Vec::new(),
            panics: Vec::new(),
        }
    }

    /// Fresh in-memory DuckDB with no faults.
    pub fn in_memory() -> DbResult<Self> {
        Ok(Self::new(Arc::new(DuckDbBackend::in_memory()?)))
    }

    /// Fail statements containing `fragment`.
    pub fn fail_on(mut self, fragment: impl Into<String>) -> Self {
        self.faults.push(fragment.into());
        self
    }

    /// Panic on statements containing `fragment`.
    pub fn panic_on(mut self, fragment: impl Into<String>) -> Self {
        self.panics.push(fragment.into());
        self
    }

    pub fn inner(&self) -> &Arc<dyn Database> {
        &self.inner
    }

    fn check(&self, statement: &str) -> DbResult<()> {
        if let Some(fragment) = self.panics.iter().find(|f| statement.contains(f.as_str())) {
            panic!("injected panic '{fragment}': {statement}");
        }
        match self.faults.iter().find(|f| statement.contains(f.as_str())) {
            Some(fault) => Err(DbError::ExecutionError(format!(
                "injected fault '{fault}': {statement}"
            ))),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Database for FaultyDatabase {
    async fn execute(&self, sql: &str) -> DbResult<usize> {
        self.check(sql)?;
        self.inner.execute(sql).await
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.check(sql)?;
        self.inner.execute_batch(sql).await
    }

    async fn create_table_as(&self, name: &str, select: &str, replace: bool) -> DbResult<()> {
        self.check(&format!("CREATE TABLE {name} AS {select}"))?;
        self.inner.create_table_as(name, select, replace).await
    }

    async fn relation_exists(&self, key: &MetadataKey) -> DbResult<bool> {
        self.inner.relation_exists(key).await
    }

    async fn query_count(&self, sql: &str) -> DbResult<usize> {
        self.check(sql)?;
        self.inner.query_count(sql).await
    }

    async fn query_rows(&self, sql: &str) -> DbResult<QueryRows> {
        self.check(sql)?;
        self.inner.query_rows(sql).await
    }

    async fn query_one(&self, sql: &str) -> DbResult<Option<String>> {
        self.check(sql)?;
        self.inner.query_one(sql).await
    }

    async fn describe(&self, relation: &str) -> DbResult<Vec<ColumnInfo>> {
        self.check(&format!("DESCRIBE {relation}"))?;
        self.inner.describe(relation).await
    }

    async fn current_database(&self) -> DbResult<String> {
        self.inner.current_database().await
    }

    async fn relation_size_bytes(&self, key: &MetadataKey) -> DbResult<u64> {
        self.check(&format!("SIZE OF {key}"))?;
        self.inner.relation_size_bytes(key).await
    }

    fn db_type(&self) -> &'static str {
        self.inner.db_type()
    }

    async fn drop_if_exists(&self, name: &str) -> DbResult<()> {
        self.check(&format!("DROP TABLE IF EXISTS {name}"))?;
        self.inner.drop_if_exists(name).await
    }

    async fn create_schema_if_not_exists(&self, schema: &str) -> DbResult<()> {
        self.check(&format!("CREATE SCHEMA IF NOT EXISTS {schema}"))?;
        self.inner.create_schema_if_not_exists(schema).await
    }
}
