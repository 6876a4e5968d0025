//! Dataset resolution: source descriptor to queryable relation.
//!
//! Table mode reads the named relation in place. Query mode materializes the
//! query into a uniquely named table in the scratch schema; that table is
//! owned by the run and dropped by [`DatasetResolver::cleanup`].

use crate::audit::{AuditLog, AuditStep};
use crate::error::{ProfileError, ProfileResult};
use chrono::{DateTime, Utc};
use fp_core::config::ScratchConfig;
use fp_core::sql_utils::{quote_ident, quote_parts};
use fp_core::{MetadataKey, ProfileRun, RunId, SourceDescriptor};
use fp_db::{ColumnInfo, Database, DbError, QueryRows};

/// Prefix of every relation created for a query-mode run.
pub const TEMP_RELATION_PREFIX: &str = "fp_tmp_";

/// The physical relation behind a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    pub key: MetadataKey,
    /// Created for this run and to be dropped by [`DatasetResolver::cleanup`]
    pub temporary: bool,
}

/// A relation ready for profiling.
#[derive(Debug, Clone)]
pub struct ResolvedDataset {
    /// Catalog coordinates, also used for the size lookup
    pub key: MetadataKey,
    /// Quoted reference usable in `FROM`
    pub relation: String,
    /// Columns in ordinal order
    pub columns: Vec<ColumnInfo>,
    pub total_rows: i64,
    /// Head of the relation, every column cast to VARCHAR
    pub sample: QueryRows,
}

impl ResolvedDataset {
    pub fn is_empty(&self) -> bool {
        self.total_rows == 0
    }
}

/// Name of the temporary relation for `run_id` created at `now`.
///
/// The microsecond timestamp keeps repeated runs with the same id apart.
pub fn temp_relation_name(run_id: &RunId, now: DateTime<Utc>) -> String {
    format!(
        "{TEMP_RELATION_PREFIX}{}_{}",
        run_id.sanitized(),
        now.format("%Y%m%d%H%M%S%6f")
    )
}

/// Resolves sources against one database.
pub struct DatasetResolver<'a> {
    db: &'a dyn Database,
    scratch: &'a ScratchConfig,
    sample_rows: usize,
}

impl<'a> DatasetResolver<'a> {
    pub fn new(db: &'a dyn Database, scratch: &'a ScratchConfig, sample_rows: usize) -> Self {
        Self {
            db,
            scratch,
            sample_rows,
        }
    }

    /// Turn the run's source into a physical relation.
    ///
    /// A table is used in place. A query is materialized under the audited
    /// "Create Temp Table" step.
    pub async fn resolve(
        &self,
        run: &ProfileRun,
        audit: &AuditLog,
    ) -> ProfileResult<ResolvedSource> {
        match &run.source {
            SourceDescriptor::Table {
                database,
                schema,
                table,
            } => Ok(ResolvedSource {
                key: MetadataKey::new(database, schema, table),
                temporary: false,
            }),
            SourceDescriptor::Query { sql } => {
                let key = audit
                    .scoped(
                        AuditStep::CreateTempTable,
                        self.materialize(&run.run_id, sql),
                    )
                    .await?;
                Ok(ResolvedSource {
                    key,
                    temporary: true,
                })
            }
        }
    }

    /// Materialize `sql` into a new table in the scratch schema.
    pub async fn materialize(&self, run_id: &RunId, sql: &str) -> ProfileResult<MetadataKey> {
        let database = match &self.scratch.database {
            Some(name) => name.clone(),
            None => self.db.current_database().await?,
        };
        self.db
            .create_schema_if_not_exists(&quote_parts(&[&database, &self.scratch.schema]))
            .await?;

        let key = MetadataKey::new(
            database,
            &self.scratch.schema,
            temp_relation_name(run_id, Utc::now()),
        );
        self.db.create_table_as(&key.quoted(), sql, false).await?;
        log::debug!("Materialized query for run {run_id} into {key}");
        Ok(key)
    }

    /// Count rows, read the schema and draw the preview sample.
    pub async fn load(&self, key: &MetadataKey) -> ProfileResult<ResolvedDataset> {
        if !self.db.relation_exists(key).await? {
            return Err(DbError::TableNotFound(key.to_string()).into());
        }
        let relation = key.quoted();

        let count = self
            .db
            .query_count(&format!("SELECT * FROM {relation}"))
            .await?;
        let total_rows = i64::try_from(count)
            .map_err(|e| ProfileError::unexpected(format!("row count of {key}"), e.to_string()))?;

        let columns = self.db.describe(&relation).await?;
        let sample = self.sample(&relation, &columns).await?;
        log::info!(
            "Loaded {key}: {total_rows} rows, {} columns",
            columns.len()
        );

        Ok(ResolvedDataset {
            key: key.clone(),
            relation,
            columns,
            total_rows,
            sample,
        })
    }

    async fn sample(&self, relation: &str, columns: &[ColumnInfo]) -> ProfileResult<QueryRows> {
        if columns.is_empty() || self.sample_rows == 0 {
            return Ok(QueryRows::default());
        }
        let select_list = columns
            .iter()
            .map(|c| {
                let col = quote_ident(&c.name);
                format!("CAST({col} AS VARCHAR) AS {col}")
            })
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {select_list} FROM {relation} LIMIT {}",
            self.sample_rows
        );
        Ok(self.db.query_rows(&sql).await?)
    }

    /// Drop a relation created by [`DatasetResolver::materialize`].
    pub async fn cleanup(&self, key: &MetadataKey) -> ProfileResult<()> {
        self.db.drop_if_exists(&key.quoted()).await?;
        log::debug!("Dropped temporary relation {key}");
        Ok(())
    }
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod tests;
