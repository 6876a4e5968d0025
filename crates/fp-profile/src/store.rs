//! Output store layout: the column-profile, dataset-profile and audit tables.
//!
//! Column names are UPPER_SNAKE_CASE and part of the external contract for
//! downstream consumers. Tables are created on first use and only ever
//! appended to (the audit table additionally has its STARTED rows updated).

use crate::error::ProfileResult;
use fp_core::config::OutputConfig;
use fp_core::sql_utils::quote_parts;
use fp_core::MetadataKey;
use fp_db::Database;

const COLUMN_PROFILE_COLUMNS: &str = "
    RUN_ID             VARCHAR NOT NULL,
    DATASET_ID         VARCHAR NOT NULL,
    COLUMN_NAME        VARCHAR NOT NULL,
    INFERRED_TYPE      VARCHAR NOT NULL,
    COLUMN_KIND        VARCHAR NOT NULL,
    TOTAL_COUNT        BIGINT  NOT NULL,
    NON_NULL_COUNT     BIGINT  NOT NULL,
    MISSING_COUNT      BIGINT  NOT NULL,
    DISTINCT_COUNT     BIGINT  NOT NULL,
    ZERO_COUNT         BIGINT  NOT NULL,
    MISSING_PCT        DOUBLE  NOT NULL,
    DISTINCT_PCT       DOUBLE  NOT NULL,
    MIN_VALUE          VARCHAR,
    MAX_VALUE          VARCHAR,
    MEAN               DOUBLE,
    AVG_LENGTH         DOUBLE,
    STD_DEV            DOUBLE,
    INVALID_DATE_COUNT BIGINT  NOT NULL,
    P25                DOUBLE,
    P50                DOUBLE,
    P75                DOUBLE,
    P95                DOUBLE,
    FIRST_FEW_VALUES   VARCHAR NOT NULL,
    TOP_VALUES         VARCHAR NOT NULL,
    ALERT_LABEL        VARCHAR NOT NULL";

const DATASET_PROFILE_COLUMNS: &str = "
    RUN_ID              VARCHAR   NOT NULL,
    DATASET_ID          VARCHAR   NOT NULL,
    DATASET_NAME        VARCHAR   NOT NULL,
    TOTAL_ROWS          BIGINT    NOT NULL,
    TOTAL_COLUMNS       BIGINT    NOT NULL,
    SIZE_GB             DOUBLE    NOT NULL,
    TOTAL_MISSING_CELLS BIGINT    NOT NULL,
    NULL_PERCENT        DOUBLE    NOT NULL,
    UNIQUE_VALUES_SUM   BIGINT    NOT NULL,
    DUPLICATE_ROW_COUNT BIGINT    NOT NULL,
    PROFILED_AT         TIMESTAMP NOT NULL";

const AUDIT_COLUMNS: &str = "
    RUN_ID          VARCHAR   NOT NULL,
    DATASET_ID      VARCHAR   NOT NULL,
    DATASET_NAME    VARCHAR   NOT NULL,
    SOURCE_DATABASE VARCHAR,
    SOURCE_SCHEMA   VARCHAR,
    SOURCE_TABLE    VARCHAR,
    CUSTOM_QUERY    VARCHAR,
    STEP_SEQ        INTEGER   NOT NULL,
    STEP_NAME       VARCHAR   NOT NULL,
    STATUS          VARCHAR   NOT NULL CHECK (STATUS IN ('STARTED', 'SUCCESS', 'FAILURE')),
    MESSAGE         VARCHAR,
    STARTED_AT      TIMESTAMP NOT NULL,
    ENDED_AT        TIMESTAMP";

/// Resolved, quoted locations of the three output tables.
#[derive(Debug, Clone)]
pub struct OutputTables {
    pub column_profile: String,
    pub dataset_profile: String,
    pub audit: String,
    pub database: String,
    pub schema: String,
}

impl OutputTables {
    /// Resolve the configured locations against `db` without touching the
    /// catalog.
    pub async fn resolve(db: &dyn Database, config: &OutputConfig) -> ProfileResult<Self> {
        let database = match &config.database {
            Some(name) => name.clone(),
            None => db.current_database().await?,
        };
        let qualify = |table: &str| quote_parts(&[&database, &config.schema, table]);
        Ok(Self {
            column_profile: qualify(&config.column_profile_table),
            dataset_profile: qualify(&config.dataset_profile_table),
            audit: qualify(&config.audit_table),
            schema: config.schema.clone(),
            database,
        })
    }

    /// Resolve and create the output schema and tables if they are missing.
    pub async fn prepare(db: &dyn Database, config: &OutputConfig) -> ProfileResult<Self> {
        let tables = Self::resolve(db, config).await?;
        db.create_schema_if_not_exists(&quote_parts(&[&tables.database, &tables.schema]))
            .await?;
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {} ({COLUMN_PROFILE_COLUMNS}\n);\n\
             CREATE TABLE IF NOT EXISTS {} ({DATASET_PROFILE_COLUMNS}\n);\n\
             CREATE TABLE IF NOT EXISTS {} ({AUDIT_COLUMNS}\n);",
            tables.column_profile, tables.dataset_profile, tables.audit
        );
        db.execute_batch(&ddl).await?;
        log::debug!(
            "Output tables ready in {}.{}",
            tables.database,
            tables.schema
        );
        Ok(tables)
    }

    /// Catalog key of the audit table.
    pub fn audit_key(&self, config: &OutputConfig) -> MetadataKey {
        MetadataKey::new(&self.database, &self.schema, &config.audit_table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fp_db::DuckDbBackend;

    #[tokio::test]
    async fn test_prepare_creates_tables_idempotently() {
        let db = DuckDbBackend::in_memory().unwrap();
        let config = OutputConfig::default();

        let tables = OutputTables::prepare(&db, &config).await.unwrap();
        OutputTables::prepare(&db, &config).await.unwrap();

        assert_eq!(tables.database, "memory");
        assert_eq!(tables.audit, r#""memory"."profiling"."PROFILE_AUDIT_LOG""#);
        for name in ["COLUMN_PROFILE", "DATASET_PROFILE", "PROFILE_AUDIT_LOG"] {
            let key = MetadataKey::new("memory", "profiling", name);
            assert!(db.relation_exists(&key).await.unwrap(), "{name} missing");
        }
        assert!(db.relation_exists(&tables.audit_key(&config)).await.unwrap());
    }

    #[tokio::test]
    async fn test_columns_are_upper_case() {
        let db = DuckDbBackend::in_memory().unwrap();
        let tables = OutputTables::prepare(&db, &OutputConfig::default())
            .await
            .unwrap();
        let columns = db.describe(&tables.column_profile).await.unwrap();
        assert!(columns
            .iter()
            .all(|c| c.name == c.name.to_ascii_uppercase()));
        assert!(columns.iter().any(|c| c.name == "FIRST_FEW_VALUES"));
    }
}
