//! Result writer: append column and dataset profiles to the output tables.

use crate::error::{ProfileError, ProfileResult};
use crate::store::OutputTables;
use fp_core::profile::{ColumnProfile, DatasetProfile};
use fp_core::sql_utils::{float_literal, string_literal};
use fp_db::Database;

fn json_list(field: &'static str, values: &[String]) -> ProfileResult<String> {
    serde_json::to_string(values).map_err(|source| ProfileError::Serialization { field, source })
}

fn column_row(profile: &ColumnProfile) -> ProfileResult<String> {
    let first_few = json_list("FIRST_FEW_VALUES", &profile.first_few_values)?;
    let top = json_list("TOP_VALUES", &profile.top_values)?;
    Ok(format!(
        "({}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {})",
        string_literal(Some(profile.run_id.as_str())),
        string_literal(Some(profile.dataset_id.as_str())),
        string_literal(Some(&profile.column_name)),
        string_literal(Some(&profile.inferred_type)),
        string_literal(Some(profile.kind.as_str())),
        profile.total_count,
        profile.non_null_count,
        profile.missing_count,
        profile.distinct_count,
        profile.zero_count,
        float_literal(Some(profile.missing_pct)),
        float_literal(Some(profile.distinct_pct)),
        string_literal(profile.min_value.as_deref()),
        string_literal(profile.max_value.as_deref()),
        float_literal(profile.mean),
        float_literal(profile.avg_length),
        float_literal(profile.std_dev),
        profile.invalid_date_count,
        float_literal(profile.p25),
        float_literal(profile.p50),
        float_literal(profile.p75),
        float_literal(profile.p95),
        string_literal(Some(&first_few)),
        string_literal(Some(&top)),
        string_literal(Some(&profile.alert_label)),
    ))
}

/// Appends profile rows; never updates or deletes.
pub struct ResultWriter<'a> {
    db: &'a dyn Database,
    tables: &'a OutputTables,
}

impl<'a> ResultWriter<'a> {
    pub fn new(db: &'a dyn Database, tables: &'a OutputTables) -> Self {
        Self { db, tables }
    }

    /// Write both stores. A failure of either is returned as-is; rows already
    /// written are not rolled back.
    pub async fn write(
        &self,
        columns: &[ColumnProfile],
        summary: &DatasetProfile,
    ) -> ProfileResult<()> {
        self.write_columns(columns).await?;
        self.write_summary(summary).await
    }

    pub async fn write_columns(&self, columns: &[ColumnProfile]) -> ProfileResult<()> {
        if columns.is_empty() {
            return Ok(());
        }
        let rows = columns
            .iter()
            .map(column_row)
            .collect::<ProfileResult<Vec<_>>>()?;
        let sql = format!(
            "INSERT INTO {} (RUN_ID, DATASET_ID, COLUMN_NAME, INFERRED_TYPE, COLUMN_KIND, \
             TOTAL_COUNT, NON_NULL_COUNT, MISSING_COUNT, DISTINCT_COUNT, ZERO_COUNT, \
             MISSING_PCT, DISTINCT_PCT, MIN_VALUE, MAX_VALUE, MEAN, AVG_LENGTH, STD_DEV, \
             INVALID_DATE_COUNT, P25, P50, P75, P95, FIRST_FEW_VALUES, TOP_VALUES, ALERT_LABEL) \
             VALUES\n{}",
            self.tables.column_profile,
            rows.join(",\n")
        );
        let written = self.db.execute(&sql).await?;
        log::debug!("Wrote {written} column profile rows");
        Ok(())
    }

    pub async fn write_summary(&self, summary: &DatasetProfile) -> ProfileResult<()> {
        let sql = format!(
            "INSERT INTO {} (RUN_ID, DATASET_ID, DATASET_NAME, TOTAL_ROWS, TOTAL_COLUMNS, \
             SIZE_GB, TOTAL_MISSING_CELLS, NULL_PERCENT, UNIQUE_VALUES_SUM, \
             DUPLICATE_ROW_COUNT, PROFILED_AT) \
             VALUES ({}, {}, {}, {}, {}, {}, {}, {}, {}, {}, CAST({} AS TIMESTAMP))",
            self.tables.dataset_profile,
            string_literal(Some(summary.run_id.as_str())),
            string_literal(Some(summary.dataset_id.as_str())),
            string_literal(Some(&summary.dataset_name)),
            summary.total_rows,
            summary.total_columns,
            float_literal(Some(summary.size_gb)),
            summary.total_missing_cells,
            float_literal(Some(summary.null_percent)),
            summary.unique_values_sum,
            summary.duplicate_row_count,
            string_literal(Some(
                &summary
                    .profiled_at
                    .naive_utc()
                    .format("%Y-%m-%d %H:%M:%S%.6f")
                    .to_string()
            )),
        );
        self.db.execute(&sql).await?;
        log::debug!("Wrote dataset profile for run {}", summary.run_id);
        Ok(())
    }
}

#[cfg(test)]
#[path = "writer_test.rs"]
mod tests;
