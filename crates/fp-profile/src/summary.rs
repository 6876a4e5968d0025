//! Dataset summary: roll column profiles up into one row per run.

use crate::best_effort::best_effort;
use crate::error::{ProfileError, ProfileResult};
use crate::resolver::ResolvedDataset;
use chrono::Utc;
use fp_core::profile::{percent, ColumnProfile, DatasetProfile};
use fp_core::sql_utils::quote_ident;
use fp_core::{MetadataKey, ProfileRun};
use fp_db::Database;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Column-derived totals of a dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnTotals {
    pub total_missing_cells: i64,
    pub null_percent: f64,
    pub unique_values_sum: i64,
}

impl ColumnTotals {
    /// `unique_values_sum` adds up per-column distinct counts; it is not a
    /// distinct count across columns.
    pub fn from_columns(total_rows: i64, columns: &[ColumnProfile]) -> Self {
        let total_missing_cells = columns.iter().map(|c| c.missing_count).sum();
        let total_cells = total_rows.saturating_mul(columns.len() as i64);
        Self {
            total_missing_cells,
            null_percent: percent(total_missing_cells, total_cells),
            unique_values_sum: columns.iter().map(|c| c.distinct_count).sum(),
        }
    }
}

/// Builds the [`DatasetProfile`] of a run.
pub struct SummaryAggregator<'a> {
    db: &'a dyn Database,
}

impl<'a> SummaryAggregator<'a> {
    pub fn new(db: &'a dyn Database) -> Self {
        Self { db }
    }

    /// Summarize `dataset`. Duplicate counting and size lookup fall back to
    /// `-1` and `0.0` on failure, so this never fails.
    pub async fn summarize(
        &self,
        run: &ProfileRun,
        dataset: &ResolvedDataset,
        columns: &[ColumnProfile],
    ) -> DatasetProfile {
        let totals = ColumnTotals::from_columns(dataset.total_rows, columns);
        let duplicate_row_count = best_effort(
            "duplicate row count",
            DatasetProfile::DUPLICATES_UNKNOWN,
            self.duplicate_row_count(dataset).await,
        );
        let size_gb = best_effort("size lookup", 0.0, self.size_gb(&dataset.key).await);

        log::info!(
            "Summary of {}: {} rows, {} columns, {duplicate_row_count} duplicates, {:.2}% null",
            run.dataset_name,
            dataset.total_rows,
            columns.len(),
            totals.null_percent
        );

        DatasetProfile {
            run_id: run.run_id.clone(),
            dataset_id: run.dataset_id.clone(),
            dataset_name: run.dataset_name.clone(),
            total_rows: dataset.total_rows,
            total_columns: columns.len() as i64,
            size_gb,
            total_missing_cells: totals.total_missing_cells,
            null_percent: totals.null_percent,
            unique_values_sum: totals.unique_values_sum,
            duplicate_row_count,
            profiled_at: Utc::now(),
        }
    }

    /// Rows minus distinct whole-row hashes, in one set-level aggregate.
    pub async fn duplicate_row_count(&self, dataset: &ResolvedDataset) -> ProfileResult<i64> {
        if dataset.columns.is_empty() {
            return Ok(0);
        }
        let hashed = dataset
            .columns
            .iter()
            .map(|c| quote_ident(&c.name))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT CAST(COUNT(*) - COUNT(DISTINCT hash({hashed})) AS VARCHAR) FROM {}",
            dataset.relation
        );
        let value = self.db.query_one(&sql).await?.unwrap_or_default();
        value.parse::<i64>().map_err(|e| {
            ProfileError::unexpected(
                format!("duplicate row count of {}", dataset.key),
                format!("'{value}': {e}"),
            )
        })
    }

    /// Catalog size of the physical relation in GiB.
    pub async fn size_gb(&self, key: &MetadataKey) -> ProfileResult<f64> {
        let bytes = self.db.relation_size_bytes(key).await?;
        Ok(bytes as f64 / BYTES_PER_GB)
    }
}

#[cfg(test)]
#[path = "summary_test.rs"]
mod tests;
