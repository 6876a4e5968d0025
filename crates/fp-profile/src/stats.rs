//! Column statistics engine.
//!
//! Each column is classified once into a [`ColumnKind`], which decides the
//! aggregates requested for it. All aggregates of one column go out as a
//! single query; columns are processed one after another.

use crate::best_effort::best_effort;
use crate::error::{ProfileError, ProfileResult};
use crate::resolver::ResolvedDataset;
use fp_core::config::ProfilingConfig;
use fp_core::profile::{AlertLabel, ColumnKind, ColumnProfile, DerivedMetrics};
use fp_core::sql_utils::quote_ident;
use fp_core::ProfileRun;
use fp_db::{ColumnInfo, Database, DbResult};
use std::fmt;

const QUANTILES: [u8; 4] = [25, 50, 75, 95];

/// One aggregate of the per-column query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Aggregate {
    NonNullCount,
    DistinctCount,
    Min,
    Max,
    Mean,
    StdDev,
    Quantile(u8),
    ZeroCount,
    AvgLength,
    InvalidDateCount,
}

impl Aggregate {
    /// Aggregates requested for a column of `kind`, base set first.
    fn for_kind(kind: ColumnKind) -> Vec<Self> {
        let mut aggs = vec![
            Self::NonNullCount,
            Self::DistinctCount,
            Self::Min,
            Self::Max,
        ];
        match kind {
            ColumnKind::Numeric => {
                aggs.extend([Self::Mean, Self::StdDev]);
                aggs.extend(QUANTILES.map(Self::Quantile));
                aggs.push(Self::ZeroCount);
            }
            ColumnKind::Text => aggs.extend([Self::AvgLength, Self::InvalidDateCount]),
            ColumnKind::Other => {}
        }
        aggs
    }

    /// SQL expression over the quoted column `col`, rendered as VARCHAR.
    fn expr(&self, col: &str) -> String {
        let inner = match self {
            Self::NonNullCount => format!("COUNT({col})"),
            Self::DistinctCount => format!("COUNT(DISTINCT {col})"),
            Self::Min => format!("MIN({col})"),
            Self::Max => format!("MAX({col})"),
            Self::Mean => format!("AVG(CAST({col} AS DOUBLE))"),
            Self::StdDev => format!("STDDEV_SAMP(CAST({col} AS DOUBLE))"),
            Self::Quantile(p) => {
                format!("QUANTILE_CONT(CAST({col} AS DOUBLE), {})", f64::from(*p) / 100.0)
            }
            Self::ZeroCount => format!("COUNT(*) FILTER (WHERE {col} = 0)"),
            Self::AvgLength => format!("AVG(LENGTH({col}))"),
            Self::InvalidDateCount => format!(
                "COUNT(*) FILTER (WHERE {col} IS NOT NULL AND TRY_CAST({col} AS DATE) IS NULL)"
            ),
        };
        format!("CAST({inner} AS VARCHAR)")
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonNullCount => f.write_str("NON_NULL_COUNT"),
            Self::DistinctCount => f.write_str("DISTINCT_COUNT"),
            Self::Min => f.write_str("MIN_VALUE"),
            Self::Max => f.write_str("MAX_VALUE"),
            Self::Mean => f.write_str("MEAN"),
            Self::StdDev => f.write_str("STD_DEV"),
            Self::Quantile(p) => write!(f, "P{p}"),
            Self::ZeroCount => f.write_str("ZERO_COUNT"),
            Self::AvgLength => f.write_str("AVG_LENGTH"),
            Self::InvalidDateCount => f.write_str("INVALID_DATE_COUNT"),
        }
    }
}

/// Raw aggregate values of one column; fields not requested for its kind
/// keep their defaults.
#[derive(Debug, Clone, Default, PartialEq)]
struct RawAggregates {
    non_null_count: i64,
    distinct_count: i64,
    min_value: Option<String>,
    max_value: Option<String>,
    mean: Option<f64>,
    std_dev: Option<f64>,
    p25: Option<f64>,
    p50: Option<f64>,
    p75: Option<f64>,
    p95: Option<f64>,
    zero_count: i64,
    avg_length: Option<f64>,
    invalid_date_count: i64,
}

/// The batched aggregate query of one column and its extractor.
struct AggregatePlan<'c> {
    column: &'c ColumnInfo,
    aggregates: Vec<Aggregate>,
}

impl<'c> AggregatePlan<'c> {
    fn new(column: &'c ColumnInfo, kind: ColumnKind) -> Self {
        Self {
            column,
            aggregates: Aggregate::for_kind(kind),
        }
    }

    fn sql(&self, relation: &str) -> String {
        let col = quote_ident(&self.column.name);
        let select_list = self
            .aggregates
            .iter()
            .map(|agg| format!("{} AS {}", agg.expr(&col), quote_ident(&agg.to_string())))
            .collect::<Vec<_>>()
            .join(",\n       ");
        format!("SELECT {select_list}\nFROM {relation}")
    }

    fn extract(&self, row: &[Option<String>]) -> ProfileResult<RawAggregates> {
        if row.len() != self.aggregates.len() {
            return Err(ProfileError::unexpected(
                format!("column {}", self.column.name),
                format!(
                    "expected {} aggregates, got {}",
                    self.aggregates.len(),
                    row.len()
                ),
            ));
        }

        let mut raw = RawAggregates::default();
        for (agg, cell) in self.aggregates.iter().zip(row) {
            let value = cell.as_deref();
            match agg {
                Aggregate::NonNullCount => raw.non_null_count = self.count(agg, value)?,
                Aggregate::DistinctCount => raw.distinct_count = self.count(agg, value)?,
                Aggregate::Min => raw.min_value = cell.clone(),
                Aggregate::Max => raw.max_value = cell.clone(),
                Aggregate::Mean => raw.mean = self.float(agg, value)?,
                Aggregate::StdDev => raw.std_dev = self.float(agg, value)?,
                Aggregate::Quantile(25) => raw.p25 = self.float(agg, value)?,
                Aggregate::Quantile(50) => raw.p50 = self.float(agg, value)?,
                Aggregate::Quantile(75) => raw.p75 = self.float(agg, value)?,
                Aggregate::Quantile(_) => raw.p95 = self.float(agg, value)?,
                Aggregate::ZeroCount => raw.zero_count = self.count(agg, value)?,
                Aggregate::AvgLength => raw.avg_length = self.float(agg, value)?,
                Aggregate::InvalidDateCount => raw.invalid_date_count = self.count(agg, value)?,
            }
        }
        Ok(raw)
    }

    fn count(&self, agg: &Aggregate, value: Option<&str>) -> ProfileResult<i64> {
        value.map_or(Ok(0), |v| {
            v.parse::<i64>().map_err(|e| self.bad_value(agg, v, e))
        })
    }

    fn float(&self, agg: &Aggregate, value: Option<&str>) -> ProfileResult<Option<f64>> {
        value
            .map(|v| v.parse::<f64>().map_err(|e| self.bad_value(agg, v, e)))
            .transpose()
    }

    fn bad_value(&self, agg: &Aggregate, value: &str, err: impl fmt::Display) -> ProfileError {
        ProfileError::unexpected(
            format!("{agg} of column {}", self.column.name),
            format!("'{value}': {err}"),
        )
    }
}

/// Up to `limit` non-null values of column `index` from the sample, in row
/// order.
fn preview_values(dataset: &ResolvedDataset, index: usize, limit: usize) -> Vec<String> {
    dataset
        .sample
        .rows
        .iter()
        .filter_map(|row| row.get(index).cloned().flatten())
        .take(limit)
        .collect()
}

/// Computes a [`ColumnProfile`] for every column of a resolved dataset.
pub struct ColumnStatsEngine<'a> {
    db: &'a dyn Database,
    settings: &'a ProfilingConfig,
}

impl<'a> ColumnStatsEngine<'a> {
    pub fn new(db: &'a dyn Database, settings: &'a ProfilingConfig) -> Self {
        Self { db, settings }
    }

    /// Profile every column in ordinal order. The first failing column
    /// aborts the whole pass.
    pub async fn profile_columns(
        &self,
        run: &ProfileRun,
        dataset: &ResolvedDataset,
    ) -> ProfileResult<Vec<ColumnProfile>> {
        let mut profiles = Vec::with_capacity(dataset.columns.len());
        for index in 0..dataset.columns.len() {
            profiles.push(self.profile_column(run, dataset, index).await?);
        }
        Ok(profiles)
    }

    /// Profile column `index` of `dataset`.
    pub async fn profile_column(
        &self,
        run: &ProfileRun,
        dataset: &ResolvedDataset,
        index: usize,
    ) -> ProfileResult<ColumnProfile> {
        let column = dataset.columns.get(index).ok_or_else(|| {
            ProfileError::unexpected(
                format!("dataset {}", dataset.key),
                format!("no column at index {index}"),
            )
        })?;
        let kind = ColumnKind::classify(&column.data_type);
        let plan = AggregatePlan::new(column, kind);

        let result = self.db.query_rows(&plan.sql(&dataset.relation)).await?;
        let row = result.single_row().ok_or_else(|| {
            ProfileError::unexpected(
                format!("column {}", column.name),
                format!("expected one aggregate row, got {}", result.rows.len()),
            )
        })?;
        let raw = plan.extract(row)?;

        let total_rows = dataset.total_rows;
        let derived = DerivedMetrics::compute(total_rows, raw.non_null_count, raw.distinct_count);
        let alert = AlertLabel::classify(
            total_rows,
            raw.distinct_count,
            derived.missing_pct,
            self.settings.high_null_threshold_pct,
        );
        let top_values = best_effort(
            &format!("top values of {}", column.name),
            Vec::new(),
            self.top_values(&dataset.relation, &column.name).await,
        );

        log::debug!(
            "Column {} ({kind}): {} non-null, {} distinct, {alert}",
            column.name,
            raw.non_null_count,
            raw.distinct_count
        );

        Ok(ColumnProfile {
            run_id: run.run_id.clone(),
            dataset_id: run.dataset_id.clone(),
            column_name: column.name.clone(),
            inferred_type: column.data_type.clone(),
            kind,
            total_count: total_rows,
            non_null_count: raw.non_null_count,
            missing_count: derived.missing_count,
            distinct_count: raw.distinct_count,
            zero_count: raw.zero_count,
            missing_pct: derived.missing_pct,
            distinct_pct: derived.distinct_pct,
            min_value: raw.min_value,
            max_value: raw.max_value,
            mean: raw.mean,
            avg_length: raw.avg_length,
            std_dev: raw.std_dev,
            invalid_date_count: raw.invalid_date_count,
            p25: raw.p25,
            p50: raw.p50,
            p75: raw.p75,
            p95: raw.p95,
            first_few_values: preview_values(dataset, index, self.settings.preview_values),
            top_values,
            alert_label: alert.to_string(),
        })
    }

    /// Approximate most frequent non-null values, most frequent first.
    async fn top_values(&self, relation: &str, column: &str) -> DbResult<Vec<String>> {
        let sql = format!(
            "SELECT UNNEST(top) FROM (\
             SELECT CAST(APPROX_TOP_K({col}, {budget}) AS VARCHAR[]) AS top FROM {relation})",
            col = quote_ident(column),
            budget = self.settings.top_k_candidates,
        );
        let result = self.db.query_rows(&sql).await?;
        Ok(result
            .rows
            .into_iter()
            .filter_map(|row| row.into_iter().next().flatten())
            .take(self.settings.top_k)
            .collect())
    }
}

#[cfg(test)]
#[path = "stats_test.rs"]
mod tests;
