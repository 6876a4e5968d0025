//! Profile records and the pure metric logic behind them.
//!
//! Nothing in this module talks to a database: counts come in, derived
//! percentages and alert labels come out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::{DatasetId, RunId};

/// Capability class of a column, resolved once from its engine type name.
///
/// The kind decides which aggregates are requested for the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Text,
    Other,
}

const NUMERIC_TYPES: &[&str] = &[
    "TINYINT", "SMALLINT", "INTEGER", "INT", "INT1", "INT2", "INT4", "INT8", "BIGINT", "HUGEINT",
    "UTINYINT", "USMALLINT", "UINTEGER", "UBIGINT", "UHUGEINT", "FLOAT", "FLOAT4", "FLOAT8",
    "REAL", "DOUBLE", "DECIMAL", "NUMERIC", "NUMBER",
];

const TEXT_TYPES: &[&str] = &["VARCHAR", "TEXT", "STRING", "CHAR", "BPCHAR", "CHARACTER"];

impl ColumnKind {
    /// Classify an engine type name such as `BIGINT`, `DECIMAL(18,2)` or
    /// `VARCHAR(20)`. Anything unrecognised is [`ColumnKind::Other`].
    pub fn classify(type_name: &str) -> Self {
        let upper = type_name.trim().to_ascii_uppercase();
        let base = upper
            .split(|c: char| c == '(' || c.is_whitespace())
            .next()
            .unwrap_or_default();

        if NUMERIC_TYPES.contains(&base) {
            Self::Numeric
        } else if TEXT_TYPES.contains(&base) {
            Self::Text
        } else {
            Self::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Text => "text",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `part / whole * 100`, or `0.0` when `whole` is zero.
pub fn percent(part: i64, whole: i64) -> f64 {
    if whole <= 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

/// Missing/distinct counts and percentages derived from raw aggregates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedMetrics {
    pub missing_count: i64,
    pub missing_pct: f64,
    pub distinct_pct: f64,
}

impl DerivedMetrics {
    pub fn compute(total_rows: i64, non_null_count: i64, distinct_count: i64) -> Self {
        let missing_count = (total_rows - non_null_count).max(0);
        Self {
            missing_count,
            missing_pct: percent(missing_count, total_rows),
            distinct_pct: percent(distinct_count, total_rows),
        }
    }
}

/// Alert classification of a column.
///
/// Labels are evaluated in a fixed order and joined with `", "`; a column
/// with no label renders as `"OK"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertLabel {
    labels: Vec<&'static str>,
}

impl AlertLabel {
    pub const HIGH_NULLS: &'static str = "High Nulls";
    pub const UNIQUE_KEY: &'static str = "Unique Key";
    pub const OK: &'static str = "OK";

    /// Apply the alert rules.
    ///
    /// "Unique Key" fires when `distinct_pct` is exactly 100, which for exact
    /// counts is `distinct_count == total_rows`; the count form avoids float
    /// rounding on very large tables.
    pub fn classify(
        total_rows: i64,
        distinct_count: i64,
        missing_pct: f64,
        high_null_threshold_pct: f64,
    ) -> Self {
        let mut labels = Vec::new();
        if missing_pct > high_null_threshold_pct {
            labels.push(Self::HIGH_NULLS);
        }
        if total_rows > 0 && distinct_count >= total_rows {
            labels.push(Self::UNIQUE_KEY);
        }
        Self { labels }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(&label)
    }

    pub fn is_ok(&self) -> bool {
        self.labels.is_empty()
    }
}

impl fmt::Display for AlertLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.labels.is_empty() {
            f.write_str(Self::OK)
        } else {
            f.write_str(&self.labels.join(", "))
        }
    }
}

/// Statistics for one column of one run.
///
/// Numeric-only fields are `None`/`0` for other kinds, and text-only fields
/// likewise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub run_id: RunId,
    pub dataset_id: DatasetId,
    pub column_name: String,
    /// Engine type name as reported by the relation schema
    pub inferred_type: String,
    pub kind: ColumnKind,
    pub total_count: i64,
    pub non_null_count: i64,
    pub missing_count: i64,
    pub distinct_count: i64,
    pub zero_count: i64,
    pub missing_pct: f64,
    pub distinct_pct: f64,
    pub min_value: Option<String>,
    pub max_value: Option<String>,
    pub mean: Option<f64>,
    pub avg_length: Option<f64>,
    pub std_dev: Option<f64>,
    pub invalid_date_count: i64,
    pub p25: Option<f64>,
    pub p50: Option<f64>,
    pub p75: Option<f64>,
    pub p95: Option<f64>,
    pub first_few_values: Vec<String>,
    /// Approximate most frequent values; empty when estimation failed
    pub top_values: Vec<String>,
    pub alert_label: String,
}

/// Dataset-level summary of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub run_id: RunId,
    pub dataset_id: DatasetId,
    pub dataset_name: String,
    pub total_rows: i64,
    pub total_columns: i64,
    /// Best-effort on-disk size; `0.0` when the catalog lookup failed
    pub size_gb: f64,
    pub total_missing_cells: i64,
    pub null_percent: f64,
    /// Sum of per-column distinct counts, not a cross-column distinct count
    pub unique_values_sum: i64,
    /// `-1` when the duplicate computation failed
    pub duplicate_row_count: i64,
    pub profiled_at: DateTime<Utc>,
}

impl DatasetProfile {
    /// Sentinel stored in `duplicate_row_count` when it could not be computed.
    pub const DUPLICATES_UNKNOWN: i64 = -1;
}

#[cfg(test)]
#[path = "profile_test.rs"]
mod tests;
