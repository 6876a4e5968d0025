//! Configuration types and parsing for featherprobe.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default maximum size of an audit failure message (16 MiB).
pub const DEFAULT_AUDIT_MESSAGE_MAX_BYTES: usize = 16 * 1024 * 1024;

/// Upper bound on `profiling.preview_values`.
pub const MAX_PREVIEW_VALUES: usize = 5;

/// Main configuration from featherprobe.yml
///
/// Every section has defaults, so an empty file is a valid configuration
/// that profiles an in-memory DuckDB database.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Where profile results and the audit trail are written
    #[serde(default)]
    pub output: OutputConfig,

    /// Where query-mode inputs are materialized
    #[serde(default)]
    pub scratch: ScratchConfig,

    /// Profiling tunables
    #[serde(default)]
    pub profiling: ProfilingConfig,
}

/// Database type selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    /// DuckDB (default)
    #[default]
    DuckDb,
    /// Snowflake
    Snowflake,
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database type (duckdb or snowflake)
    #[serde(rename = "type", default)]
    pub db_type: DbType,

    /// Database path (for DuckDB file-based or :memory:)
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: DbType::default(),
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    ":memory:".to_string()
}

/// Output store locations.
///
/// `database: None` means the connection's current database.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default)]
    pub database: Option<String>,

    #[serde(default = "default_output_schema")]
    pub schema: String,

    /// One row per column per run
    #[serde(default = "default_column_profile_table")]
    pub column_profile_table: String,

    /// One row per run
    #[serde(default = "default_dataset_profile_table")]
    pub dataset_profile_table: String,

    /// One row per execution step per run
    #[serde(default = "default_audit_table")]
    pub audit_table: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database: None,
            schema: default_output_schema(),
            column_profile_table: default_column_profile_table(),
            dataset_profile_table: default_dataset_profile_table(),
            audit_table: default_audit_table(),
        }
    }
}

fn default_output_schema() -> String {
    "profiling".to_string()
}

fn default_column_profile_table() -> String {
    "COLUMN_PROFILE".to_string()
}

fn default_dataset_profile_table() -> String {
    "DATASET_PROFILE".to_string()
}

fn default_audit_table() -> String {
    "PROFILE_AUDIT_LOG".to_string()
}

/// Framework-owned location for temporary relations created from queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScratchConfig {
    #[serde(default)]
    pub database: Option<String>,

    #[serde(default = "default_scratch_schema")]
    pub schema: String,
}

impl Default for ScratchConfig {
    fn default() -> Self {
        Self {
            database: None,
            schema: default_scratch_schema(),
        }
    }
}

fn default_scratch_schema() -> String {
    "profiling_tmp".to_string()
}

/// Profiling tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfilingConfig {
    /// Rows drawn from the head of the relation for previews
    #[serde(default = "default_sample_rows")]
    pub sample_rows: usize,

    /// Maximum non-null values kept per column preview (1..=5)
    #[serde(default = "default_preview_values")]
    pub preview_values: usize,

    /// Number of approximate frequent values kept per column
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Candidates requested from the approximate top-k estimator
    #[serde(default = "default_top_k_candidates")]
    pub top_k_candidates: usize,

    /// `missing_pct` above which a column is flagged "High Nulls"
    #[serde(default = "default_high_null_threshold_pct")]
    pub high_null_threshold_pct: f64,

    /// Audit failure messages are truncated to this many bytes
    #[serde(default = "default_audit_message_max_bytes")]
    pub audit_message_max_bytes: usize,
}

impl Default for ProfilingConfig {
    fn default() -> Self {
        Self {
            sample_rows: default_sample_rows(),
            preview_values: default_preview_values(),
            top_k: default_top_k(),
            top_k_candidates: default_top_k_candidates(),
            high_null_threshold_pct: default_high_null_threshold_pct(),
            audit_message_max_bytes: default_audit_message_max_bytes(),
        }
    }
}

fn default_sample_rows() -> usize {
    5
}

fn default_preview_values() -> usize {
    5
}

fn default_top_k() -> usize {
    5
}

fn default_top_k_candidates() -> usize {
    50
}

fn default_high_null_threshold_pct() -> f64 {
    80.0
}

fn default_audit_message_max_bytes() -> usize {
    DEFAULT_AUDIT_MESSAGE_MAX_BYTES
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml(&content)
    }

    /// Load configuration from a directory
    /// Looks for featherprobe.yml or featherprobe.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("featherprobe.yml");
        let yaml_path = dir.join("featherprobe.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Parse and validate configuration from YAML text.
    ///
    /// An empty document yields the default configuration.
    pub fn from_yaml(content: &str) -> CoreResult<Self> {
        let config: Config = if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        let names = [
            ("output.schema", &self.output.schema),
            ("output.column_profile_table", &self.output.column_profile_table),
            ("output.dataset_profile_table", &self.output.dataset_profile_table),
            ("output.audit_table", &self.output.audit_table),
            ("scratch.schema", &self.scratch.schema),
        ];
        for (field, value) in names {
            if value.trim().is_empty() {
                return Err(CoreError::ConfigInvalid {
                    message: format!("{field} cannot be empty"),
                });
            }
        }

        let tables = [
            &self.output.column_profile_table,
            &self.output.dataset_profile_table,
            &self.output.audit_table,
        ];
        for (i, a) in tables.iter().enumerate() {
            if tables
                .iter()
                .skip(i + 1)
                .any(|b| a.eq_ignore_ascii_case(b))
            {
                return Err(CoreError::ConfigInvalid {
                    message: format!("output table '{a}' is configured more than once"),
                });
            }
        }

        let p = &self.profiling;
        if !(1..=MAX_PREVIEW_VALUES).contains(&p.preview_values) {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "profiling.preview_values must be within 1..={MAX_PREVIEW_VALUES}, got {}",
                    p.preview_values
                ),
            });
        }
        if p.top_k == 0 || p.top_k_candidates < p.top_k {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "profiling.top_k_candidates ({}) must be >= top_k ({}) and top_k must be positive",
                    p.top_k_candidates, p.top_k
                ),
            });
        }
        if !(0.0..=100.0).contains(&p.high_null_threshold_pct) {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "profiling.high_null_threshold_pct must be within 0..=100, got {}",
                    p.high_null_threshold_pct
                ),
            });
        }
        if p.audit_message_max_bytes == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "profiling.audit_message_max_bytes must be positive".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
