//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use fp_core::{Config, CoreError};
use fp_db::Database;
use fp_profile::Profiler;
use std::path::Path;

use crate::cli::GlobalArgs;

/// Load the configuration named by the global flags.
///
/// An explicit `--config` must exist. Without one, a missing
/// `featherprobe.yml` in the project directory falls back to the defaults.
pub(crate) fn load_config(global: &GlobalArgs) -> Result<Config> {
    let mut config = match &global.config {
        Some(path) => Config::load(Path::new(path))
            .with_context(|| format!("Failed to load config from {path}"))?,
        None => match Config::load_from_dir(Path::new(&global.project_dir)) {
            Ok(config) => config,
            Err(CoreError::ConfigNotFound { path }) => {
                log::debug!("No config at {path}, using defaults");
                Config::default()
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to load config from {}", global.project_dir)
                })
            }
        },
    };

    if let Some(path) = &global.database_path {
        config.database.path = path.clone();
    }
    Ok(config)
}

/// Connect to the configured database and build a profiler.
pub(crate) fn open_profiler(global: &GlobalArgs) -> Result<Profiler> {
    let config = load_config(global)?;
    let db = fp_db::connect(&config.database).with_context(|| {
        format!(
            "Failed to open {:?} database at {}",
            config.database.db_type, config.database.path
        )
    })?;
    log::debug!("Connected to {} at {}", db.db_type(), config.database.path);
    Ok(Profiler::new(db, config))
}

/// Render an optional value for table output.
pub(crate) fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global(dir: &Path) -> GlobalArgs {
        GlobalArgs {
            verbose: false,
            project_dir: dir.display().to_string(),
            config: None,
            database_path: None,
        }
    }

    #[test]
    fn test_missing_project_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&global(dir.path())).unwrap();
        assert_eq!(config.database.path, ":memory:");
        assert_eq!(config.output.schema, "profiling");
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = global(dir.path());
        args.config = Some(dir.path().join("nope.yml").display().to_string());
        assert!(load_config(&args).is_err());
    }

    #[test]
    fn test_database_path_override() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("featherprobe.yml"),
            "database:\n  path: warehouse.duckdb\noutput:\n  schema: stats\n",
        )
        .unwrap();

        let config = load_config(&global(dir.path())).unwrap();
        assert_eq!(config.database.path, "warehouse.duckdb");
        assert_eq!(config.output.schema, "stats");

        let mut args = global(dir.path());
        args.database_path = Some(":memory:".to_string());
        assert_eq!(load_config(&args).unwrap().database.path, ":memory:");
    }

    #[test]
    fn test_invalid_project_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("featherprobe.yml"), "bogus_key: 1\n").unwrap();
        assert!(load_config(&global(dir.path())).is_err());
    }

    #[test]
    fn test_or_dash() {
        assert_eq!(or_dash(Some(1.5)), "1.5");
        assert_eq!(or_dash::<String>(None), "-");
    }
}
