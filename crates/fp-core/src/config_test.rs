use super::*;

#[test]
fn test_empty_config_uses_defaults() {
    let config = Config::from_yaml("").unwrap();
    assert_eq!(config.database.db_type, DbType::DuckDb);
    assert_eq!(config.database.path, ":memory:");
    assert_eq!(config.output.schema, "profiling");
    assert_eq!(config.output.column_profile_table, "COLUMN_PROFILE");
    assert_eq!(config.output.dataset_profile_table, "DATASET_PROFILE");
    assert_eq!(config.output.audit_table, "PROFILE_AUDIT_LOG");
    assert_eq!(config.scratch.schema, "profiling_tmp");
    assert_eq!(config.profiling.sample_rows, 5);
    assert_eq!(config.profiling.top_k, 5);
    assert_eq!(config.profiling.top_k_candidates, 50);
    assert_eq!(
        config.profiling.audit_message_max_bytes,
        DEFAULT_AUDIT_MESSAGE_MAX_BYTES
    );
}

#[test]
fn test_parse_full_config() {
    let yaml = r#"
database:
  type: duckdb
  path: "./warehouse.duckdb"
output:
  database: warehouse
  schema: observability
  column_profile_table: COL_STATS
  dataset_profile_table: DS_STATS
  audit_table: RUN_LOG
scratch:
  schema: scratch
profiling:
  sample_rows: 10
  top_k: 3
  top_k_candidates: 30
"#;
    let config = Config::from_yaml(yaml).unwrap();
    assert_eq!(config.database.path, "./warehouse.duckdb");
    assert_eq!(config.output.database.as_deref(), Some("warehouse"));
    assert_eq!(config.output.audit_table, "RUN_LOG");
    assert_eq!(config.scratch.schema, "scratch");
    assert!(config.scratch.database.is_none());
    assert_eq!(config.profiling.sample_rows, 10);
    assert_eq!(config.profiling.preview_values, 5);
}

#[test]
fn test_snowflake_type() {
    let config = Config::from_yaml("database:\n  type: snowflake\n").unwrap();
    assert_eq!(config.database.db_type, DbType::Snowflake);
}

#[test]
fn test_unknown_field_rejected() {
    let err = Config::from_yaml("outputs:\n  schema: x\n").unwrap_err();
    assert!(matches!(err, CoreError::YamlParse(_)));
}

#[test]
fn test_duplicate_output_tables_rejected() {
    let yaml = "output:\n  column_profile_table: same\n  audit_table: SAME\n";
    let err = Config::from_yaml(yaml).unwrap_err();
    assert!(err.to_string().contains("[C002]"));
}

#[test]
fn test_top_k_budget_must_cover_k() {
    let yaml = "profiling:\n  top_k: 10\n  top_k_candidates: 5\n";
    assert!(Config::from_yaml(yaml).is_err());
}

#[test]
fn test_preview_values_capped_at_five() {
    let ok = Config::from_yaml("profiling:\n  preview_values: 5\n").unwrap();
    assert_eq!(ok.profiling.preview_values, 5);

    let err = Config::from_yaml("profiling:\n  preview_values: 6\n").unwrap_err();
    assert!(matches!(err, CoreError::ConfigInvalid { .. }));
    assert!(err.to_string().contains("preview_values"));
    assert!(Config::from_yaml("profiling:\n  preview_values: 0\n").is_err());
}

#[test]
fn test_blank_schema_rejected() {
    assert!(Config::from_yaml("scratch:\n  schema: \"  \"\n").is_err());
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(&dir.path().join("featherprobe.yml")).unwrap_err();
    assert!(matches!(err, CoreError::ConfigNotFound { .. }));
}

#[test]
fn test_load_from_dir_prefers_yml() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("featherprobe.yml"),
        "output:\n  schema: from_yml\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("featherprobe.yaml"),
        "output:\n  schema: from_yaml\n",
    )
    .unwrap();
    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.output.schema, "from_yml");
}
