//! End-to-end profiling runs against in-memory DuckDB.

use fp_core::{Config, MetadataKey, RunId};
use fp_db::Database;
use fp_profile::test_support::FaultyDatabase;
use fp_profile::{
    AuditStepRecord, ProfileError, ProfileOutcome, ProfileReport, ProfileRequest, Profiler,
    StepStatus,
};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

const COLUMN_PROFILE: &str = r#""memory"."profiling"."COLUMN_PROFILE""#;
const DATASET_PROFILE: &str = r#""memory"."profiling"."DATASET_PROFILE""#;
const AUDIT: &str = r#""memory"."profiling"."PROFILE_AUDIT_LOG""#;

const SEED: &str = "
    CREATE TABLE main.customers AS
        SELECT CAST(range AS INTEGER) AS id,
               'name_' || CAST(range % 3 AS VARCHAR) AS name,
               CAST(NULL AS VARCHAR) AS note
        FROM range(1, 11);
    CREATE TABLE main.empty_t (a INTEGER);";

// ── Helpers ────────────────────────────────────────────────────────────

async fn database(faults: &[&str]) -> Arc<dyn Database> {
    let mut db = FaultyDatabase::in_memory().unwrap();
    for fault in faults {
        db = db.fail_on(*fault);
    }
    db.inner().execute_batch(SEED).await.unwrap();
    Arc::new(db)
}

fn table_request(run_id: &str, table: &str) -> ProfileRequest {
    ProfileRequest {
        run_id: run_id.to_string(),
        dataset_id: "ds-customers".to_string(),
        dataset_name: "Customers".to_string(),
        database: Some("memory".to_string()),
        schema: Some("main".to_string()),
        table: Some(table.to_string()),
        custom_query: None,
    }
}

fn query_request(run_id: &str, sql: &str) -> ProfileRequest {
    ProfileRequest {
        run_id: run_id.to_string(),
        dataset_id: "ds-query".to_string(),
        dataset_name: "Ad hoc".to_string(),
        custom_query: Some(sql.to_string()),
        ..ProfileRequest::default()
    }
}

async fn rows_for(db: &Arc<dyn Database>, table: &str, run_id: &str) -> usize {
    db.query_count(&format!("SELECT * FROM {table} WHERE RUN_ID = '{run_id}'"))
        .await
        .unwrap()
}

async fn timeline(profiler: &Profiler, run_id: &str) -> Vec<AuditStepRecord> {
    profiler
        .timeline(&RunId::try_new(run_id).unwrap())
        .await
        .unwrap()
}

fn steps(records: &[AuditStepRecord]) -> Vec<(&str, StepStatus)> {
    records
        .iter()
        .map(|r| (r.step_name.as_str(), r.status))
        .collect()
}

fn completed(outcome: ProfileOutcome) -> ProfileReport {
    match outcome {
        ProfileOutcome::Completed(report) => report,
        ProfileOutcome::SkippedEmpty => panic!("expected a completed run"),
    }
}

async fn temp_relations(db: &Arc<dyn Database>) -> usize {
    db.query_count(
        "SELECT * FROM information_schema.tables WHERE table_name LIKE 'fp_tmp_%'",
    )
    .await
    .unwrap()
}

// ── Table mode ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_table_mode_profiles_and_writes() {
    let db = database(&[]).await;
    let profiler = Profiler::new(db.clone(), Config::default());

    let outcome = profiler
        .run_profile(&table_request("run-1", "customers"))
        .await
        .unwrap();
    assert_eq!(outcome.message(), "SUCCESS: Profiling Complete");
    let report = completed(outcome);

    assert_eq!(report.columns.len(), 3);
    assert_eq!(report.summary.total_rows, 10);
    assert_eq!(report.summary.total_columns, 3);
    assert_eq!(report.summary.total_missing_cells, 10);
    assert_eq!(report.summary.unique_values_sum, 13);
    assert_eq!(report.summary.duplicate_row_count, 0);

    let id = &report.columns[0];
    assert!(id.alert_label.contains("Unique Key"));
    assert_eq!(id.zero_count, 0);
    assert!(id.mean.is_some());
    assert_eq!(id.avg_length, None);

    let name = &report.columns[1];
    assert_eq!(name.distinct_count, 3);
    assert_eq!(name.mean, None);
    assert_eq!(name.p50, None);
    assert_eq!(name.avg_length, Some(6.0));
    assert_eq!(name.invalid_date_count, 10);

    let note = &report.columns[2];
    assert_eq!(note.missing_pct, 100.0);
    assert_eq!(note.distinct_count, 0);
    assert_eq!(note.alert_label, "High Nulls");

    for column in &report.columns {
        assert_eq!(column.missing_count + column.non_null_count, column.total_count);
    }

    assert_eq!(rows_for(&db, COLUMN_PROFILE, "run-1").await, 3);
    assert_eq!(rows_for(&db, DATASET_PROFILE, "run-1").await, 1);
    assert_eq!(
        steps(&timeline(&profiler, "run-1").await),
        vec![
            ("Load Data & Schema", StepStatus::Success),
            ("Calculate Native Column Stats", StepStatus::Success),
            ("Calculate Dataset Summary", StepStatus::Success),
            ("Write Results to Table", StepStatus::Success),
        ]
    );
}

#[tokio::test]
async fn test_empty_table_is_skipped() {
    let db = database(&[]).await;
    let profiler = Profiler::new(db.clone(), Config::default());

    let outcome = profiler
        .run_profile(&table_request("run-empty", "empty_t"))
        .await
        .unwrap();

    assert!(matches!(outcome, ProfileOutcome::SkippedEmpty));
    assert_eq!(outcome.message(), "SKIPPED: Empty Dataset");
    assert_eq!(rows_for(&db, COLUMN_PROFILE, "run-empty").await, 0);
    assert_eq!(rows_for(&db, DATASET_PROFILE, "run-empty").await, 0);
    assert_eq!(
        steps(&timeline(&profiler, "run-empty").await),
        vec![("Load Data & Schema", StepStatus::Success)]
    );
}

#[tokio::test]
async fn test_missing_table_fails_load_step() {
    let db = database(&[]).await;
    let profiler = Profiler::new(db.clone(), Config::default());

    let err = profiler
        .run_profile(&table_request("run-x", "nope"))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("memory.main.nope"));
    let records = timeline(&profiler, "run-x").await;
    assert_eq!(
        steps(&records),
        vec![("Load Data & Schema", StepStatus::Failure)]
    );
    assert!(records[0].message.as_deref().unwrap().contains("[D003]"));
}

#[tokio::test]
async fn test_repeated_runs_are_identical_and_independent() {
    let db = database(&[]).await;
    let profiler = Profiler::new(db.clone(), Config::default());

    let first = completed(
        profiler
            .run_profile(&table_request("run-a", "customers"))
            .await
            .unwrap(),
    );
    let second = completed(
        profiler
            .run_profile(&table_request("run-b", "customers"))
            .await
            .unwrap(),
    );

    for (a, b) in first.columns.iter().zip(&second.columns) {
        let mut b = b.clone();
        b.run_id = a.run_id.clone();
        assert_eq!(a, &b);
    }
    assert_eq!(timeline(&profiler, "run-a").await.len(), 4);
    assert_eq!(timeline(&profiler, "run-b").await.len(), 4);
    assert_eq!(rows_for(&db, COLUMN_PROFILE, "run-a").await, 3);
    assert_eq!(rows_for(&db, COLUMN_PROFILE, "run-b").await, 3);
}

// ── Query mode ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_query_mode_materializes_and_drops_temp_table() {
    let db = database(&[]).await;
    let profiler = Profiler::new(db.clone(), Config::default());

    let report = completed(
        profiler
            .run_profile(&query_request(
                "run-q",
                "SELECT id, name FROM main.customers WHERE id <= 4;",
            ))
            .await
            .unwrap(),
    );

    assert_eq!(report.summary.total_rows, 4);
    assert_eq!(report.columns.len(), 2);
    assert_eq!(temp_relations(&db).await, 0);

    let records = timeline(&profiler, "run-q").await;
    assert_eq!(
        steps(&records),
        vec![
            ("Create Temp Table", StepStatus::Success),
            ("Load Data & Schema", StepStatus::Success),
            ("Calculate Native Column Stats", StepStatus::Success),
            ("Calculate Dataset Summary", StepStatus::Success),
            ("Write Results to Table", StepStatus::Success),
            ("Cleanup Temp Table", StepStatus::Success),
        ]
    );
    assert_eq!(records[0].source_table, None);
    assert_eq!(
        records[0].custom_query.as_deref(),
        Some("SELECT id, name FROM main.customers WHERE id <= 4")
    );
}

#[tokio::test]
async fn test_empty_query_result_is_skipped_and_cleaned_up() {
    let db = database(&[]).await;
    let profiler = Profiler::new(db.clone(), Config::default());

    let outcome = profiler
        .run_profile(&query_request(
            "run-qe",
            "SELECT * FROM main.customers WHERE id < 0",
        ))
        .await
        .unwrap();

    assert!(matches!(outcome, ProfileOutcome::SkippedEmpty));
    assert_eq!(temp_relations(&db).await, 0);
    assert_eq!(
        steps(&timeline(&profiler, "run-qe").await),
        vec![
            ("Create Temp Table", StepStatus::Success),
            ("Load Data & Schema", StepStatus::Success),
            ("Cleanup Temp Table", StepStatus::Success),
        ]
    );
}

#[tokio::test]
async fn test_unparsable_query_fails_create_step() {
    let db = database(&[]).await;
    let profiler = Profiler::new(db.clone(), Config::default());

    let err = profiler
        .run_profile(&query_request("run-bad", "SELEC oops FROM"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProfileError::Db(_)));

    let records = timeline(&profiler, "run-bad").await;
    assert_eq!(
        steps(&records),
        vec![("Create Temp Table", StepStatus::Failure)]
    );
    assert!(records[0]
        .message
        .as_deref()
        .unwrap()
        .contains("Parser Error"));
    assert_eq!(rows_for(&db, COLUMN_PROFILE, "run-bad").await, 0);
    assert_eq!(rows_for(&db, DATASET_PROFILE, "run-bad").await, 0);
}

#[tokio::test]
async fn test_failed_phase_still_cleans_up() {
    let db = database(&["STDDEV_SAMP"]).await;
    let profiler = Profiler::new(db.clone(), Config::default());

    let err = profiler
        .run_profile(&query_request("run-f", "SELECT id FROM main.customers"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("injected fault"));
    assert_eq!(temp_relations(&db).await, 0);

    let records = timeline(&profiler, "run-f").await;
    assert_eq!(
        steps(&records),
        vec![
            ("Create Temp Table", StepStatus::Success),
            ("Load Data & Schema", StepStatus::Success),
            ("Calculate Native Column Stats", StepStatus::Failure),
            ("Cleanup Temp Table", StepStatus::Success),
        ]
    );
    assert!(records[2]
        .message
        .as_deref()
        .unwrap()
        .contains("STDDEV_SAMP"));
}

#[tokio::test]
async fn test_panicking_phase_still_cleans_up() {
    let db: Arc<dyn Database> = {
        let faulty = FaultyDatabase::in_memory().unwrap().panic_on("STDDEV_SAMP");
        faulty.inner().execute_batch(SEED).await.unwrap();
        Arc::new(faulty)
    };
    let profiler = Profiler::new(db.clone(), Config::default());

    let request = query_request("run-panic", "SELECT id FROM main.customers");
    let result = AssertUnwindSafe(profiler.run_profile(&request))
        .catch_unwind()
        .await;
    assert!(result.is_err(), "the panic must reach the caller");
    assert_eq!(temp_relations(&db).await, 0);

    let records = timeline(&profiler, "run-panic").await;
    assert_eq!(
        steps(&records),
        vec![
            ("Create Temp Table", StepStatus::Success),
            ("Load Data & Schema", StepStatus::Success),
            ("Calculate Native Column Stats", StepStatus::Failure),
            ("Cleanup Temp Table", StepStatus::Success),
        ]
    );
}

#[tokio::test]
async fn test_cleanup_failure_is_only_a_warning() {
    let db = database(&["DROP TABLE IF EXISTS"]).await;
    let profiler = Profiler::new(db.clone(), Config::default());

    let outcome = profiler
        .run_profile(&query_request("run-c", "SELECT id FROM main.customers"))
        .await
        .unwrap();

    assert_eq!(outcome.message(), "SUCCESS: Profiling Complete");
    let records = timeline(&profiler, "run-c").await;
    let last = records.last().unwrap();
    assert_eq!(last.step_name, "Cleanup Temp Table");
    assert_eq!(last.status, StepStatus::Failure);
}

// ── Best-effort degradation ────────────────────────────────────────────

#[tokio::test]
async fn test_duplicate_count_failure_uses_sentinel() {
    let db = database(&["hash("]).await;
    let profiler = Profiler::new(db.clone(), Config::default());

    let report = completed(
        profiler
            .run_profile(&table_request("run-d", "customers"))
            .await
            .unwrap(),
    );

    assert_eq!(report.summary.duplicate_row_count, -1);
    let stored = db
        .query_one(&format!(
            "SELECT CAST(DUPLICATE_ROW_COUNT AS VARCHAR) FROM {DATASET_PROFILE} \
             WHERE RUN_ID = 'run-d'"
        ))
        .await
        .unwrap();
    assert_eq!(stored.as_deref(), Some("-1"));
    assert!(timeline(&profiler, "run-d")
        .await
        .iter()
        .all(|r| r.status == StepStatus::Success));
}

#[tokio::test]
async fn test_size_and_top_k_failures_degrade() {
    let db = database(&["SIZE OF", "APPROX_TOP_K"]).await;
    let profiler = Profiler::new(db.clone(), Config::default());

    let report = completed(
        profiler
            .run_profile(&table_request("run-s", "customers"))
            .await
            .unwrap(),
    );

    assert_eq!(report.summary.size_gb, 0.0);
    assert!(report.columns.iter().all(|c| c.top_values.is_empty()));
}

#[tokio::test]
async fn test_broken_audit_store_does_not_fail_run() {
    let insert = format!("INSERT INTO {AUDIT}");
    let update = format!("UPDATE {AUDIT}");
    let db = database(&[insert.as_str(), update.as_str()]).await;
    let profiler = Profiler::new(db.clone(), Config::default());

    let outcome = profiler
        .run_profile(&table_request("run-ba", "customers"))
        .await
        .unwrap();

    assert_eq!(outcome.message(), "SUCCESS: Profiling Complete");
    assert!(timeline(&profiler, "run-ba").await.is_empty());
    assert_eq!(rows_for(&db, COLUMN_PROFILE, "run-ba").await, 3);
}

#[tokio::test]
async fn test_write_failure_fails_the_write_step() {
    let fault = format!("INSERT INTO {DATASET_PROFILE}");
    let db = database(&[fault.as_str()]).await;
    let profiler = Profiler::new(db.clone(), Config::default());

    profiler
        .run_profile(&table_request("run-w", "customers"))
        .await
        .unwrap_err();

    let records = timeline(&profiler, "run-w").await;
    assert_eq!(
        records.last().map(|r| (r.step_name.as_str(), r.status)),
        Some(("Write Results to Table", StepStatus::Failure))
    );
    // column rows written before the failure stay
    assert_eq!(rows_for(&db, COLUMN_PROFILE, "run-w").await, 3);
}

// ── Configuration errors ───────────────────────────────────────────────

#[tokio::test]
async fn test_invalid_source_fails_before_any_audit() {
    let db = database(&[]).await;
    let profiler = Profiler::new(db.clone(), Config::default());

    let mut request = table_request("run-cfg", "customers");
    request.custom_query = Some("SELECT 1".to_string());
    let err = profiler.run_profile(&request).await.unwrap_err();

    assert!(matches!(err, ProfileError::Config(_)));
    let audit = MetadataKey::new("memory", "profiling", "PROFILE_AUDIT_LOG");
    assert!(!db.relation_exists(&audit).await.unwrap());
}

#[tokio::test]
async fn test_blank_strings_count_as_absent() {
    let db = database(&[]).await;
    let profiler = Profiler::new(db.clone(), Config::default());

    let mut request = query_request("run-blank", "SELECT 1 AS one");
    request.table = Some("   ".to_string());
    let report = completed(profiler.run_profile(&request).await.unwrap());
    assert_eq!(report.summary.total_rows, 1);

    let mut neither = query_request("run-none", "");
    neither.table = Some(String::new());
    let err = profiler.run_profile(&neither).await.unwrap_err();
    assert!(matches!(err, ProfileError::Config(_)));
}

#[tokio::test]
async fn test_invalid_config_fails_before_any_audit() {
    let db = database(&[]).await;
    let mut config = Config::default();
    config.profiling.top_k = 0;
    let profiler = Profiler::new(db.clone(), config);

    let err = profiler
        .run_profile(&table_request("run-cfg", "customers"))
        .await
        .unwrap_err();

    assert!(matches!(err, ProfileError::Config(_)));
    let audit = MetadataKey::new("memory", "profiling", "PROFILE_AUDIT_LOG");
    assert!(!db.relation_exists(&audit).await.unwrap());
}
