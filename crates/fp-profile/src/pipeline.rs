//! The profiling pipeline.
//!
//! Resolve, load, per-column statistics, summary, write, cleanup. Every phase
//! runs inside an audited scope, and the temporary relation of a query-mode
//! run is dropped whatever happened before.

use crate::audit::{AuditLog, AuditStep, AuditStepRecord};
use crate::best_effort::best_effort;
use crate::error::ProfileResult;
use crate::resolver::DatasetResolver;
use crate::stats::ColumnStatsEngine;
use crate::store::OutputTables;
use crate::summary::SummaryAggregator;
use crate::writer::ResultWriter;
use fp_core::profile::{ColumnProfile, DatasetProfile};
use fp_core::{Config, CoreResult, MetadataKey, ProfileRun, RunId};
use fp_db::Database;
use futures::FutureExt;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Loose invocation fields of one profiling run.
///
/// Exactly one of `table` and `custom_query` must be non-empty; in table
/// mode `database` and `schema` are required as well.
#[derive(Debug, Clone, Default)]
pub struct ProfileRequest {
    pub run_id: String,
    pub dataset_id: String,
    pub dataset_name: String,
    pub database: Option<String>,
    pub schema: Option<String>,
    pub table: Option<String>,
    pub custom_query: Option<String>,
}

impl ProfileRequest {
    /// Validate into a [`ProfileRun`].
    pub fn to_run(&self) -> CoreResult<ProfileRun> {
        ProfileRun::from_invocation(
            &self.run_id,
            &self.dataset_id,
            &self.dataset_name,
            self.database.as_deref(),
            self.schema.as_deref(),
            self.table.as_deref(),
            self.custom_query.as_deref(),
        )
    }
}

/// Everything a completed run computed and wrote.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileReport {
    pub columns: Vec<ColumnProfile>,
    pub summary: DatasetProfile,
}

/// Terminal outcome of a run that did not fail.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", content = "report", rename_all = "snake_case")]
pub enum ProfileOutcome {
    Completed(ProfileReport),
    SkippedEmpty,
}

impl ProfileOutcome {
    pub const SUCCESS_MESSAGE: &'static str = "SUCCESS: Profiling Complete";
    pub const SKIPPED_MESSAGE: &'static str = "SKIPPED: Empty Dataset";

    /// Result message of the run.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Completed(_) => Self::SUCCESS_MESSAGE,
            Self::SkippedEmpty => Self::SKIPPED_MESSAGE,
        }
    }

    pub fn report(&self) -> Option<&ProfileReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::SkippedEmpty => None,
        }
    }
}

/// Profiles datasets on one database with one configuration.
pub struct Profiler {
    db: Arc<dyn Database>,
    config: Config,
}

impl Profiler {
    pub fn new(db: Arc<dyn Database>, config: Config) -> Self {
        Self { db, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run one profiling invocation.
    ///
    /// Configuration and invocation errors are returned before anything is
    /// audited. Phase failures are recorded in the audit table and returned
    /// unchanged; results written by earlier phases stay in place.
    pub async fn run_profile(&self, request: &ProfileRequest) -> ProfileResult<ProfileOutcome> {
        self.config.validate()?;
        let run = request.to_run()?;
        log::info!(
            "Profiling {} ({} mode) as run {}",
            run.dataset_name,
            run.source.mode(),
            run.run_id
        );

        let db = self.db.as_ref();
        let tables = OutputTables::prepare(db, &self.config.output).await?;
        let audit = AuditLog::new(
            self.db.clone(),
            tables.audit.clone(),
            &run,
            self.config.profiling.audit_message_max_bytes,
        );
        let resolver =
            DatasetResolver::new(db, &self.config.scratch, self.config.profiling.sample_rows);

        let source = resolver.resolve(&run, &audit).await?;
        let result = AssertUnwindSafe(self.profile_relation(
            &run,
            &audit,
            &resolver,
            &tables,
            &source.key,
        ))
        .catch_unwind()
        .await;
        if source.temporary {
            let cleanup = audit
                .scoped(AuditStep::CleanupTempTable, resolver.cleanup(&source.key))
                .await;
            best_effort(&format!("cleanup of {}", source.key), (), cleanup);
        }
        match result {
            Ok(outcome) => outcome,
            Err(payload) => std::panic::resume_unwind(payload),
        }
    }

    async fn profile_relation(
        &self,
        run: &ProfileRun,
        audit: &AuditLog,
        resolver: &DatasetResolver<'_>,
        tables: &OutputTables,
        key: &MetadataKey,
    ) -> ProfileResult<ProfileOutcome> {
        let db = self.db.as_ref();

        let dataset = audit.scoped(AuditStep::LoadData, resolver.load(key)).await?;
        if dataset.is_empty() {
            log::info!("{key} is empty, skipping run {}", run.run_id);
            return Ok(ProfileOutcome::SkippedEmpty);
        }

        let engine = ColumnStatsEngine::new(db, &self.config.profiling);
        let columns = audit
            .scoped(
                AuditStep::ColumnStats,
                engine.profile_columns(run, &dataset),
            )
            .await?;

        let summary = audit
            .scoped(AuditStep::DatasetSummary, async {
                Ok(SummaryAggregator::new(db)
                    .summarize(run, &dataset, &columns)
                    .await)
            })
            .await?;

        audit
            .scoped(
                AuditStep::WriteResults,
                ResultWriter::new(db, tables).write(&columns, &summary),
            )
            .await?;

        log::info!(
            "Profiled {} columns of {} for run {}",
            columns.len(),
            run.dataset_name,
            run.run_id
        );
        Ok(ProfileOutcome::Completed(ProfileReport { columns, summary }))
    }

    /// Audit rows of `run_id` in insertion order.
    pub async fn timeline(&self, run_id: &RunId) -> ProfileResult<Vec<AuditStepRecord>> {
        let tables = OutputTables::resolve(self.db.as_ref(), &self.config.output).await?;
        AuditLog::timeline(self.db.as_ref(), &tables.audit, run_id).await
    }
}
