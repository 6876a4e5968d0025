//! Step-level audit trail of a profiling run.
//!
//! Each phase gets one row, inserted as STARTED when the phase begins and
//! updated in place to SUCCESS or FAILURE when it ends. Audit writes are
//! best-effort: a broken audit table is logged and never fails the phase it
//! wraps.

use crate::error::{ProfileError, ProfileResult};
use chrono::{NaiveDateTime, Utc};
use fp_core::sql_utils::string_literal;
use fp_core::{ProfileRun, RunId};
use fp_db::Database;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

/// The fixed set of audited phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditStep {
    CreateTempTable,
    LoadData,
    ColumnStats,
    DatasetSummary,
    WriteResults,
    CleanupTempTable,
}

impl AuditStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateTempTable => "Create Temp Table",
            Self::LoadData => "Load Data & Schema",
            Self::ColumnStats => "Calculate Native Column Stats",
            Self::DatasetSummary => "Calculate Dataset Summary",
            Self::WriteResults => "Write Results to Table",
            Self::CleanupTempTable => "Cleanup Temp Table",
        }
    }
}

impl fmt::Display for AuditStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of an audit row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StepStatus {
    Started,
    Success,
    Failure,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "STARTED",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "STARTED" => Some(Self::Started),
            "SUCCESS" => Some(Self::Success),
            "FAILURE" => Some(Self::Failure),
            _ => None,
        }
    }
}

/// An audit row as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStepRecord {
    pub run_id: String,
    pub dataset_id: String,
    pub dataset_name: String,
    pub source_database: Option<String>,
    pub source_schema: Option<String>,
    pub source_table: Option<String>,
    pub custom_query: Option<String>,
    pub step_seq: i32,
    pub step_name: String,
    pub status: StepStatus,
    pub message: Option<String>,
    pub started_at: String,
    pub ended_at: Option<String>,
}

/// Proof that a step was begun; consumed by [`AuditLog::end`].
#[derive(Debug)]
#[must_use = "a begun step must be ended"]
pub struct StepHandle {
    step: AuditStep,
    seq: i32,
}

impl StepHandle {
    pub fn step(&self) -> AuditStep {
        self.step
    }
}

/// Truncate `text` to at most `max_bytes`, backing off to a char boundary.
pub fn truncate_message(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

fn timestamp_literal(ts: NaiveDateTime) -> String {
    format!("CAST('{}' AS TIMESTAMP)", ts.format("%Y-%m-%d %H:%M:%S%.6f"))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic: <non-string payload>".to_string()
    }
}

/// Audit writer bound to one run.
pub struct AuditLog {
    db: Arc<dyn Database>,
    table: String,
    run: ProfileRun,
    max_message_bytes: usize,
    next_seq: AtomicI32,
}

impl AuditLog {
    /// `table` is the quoted audit table reference.
    pub fn new(
        db: Arc<dyn Database>,
        table: impl Into<String>,
        run: &ProfileRun,
        max_message_bytes: usize,
    ) -> Self {
        Self {
            db,
            table: table.into(),
            run: run.clone(),
            max_message_bytes,
            next_seq: AtomicI32::new(1),
        }
    }

    /// Insert a STARTED row for `step`.
    pub async fn begin(&self, step: AuditStep) -> StepHandle {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let source = &self.run.source;
        let sql = format!(
            "INSERT INTO {} (RUN_ID, DATASET_ID, DATASET_NAME, SOURCE_DATABASE, SOURCE_SCHEMA, \
             SOURCE_TABLE, CUSTOM_QUERY, STEP_SEQ, STEP_NAME, STATUS, MESSAGE, STARTED_AT) \
             VALUES ({}, {}, {}, {}, {}, {}, {}, {seq}, {}, {}, NULL, {})",
            self.table,
            string_literal(Some(self.run.run_id.as_str())),
            string_literal(Some(self.run.dataset_id.as_str())),
            string_literal(Some(&self.run.dataset_name)),
            string_literal(source.database()),
            string_literal(source.schema()),
            string_literal(source.table()),
            string_literal(source.custom_query()),
            string_literal(Some(step.as_str())),
            string_literal(Some(StepStatus::Started.as_str())),
            timestamp_literal(Utc::now().naive_utc()),
        );
        if let Err(e) = self.db.execute(&sql).await {
            log::warn!(
                "Audit: failed to record start of '{step}' for run {}: {e}",
                self.run.run_id
            );
        }
        log::info!("[{}] {step}: started", self.run.run_id);
        StepHandle { step, seq }
    }

    /// Move the STARTED row of `handle` to its terminal status.
    pub async fn end(&self, handle: StepHandle, status: StepStatus, message: Option<&str>) {
        let message = message.map(|m| truncate_message(m, self.max_message_bytes));
        let sql = format!(
            "UPDATE {} SET STATUS = {}, MESSAGE = {}, ENDED_AT = {} \
             WHERE RUN_ID = {} AND STEP_NAME = {} AND STATUS = {}",
            self.table,
            string_literal(Some(status.as_str())),
            string_literal(message),
            timestamp_literal(Utc::now().naive_utc()),
            string_literal(Some(self.run.run_id.as_str())),
            string_literal(Some(handle.step.as_str())),
            string_literal(Some(StepStatus::Started.as_str())),
        );
        match self.db.execute(&sql).await {
            Ok(0) => log::warn!(
                "Audit: no STARTED row for '{}' (seq {}) in run {}",
                handle.step,
                handle.seq,
                self.run.run_id
            ),
            Ok(_) => {}
            Err(e) => log::warn!(
                "Audit: failed to record {} of '{}' for run {}: {e}",
                status.as_str(),
                handle.step,
                self.run.run_id
            ),
        }
        match status {
            StepStatus::Failure => log::warn!("[{}] {}: failed", self.run.run_id, handle.step),
            _ => log::info!("[{}] {}: {}", self.run.run_id, handle.step, status.as_str()),
        }
    }

    /// Run `work` as the audited step `step`.
    ///
    /// The row is finalized on every exit path: SUCCESS on `Ok`, FAILURE with
    /// the error's diagnostic text on `Err`, FAILURE with the panic message on
    /// panic. The original result is returned, and a panic is resumed, after
    /// the row is finalized.
    pub async fn scoped<T, F>(&self, step: AuditStep, work: F) -> ProfileResult<T>
    where
        F: Future<Output = ProfileResult<T>>,
    {
        let handle = self.begin(step).await;
        match AssertUnwindSafe(work).catch_unwind().await {
            Ok(Ok(value)) => {
                self.end(handle, StepStatus::Success, None).await;
                Ok(value)
            }
            Ok(Err(err)) => {
                self.end(handle, StepStatus::Failure, Some(&err.diagnostic()))
                    .await;
                Err(err)
            }
            Err(payload) => {
                self.end(handle, StepStatus::Failure, Some(&panic_message(&*payload)))
                    .await;
                std::panic::resume_unwind(payload)
            }
        }
    }

    /// Read the audit rows of `run_id` in insertion order.
    pub async fn timeline(
        db: &dyn Database,
        table: &str,
        run_id: &RunId,
    ) -> ProfileResult<Vec<AuditStepRecord>> {
        let sql = format!(
            "SELECT RUN_ID, DATASET_ID, DATASET_NAME, SOURCE_DATABASE, SOURCE_SCHEMA, SOURCE_TABLE, \
             CUSTOM_QUERY, CAST(STEP_SEQ AS VARCHAR), STEP_NAME, STATUS, MESSAGE, \
             CAST(STARTED_AT AS VARCHAR), CAST(ENDED_AT AS VARCHAR) \
             FROM {table} WHERE RUN_ID = {} ORDER BY STEP_SEQ, STARTED_AT",
            string_literal(Some(run_id.as_str())),
        );
        let result = db.query_rows(&sql).await?;
        result
            .rows
            .into_iter()
            .map(|row| record_from_row(row, run_id))
            .collect()
    }
}

fn record_from_row(row: Vec<Option<String>>, run_id: &RunId) -> ProfileResult<AuditStepRecord> {
    let bad = |what: &str| ProfileError::unexpected(format!("audit row of run {run_id}"), what);
    let [
        run,
        dataset_id,
        dataset_name,
        source_database,
        source_schema,
        source_table,
        custom_query,
        seq,
        step_name,
        status,
        message,
        started_at,
        ended_at,
    ]: [Option<String>; 13] = row.try_into().map_err(|_| bad("expected 13 columns"))?;

    let status = status
        .as_deref()
        .and_then(StepStatus::parse)
        .ok_or_else(|| bad("unknown STATUS"))?;
    let step_seq = seq
        .as_deref()
        .and_then(|s| s.parse::<i32>().ok())
        .ok_or_else(|| bad("invalid STEP_SEQ"))?;

    Ok(AuditStepRecord {
        run_id: run.ok_or_else(|| bad("NULL RUN_ID"))?,
        dataset_id: dataset_id.unwrap_or_default(),
        dataset_name: dataset_name.unwrap_or_default(),
        source_database,
        source_schema,
        source_table,
        custom_query,
        step_seq,
        step_name: step_name.ok_or_else(|| bad("NULL STEP_NAME"))?,
        status,
        message,
        started_at: started_at.unwrap_or_default(),
        ended_at,
    })
}

#[cfg(test)]
#[path = "audit_test.rs"]
mod tests;
