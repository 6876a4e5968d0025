//! Audit command implementation

use anyhow::{Context, Result};
use fp_core::RunId;

use crate::cli::{AuditArgs, GlobalArgs, OutputFormat};
use crate::commands::common::{open_profiler, or_dash};

/// Execute the audit command
pub async fn execute(args: &AuditArgs, global: &GlobalArgs) -> Result<()> {
    let profiler = open_profiler(global)?;
    let run_id = RunId::try_new(args.run_id.as_str()).context("--run-id must not be empty")?;

    let records = profiler
        .timeline(&run_id)
        .await
        .with_context(|| format!("Failed to read the audit trail of run {run_id}"))?;

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Table => {
            if records.is_empty() {
                println!("No audit rows for run {run_id}");
                return Ok(());
            }
            println!(
                "{:>3}  {:<30} {:<8} {:<26} {:<26} {}",
                "SEQ", "STEP", "STATUS", "STARTED_AT", "ENDED_AT", "MESSAGE"
            );
            for record in &records {
                let message = record
                    .message
                    .as_deref()
                    .and_then(|m| m.lines().next())
                    .map(str::to_string);
                println!(
                    "{:>3}  {:<30} {:<8} {:<26} {:<26} {}",
                    record.step_seq,
                    record.step_name,
                    record.status.as_str(),
                    record.started_at,
                    or_dash(record.ended_at.as_deref()),
                    or_dash(message)
                );
            }
        }
    }
    Ok(())
}
