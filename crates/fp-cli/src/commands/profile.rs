//! Profile command implementation

use anyhow::{Context, Result};
use fp_profile::{ProfileOutcome, ProfileRequest};

use crate::cli::{GlobalArgs, OutputFormat, ProfileArgs};
use crate::commands::common::{open_profiler, or_dash};

/// Execute the profile command
pub async fn execute(args: &ProfileArgs, global: &GlobalArgs) -> Result<()> {
    let profiler = open_profiler(global)?;

    let run_id = args
        .run_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let request = ProfileRequest {
        run_id: run_id.clone(),
        dataset_id: args.dataset_id.clone(),
        dataset_name: args.dataset_name.clone(),
        database: args.database.clone(),
        schema: args.schema.clone(),
        table: args.table.clone(),
        custom_query: args.query.clone(),
    };

    let outcome = profiler
        .run_profile(&request)
        .await
        .map_err(|e| anyhow::anyhow!(e.diagnostic()))
        .with_context(|| format!("Profiling run {run_id} failed"))?;

    match args.output {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "run_id": run_id,
                "message": outcome.message(),
                "outcome": outcome,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Table => print_table(&run_id, &outcome),
    }
    Ok(())
}

fn print_table(run_id: &str, outcome: &ProfileOutcome) {
    println!("{} (run {run_id})", outcome.message());
    let Some(report) = outcome.report() else {
        return;
    };

    println!();
    println!(
        "{:<24} {:<12} {:>10} {:>10} {:>9} {:>12}  {}",
        "COLUMN", "TYPE", "NON_NULL", "DISTINCT", "MISSING%", "MEAN", "ALERT"
    );
    for column in &report.columns {
        println!(
            "{:<24} {:<12} {:>10} {:>10} {:>9.2} {:>12}  {}",
            column.column_name,
            column.inferred_type,
            column.non_null_count,
            column.distinct_count,
            column.missing_pct,
            or_dash(column.mean.map(|m| format!("{m:.4}"))),
            column.alert_label
        );
    }

    let summary = &report.summary;
    println!();
    println!(
        "{} rows x {} columns, {:.2}% null, {} duplicate rows, {:.6} GB",
        summary.total_rows,
        summary.total_columns,
        summary.null_percent,
        summary.duplicate_row_count,
        summary.size_gb
    );
}
