//! Read-only pipeline run queries.

use chrono::{DateTime, Utc};

/// Prints the most recent `limit` pipeline runs, newest first.
///
/// # Errors
///
/// Returns an error if `limit` is not positive or the query fails.
pub(crate) async fn run_runs_list(pool: &sqlx::PgPool, limit: i64) -> anyhow::Result<()> {
    if limit <= 0 {
        anyhow::bail!("--limit must be positive, got {limit}");
    }

    let runs = trendrank_db::list_pipeline_runs(pool, limit).await?;
    if runs.is_empty() {
        println!("no pipeline runs found; run `trendrank run` first");
        return Ok(());
    }

    println!(
        "{:<6}{:<11}{:<10}{:<9}{:<12}{:<18}TABLE",
        "ID", "STATUS", "MODE", "ROWS", "EXTRACTED", "COMPLETED"
    );
    for run in &runs {
        println!(
            "{:<6}{:<11}{:<10}{:<9}{:<12}{:<18}{}",
            run.id,
            run.status,
            run.write_disposition,
            run.records_written,
            run.date_extracted.format("%Y-%m-%d"),
            fmt_timestamp(run.completed_at),
            run.dest_table
        );
        if let Some(message) = &run.error_message {
            println!("      error: {message}");
        }
    }

    Ok(())
}

/// Prints one pipeline run as `field: value` lines.
///
/// # Errors
///
/// Returns an error if no run has this `id` or the query fails.
pub(crate) async fn run_runs_show(pool: &sqlx::PgPool, id: i64) -> anyhow::Result<()> {
    let run = match trendrank_db::get_pipeline_run(pool, id).await {
        Ok(run) => run,
        Err(trendrank_db::DbError::NotFound) => anyhow::bail!("no pipeline run with id {id}"),
        Err(e) => return Err(e.into()),
    };

    for (field, value) in describe_run(&run) {
        println!("{field:<16}{value}");
    }
    Ok(())
}

fn describe_run(run: &trendrank_db::PipelineRunRow) -> Vec<(&'static str, String)> {
    vec![
        ("id", run.id.to_string()),
        ("public_id", run.public_id.to_string()),
        ("status", run.status.clone()),
        ("trigger", run.trigger_source.clone()),
        ("table", run.dest_table.clone()),
        ("mode", run.write_disposition.clone()),
        ("extracted", run.date_extracted.format("%Y-%m-%d").to_string()),
        ("rows", run.records_written.to_string()),
        ("created", fmt_timestamp(Some(run.created_at))),
        ("started", fmt_timestamp(run.started_at)),
        ("completed", fmt_timestamp(run.completed_at)),
        (
            "error",
            run.error_message.clone().unwrap_or_else(|| "-".to_string()),
        ),
    ]
}

/// Formats an optional timestamp, returning `"-"` when `None`.
fn fmt_timestamp(ts: Option<DateTime<Utc>>) -> String {
    ts.map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string())
}
