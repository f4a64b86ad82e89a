//! The `run` command: fetch one reporting window, rank it, reshape it and
//! store it.
//!
//! Fetch and persistence errors fail the whole run. Once a pipeline run row
//! exists it is marked `failed` before the error is returned.

use trendrank_core::{AppConfig, ReportingWindow, WriteDisposition};
use trendrank_db::TableName;
use trendrank_trends::TrendsClient;

use crate::{connect, fail_run_best_effort, rank_and_reshape};

/// Per-invocation settings, resolved from flags with config fallbacks.
#[derive(Debug, Clone)]
pub(crate) struct RunOptions {
    pub geo: String,
    pub table: String,
    pub disposition: WriteDisposition,
    pub dry_run: bool,
}

/// Runs the pipeline end to end.
///
/// With `dry_run` the long table is printed as JSON and no database
/// connection is opened.
///
/// # Errors
///
/// Returns an error if the keyword set or destination table is invalid, the
/// trends request fails, or the database write fails.
pub(crate) async fn run_pipeline(config: &AppConfig, options: &RunOptions) -> anyhow::Result<()> {
    let keywords = trendrank_core::load_keywords(&config.keywords_path)?;
    let window = ReportingWindow::today();

    if options.dry_run {
        let client = TrendsClient::from_app_config(config)?;
        let observations = client
            .fetch_interest_by_country(&keywords, window, &options.geo)
            .await?;
        let long = rank_and_reshape(&observations);
        println!("{}", serde_json::to_string_pretty(&long)?);
        return Ok(());
    }

    // Validate before touching the database so a bad flag leaves no run row.
    let table = TableName::parse(&options.table)?;

    let pool = connect(config).await?;
    trendrank_db::run_migrations(&pool).await?;
    trendrank_db::ensure_rankings_table(&pool, &table).await?;

    let run = trendrank_db::create_pipeline_run(
        &pool,
        "cli",
        table.as_str(),
        options.disposition,
        window.date_extracted,
    )
    .await?;
    trendrank_db::start_pipeline_run(&pool, run.id).await?;

    tracing::info!(
        run_id = run.id,
        table = %table,
        disposition = %options.disposition,
        geo = %options.geo,
        "pipeline run started"
    );

    let result: anyhow::Result<(u64, i32)> = async {
        let client = TrendsClient::from_app_config(config)?;
        let observations = client
            .fetch_interest_by_country(&keywords, window, &options.geo)
            .await?;
        let long = rank_and_reshape(&observations);
        let written = trendrank_db::write_rankings(
            &pool,
            &table,
            &long.rows,
            options.disposition,
            Some(run.id),
        )
        .await?;
        let records = records_written(written)?;
        Ok((written, records))
    }
    .await;

    match result {
        Ok((written, records)) => {
            if let Err(err) = trendrank_db::complete_pipeline_run(&pool, run.id, records).await {
                fail_run_best_effort(&pool, run.id, format!("{err:#}")).await;
                return Err(err.into());
            }
            println!(
                "stored {written} rankings in {table} for {} to {}",
                window.start_date, window.end_date
            );
            Ok(())
        }
        Err(err) => {
            fail_run_best_effort(&pool, run.id, format!("{err:#}")).await;
            Err(err)
        }
    }
}

/// `pipeline_runs.records_written` is an `INTEGER` column.
fn records_written(written: u64) -> anyhow::Result<i32> {
    i32::try_from(written)
        .map_err(|_| anyhow::anyhow!("{written} rows written does not fit records_written"))
}
