//! Run tracking in `pipeline_runs`.
//!
//! A run moves `queued → running → succeeded | failed`; every transition
//! is checked against the current status in the same statement.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{PgPool, Postgres};
use trendrank_core::WriteDisposition;
use uuid::Uuid;

use crate::DbError;

/// A row from the `pipeline_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PipelineRunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub trigger_source: String,
    pub dest_table: String,
    pub write_disposition: String,
    pub status: String,
    pub date_extracted: NaiveDate,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Ranking rows written; zero until the run succeeds.
    pub records_written: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

const RUN_COLUMNS: &str = "id, public_id, trigger_source, dest_table, write_disposition, status, \
     date_extracted, started_at, completed_at, records_written, error_message, created_at";

/// Records a new run in `queued` status for `dest_table`.
///
/// # Errors
///
/// [`DbError::Sqlx`] on query failure.
pub async fn create_pipeline_run(
    pool: &PgPool,
    trigger_source: &str,
    dest_table: &str,
    disposition: WriteDisposition,
    date_extracted: NaiveDate,
) -> Result<PipelineRunRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, PipelineRunRow>(&format!(
        "INSERT INTO pipeline_runs \
             (public_id, trigger_source, dest_table, write_disposition, status, date_extracted) \
         VALUES ($1, $2, $3, $4, 'queued', $5) \
         RETURNING {RUN_COLUMNS}"
    ))
    .bind(public_id)
    .bind(trigger_source)
    .bind(dest_table)
    .bind(disposition.to_string())
    .bind(date_extracted)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Moves a `queued` run to `running`, stamping `started_at`.
///
/// # Errors
///
/// [`DbError::InvalidPipelineRunTransition`] if the run is not `queued`;
/// [`DbError::Sqlx`] on query failure.
pub async fn start_pipeline_run(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let query = sqlx::query(
        "UPDATE pipeline_runs SET status = 'running', started_at = NOW() \
         WHERE id = $1 AND status = 'queued'",
    )
    .bind(id);
    guarded_transition(pool, query, id, "queued").await
}

/// Moves a `running` run to `succeeded`, recording how many ranking rows it
/// wrote.
///
/// # Errors
///
/// [`DbError::InvalidPipelineRunTransition`] if the run is not `running`;
/// [`DbError::Sqlx`] on query failure.
pub async fn complete_pipeline_run(
    pool: &PgPool,
    id: i64,
    records_written: i32,
) -> Result<(), DbError> {
    let query = sqlx::query(
        "UPDATE pipeline_runs \
         SET status = 'succeeded', completed_at = NOW(), records_written = $2 \
         WHERE id = $1 AND status = 'running'",
    )
    .bind(id)
    .bind(records_written);
    guarded_transition(pool, query, id, "running").await
}

/// Moves a `running` run to `failed` with the error that stopped it.
///
/// # Errors
///
/// [`DbError::InvalidPipelineRunTransition`] if the run is not `running`;
/// [`DbError::Sqlx`] on query failure.
pub async fn fail_pipeline_run(pool: &PgPool, id: i64, message: &str) -> Result<(), DbError> {
    let query = sqlx::query(
        "UPDATE pipeline_runs \
         SET status = 'failed', completed_at = NOW(), error_message = $2 \
         WHERE id = $1 AND status = 'running'",
    )
    .bind(id)
    .bind(message);
    guarded_transition(pool, query, id, "running").await
}

/// Executes a status update whose `WHERE` clause pins the expected current
/// status. Zero affected rows means the run was in some other state.
async fn guarded_transition<'q>(
    pool: &PgPool,
    query: Query<'q, Postgres, PgArguments>,
    id: i64,
    expected_status: &'static str,
) -> Result<(), DbError> {
    if query.execute(pool).await?.rows_affected() == 0 {
        tracing::warn!(run_id = id, expected_status, "rejected pipeline run transition");
        return Err(DbError::InvalidPipelineRunTransition {
            id,
            expected_status,
        });
    }
    Ok(())
}

/// Looks up one run by primary key.
///
/// # Errors
///
/// [`DbError::NotFound`] for an unknown `id`; [`DbError::Sqlx`] on query
/// failure.
pub async fn get_pipeline_run(pool: &PgPool, id: i64) -> Result<PipelineRunRow, DbError> {
    let row = sqlx::query_as::<_, PipelineRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM pipeline_runs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Newest runs first, at most `limit` of them.
///
/// # Errors
///
/// [`DbError::Sqlx`] on query failure.
pub async fn list_pipeline_runs(pool: &PgPool, limit: i64) -> Result<Vec<PipelineRunRow>, DbError> {
    let rows = sqlx::query_as::<_, PipelineRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM pipeline_runs \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
