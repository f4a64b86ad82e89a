//! Persistence of long-format keyword rankings.
//!
//! Database columns mirror the long table's column order:
//! `Country → country`, `CountryCode → country_code`, `Keyword → keyword`,
//! `Ranking → ranking`, `StartDate → start_date`, `EndDate → end_date`,
//! `DateExtracted → date_extracted`.

use sqlx::{PgPool, Postgres, QueryBuilder};
use trendrank_core::{LongRow, WriteDisposition};

use crate::table_name::TableName;
use crate::DbError;

/// Rows per `INSERT` statement. Eight binds per row keeps each statement well
/// under the Postgres bind-parameter limit.
pub const INSERT_CHUNK_ROWS: usize = 1000;

/// Creates the destination table and its lookup index if they do not exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either statement fails.
pub async fn ensure_rankings_table(pool: &PgPool, table: &TableName) -> Result<(), DbError> {
    sqlx::query(&create_table_sql(table)).execute(pool).await?;
    sqlx::query(&create_index_sql(table)).execute(pool).await?;
    Ok(())
}

/// Writes a run's long table into `table` inside one transaction.
///
/// With [`WriteDisposition::Truncate`] every existing row is deleted first;
/// with [`WriteDisposition::Append`] existing rows are kept. Rows are
/// inserted in the order given. Returns the number of rows written.
///
/// # Errors
///
/// Returns [`DbError::RankingOutOfRange`] before touching the table if a
/// ranking exceeds `i32::MAX`. Returns [`DbError::Sqlx`] if any statement
/// fails; the transaction is rolled back and the table is left as it was.
pub async fn write_rankings(
    pool: &PgPool,
    table: &TableName,
    rows: &[LongRow],
    disposition: WriteDisposition,
    pipeline_run_id: Option<i64>,
) -> Result<u64, DbError> {
    let rankings = ranking_column(rows)?;
    let mut tx = pool.begin().await?;

    if disposition == WriteDisposition::Truncate {
        let deleted = sqlx::query(&format!("DELETE FROM {table}"))
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tracing::info!(table = %table, deleted, "truncated destination table");
    }

    let mut written: u64 = 0;
    for (chunk, chunk_rankings) in rows
        .chunks(INSERT_CHUNK_ROWS)
        .zip(rankings.chunks(INSERT_CHUNK_ROWS))
    {
        let mut builder = insert_builder(table, chunk, chunk_rankings, pipeline_run_id);
        written += builder.build().execute(&mut *tx).await?.rows_affected();
    }

    tx.commit().await?;

    tracing::info!(
        table = %table,
        disposition = %disposition,
        rows = written,
        "stored keyword rankings"
    );

    Ok(written)
}

/// The `ranking` column is `INTEGER`.
fn ranking_column(rows: &[LongRow]) -> Result<Vec<i32>, DbError> {
    rows.iter()
        .map(|row| {
            i32::try_from(row.ranking).map_err(|_| DbError::RankingOutOfRange(row.ranking))
        })
        .collect()
}

fn insert_builder<'a>(
    table: &TableName,
    chunk: &'a [LongRow],
    rankings: &'a [i32],
    pipeline_run_id: Option<i64>,
) -> QueryBuilder<'a, Postgres> {
    let mut builder = QueryBuilder::new(format!(
        "INSERT INTO {table} \
             (pipeline_run_id, country, country_code, keyword, ranking, \
              start_date, end_date, date_extracted) "
    ));

    builder.push_values(chunk.iter().zip(rankings), |mut b, (row, ranking)| {
        b.push_bind(pipeline_run_id)
            .push_bind(row.country.as_str())
            .push_bind(row.country_code.as_str())
            .push_bind(row.keyword.as_str())
            .push_bind(*ranking)
            .push_bind(row.start_date)
            .push_bind(row.end_date)
            .push_bind(row.date_extracted);
    });

    builder
}

fn create_table_sql(table: &TableName) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} ( \
             id              BIGSERIAL PRIMARY KEY, \
             pipeline_run_id BIGINT REFERENCES pipeline_runs (id) ON DELETE SET NULL, \
             country         TEXT NOT NULL, \
             country_code    TEXT NOT NULL, \
             keyword         TEXT NOT NULL, \
             ranking         INTEGER NOT NULL, \
             start_date      DATE NOT NULL, \
             end_date        DATE NOT NULL, \
             date_extracted  DATE NOT NULL, \
             created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW() \
         )"
    )
}

fn create_index_sql(table: &TableName) -> String {
    format!(
        "CREATE INDEX IF NOT EXISTS {} ON {table} (date_extracted, country)",
        table.index_name("extracted")
    )
}
