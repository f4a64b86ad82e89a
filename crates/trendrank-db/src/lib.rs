//! Postgres persistence for keyword rankings and pipeline run tracking.

use thiserror::Error;

pub mod pipeline_runs;
pub mod pool;
pub mod rankings;
pub mod table_name;

pub use pipeline_runs::{
    complete_pipeline_run, create_pipeline_run, fail_pipeline_run, get_pipeline_run,
    list_pipeline_runs, start_pipeline_run, PipelineRunRow,
};
pub use pool::{connect_pool, health_check, ping, run_migrations, PoolConfig};
pub use rankings::{ensure_rankings_table, write_rankings, INSERT_CHUNK_ROWS};
pub use table_name::TableName;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("record not found")]
    NotFound,
    #[error("invalid table name '{0}': expected [schema.]table made of letters, digits and underscores")]
    InvalidTableName(String),
    #[error("pipeline run {id} is not in '{expected_status}' status")]
    InvalidPipelineRunTransition {
        id: i64,
        expected_status: &'static str,
    },
    #[error("ranking {0} does not fit the INTEGER ranking column")]
    RankingOutOfRange(u32),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}
