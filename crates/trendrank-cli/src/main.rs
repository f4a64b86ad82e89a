mod fixture;
mod run;
mod runs;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use trendrank_core::WriteDisposition;

#[derive(Debug, Parser)]
#[command(name = "trendrank")]
#[command(about = "Per-country keyword rankings from search-interest data")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch, rank, reshape and store one reporting window
    Run {
        /// Geography to restrict the request to (empty for worldwide)
        #[arg(long)]
        geo: Option<String>,
        /// Destination table, optionally schema-qualified
        #[arg(long)]
        table: Option<String>,
        /// Keep existing rows or replace them
        #[arg(long)]
        disposition: Option<WriteDisposition>,
        /// Print the long table as JSON instead of writing it
        #[arg(long)]
        dry_run: bool,
    },
    /// Rank a local observation fixture and print the long table as JSON
    Rank {
        /// JSON file with `Country`, `CountryCode` and one score per keyword
        #[arg(long)]
        input: PathBuf,
        /// Keyword set YAML; defaults to the built-in reference set
        #[arg(long)]
        keywords: Option<PathBuf>,
        /// Extraction date for the reporting window (defaults to today, UTC)
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    Runs {
        #[command(subcommand)]
        command: RunsCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    Ping,
    Migrate,
}

#[derive(Debug, Subcommand)]
enum RunsCommands {
    /// Show the most recent pipeline runs
    List {
        #[arg(long, default_value = "20")]
        limit: i64,
    },
    /// Show every recorded field of one pipeline run
    Show {
        #[arg(long)]
        id: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("trendrank ready; see `trendrank --help`");
        return Ok(());
    };

    match command {
        Commands::Rank {
            input,
            keywords,
            as_of,
        } => {
            // Offline: needs neither the database nor the full config.
            init_tracing("info")?;
            fixture::run_rank(&input, keywords.as_deref(), as_of)
        }
        Commands::Run {
            geo,
            table,
            disposition,
            dry_run,
        } => {
            let config = load_config()?;
            let options = run::RunOptions {
                geo: geo.unwrap_or_else(|| config.trends_geo.clone()),
                table: table.unwrap_or_else(|| config.dest_table.clone()),
                disposition: disposition.unwrap_or(config.write_disposition),
                dry_run,
            };
            run::run_pipeline(&config, &options).await
        }
        Commands::Db { command } => {
            let config = load_config()?;
            let pool = connect(&config).await?;
            match command {
                DbCommands::Ping => {
                    trendrank_db::health_check(&pool).await?;
                    println!("database ok");
                }
                DbCommands::Migrate => {
                    let applied = trendrank_db::run_migrations(&pool).await?;
                    println!("applied {applied} migration(s)");
                }
            }
            Ok(())
        }
        Commands::Runs { command } => {
            let config = load_config()?;
            let pool = connect(&config).await?;
            match command {
                RunsCommands::List { limit } => runs::run_runs_list(&pool, limit).await,
                RunsCommands::Show { id } => runs::run_runs_show(&pool, id).await,
            }
        }
    }
}

fn load_config() -> anyhow::Result<trendrank_core::AppConfig> {
    let config = trendrank_core::load_app_config()?;
    init_tracing(&config.log_level)?;
    Ok(config)
}

/// Logs go to stderr so JSON printed on stdout stays machine-readable.
fn init_tracing(default_level: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

pub(crate) async fn connect(
    config: &trendrank_core::AppConfig,
) -> anyhow::Result<sqlx::PgPool> {
    let database_url = config.require_database_url()?;
    let pool_config = trendrank_db::PoolConfig::from_app_config(config);
    let pool = trendrank_db::connect_pool(database_url, pool_config).await?;
    Ok(pool)
}

/// Ranks every row of `observations` and reshapes the result to long form.
pub(crate) fn rank_and_reshape(
    observations: &trendrank_core::ObservationTable,
) -> trendrank_core::LongTable {
    let ranked = trendrank_core::rank_table(observations);
    trendrank_core::reshape(&ranked)
}

/// Marks a run as failed, logging rather than propagating any error so the
/// caller can still return the original failure.
pub(crate) async fn fail_run_best_effort(pool: &sqlx::PgPool, run_id: i64, message: String) {
    if let Err(mark_err) = trendrank_db::fail_pipeline_run(pool, run_id, &message).await {
        tracing::error!(
            run_id,
            error = %mark_err,
            "failed to mark pipeline run as failed"
        );
    }
}
