pub mod app_config;
pub mod config;
pub mod keywords;
pub mod rank;
pub mod reshape;
pub mod table;

pub use app_config::{AppConfig, WriteDisposition};
pub use config::{load_app_config, load_app_config_from_env};
pub use keywords::{load_keywords, Keyword, KeywordSet, KeywordsFile, MAX_KEYWORDS};
pub use rank::{adjust_for_anchor, dense_ranks, rank_row, rank_table, RankedEntry};
pub use reshape::reshape;
pub use table::{
    LongRow, LongTable, ObservationRow, ObservationTable, RankedRow, RankedTable,
    ReportingWindow, Score,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read keywords file {path}: {source}")]
    KeywordsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse keywords file: {0}")]
    KeywordsFileParse(#[from] serde_yaml::Error),

    #[error("keywords validation failed: {0}")]
    Validation(String),
}
