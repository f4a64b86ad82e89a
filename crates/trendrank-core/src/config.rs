use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use crate::app_config::{AppConfig, WriteDisposition};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a set env var has an invalid value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a set env var has an invalid value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can drive it with a
/// plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let env = EnvReader { lookup };

    Ok(AppConfig {
        database_url: env.optional("DATABASE_URL"),
        log_level: env.or("TRENDRANK_LOG_LEVEL", "info"),
        keywords_path: PathBuf::from(env.or("TRENDRANK_KEYWORDS_PATH", "./config/keywords.yaml")),
        db_max_connections: env.parse_or("TRENDRANK_DB_MAX_CONNECTIONS", 10)?,
        db_min_connections: env.parse_or("TRENDRANK_DB_MIN_CONNECTIONS", 1)?,
        db_acquire_timeout_secs: env.parse_or("TRENDRANK_DB_ACQUIRE_TIMEOUT_SECS", 10)?,
        trends_base_url: env.or(
            "TRENDRANK_TRENDS_BASE_URL",
            "https://trends.google.com/trends/api/",
        ),
        trends_request_timeout_secs: env.parse_or("TRENDRANK_TRENDS_TIMEOUT_SECS", 30)?,
        trends_user_agent: env.or(
            "TRENDRANK_TRENDS_USER_AGENT",
            "trendrank/0.1 (keyword-rankings)",
        ),
        trends_language: env.or("TRENDRANK_TRENDS_LANGUAGE", "en-US"),
        trends_tz_offset: env.parse_or("TRENDRANK_TRENDS_TZ_OFFSET", 0)?,
        trends_geo: env.or("TRENDRANK_TRENDS_GEO", ""),
        dest_table: env.or("TRENDRANK_DEST_TABLE", "keyword_rankings"),
        write_disposition: env.parse_or("TRENDRANK_WRITE_DISPOSITION", WriteDisposition::Append)?,
    })
}

/// Typed access to env vars through an injectable lookup.
struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    /// Unset and blank values both read as `None`.
    fn optional(&self, var: &str) -> Option<String> {
        (self.lookup)(var).ok().filter(|v| !v.trim().is_empty())
    }

    fn or(&self, var: &str, default: &str) -> String {
        (self.lookup)(var).unwrap_or_else(|_| default.to_string())
    }

    /// Parses `var` when set; an unset var yields `default`, a set but
    /// unparsable one is an error.
    fn parse_or<T>(&self, var: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match (self.lookup)(var) {
            Ok(raw) => raw.parse::<T>().map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Ok(default),
        }
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
