use std::path::PathBuf;

/// How a run's long table is written into the destination table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteDisposition {
    /// Keep existing rows and add the new run's rows after them.
    #[default]
    Append,
    /// Remove every existing row before inserting the new run's rows.
    Truncate,
}

impl std::fmt::Display for WriteDisposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteDisposition::Append => write!(f, "append"),
            WriteDisposition::Truncate => write!(f, "truncate"),
        }
    }
}

impl std::str::FromStr for WriteDisposition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "append" => Ok(WriteDisposition::Append),
            "truncate" => Ok(WriteDisposition::Truncate),
            other => Err(format!(
                "unknown write disposition '{other}'; expected 'append' or 'truncate'"
            )),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    /// Only the commands that touch the database need it; see
    /// [`AppConfig::require_database_url`].
    pub database_url: Option<String>,
    pub log_level: String,
    pub keywords_path: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub trends_base_url: String,
    pub trends_request_timeout_secs: u64,
    pub trends_user_agent: String,
    pub trends_language: String,
    pub trends_tz_offset: i32,
    /// Geography filter sent upstream; empty means worldwide.
    pub trends_geo: String,
    pub dest_table: String,
    pub write_disposition: WriteDisposition,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("keywords_path", &self.keywords_path)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("trends_base_url", &self.trends_base_url)
            .field(
                "trends_request_timeout_secs",
                &self.trends_request_timeout_secs,
            )
            .field("trends_user_agent", &self.trends_user_agent)
            .field("trends_language", &self.trends_language)
            .field("trends_tz_offset", &self.trends_tz_offset)
            .field("trends_geo", &self.trends_geo)
            .field("dest_table", &self.dest_table)
            .field("write_disposition", &self.write_disposition)
            .finish()
    }
}

impl AppConfig {
    /// The database URL, or an error naming `DATABASE_URL` when it is unset.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConfigError::MissingEnvVar`] if no URL is configured.
    pub fn require_database_url(&self) -> Result<&str, crate::ConfigError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| crate::ConfigError::MissingEnvVar("DATABASE_URL".to_string()))
    }
}
