//! Validated destination table names.
//!
//! The destination table is configurable, so its name is spliced into SQL
//! text rather than bound as a parameter. Only plain identifiers, optionally
//! schema-qualified, are accepted.

use std::sync::LazyLock;

use regex::Regex;

use crate::DbError;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z_][A-Za-z0-9_]{0,62}\.)?[A-Za-z_][A-Za-z0-9_]{0,62}$")
        .expect("valid identifier regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName(String);

impl TableName {
    /// Validates `raw` as a `[schema.]table` identifier. Names are folded to
    /// lowercase, matching how Postgres treats unquoted identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidTableName`] for anything else.
    pub fn parse(raw: &str) -> Result<Self, DbError> {
        let trimmed = raw.trim();
        if IDENTIFIER.is_match(trimmed) {
            Ok(Self(trimmed.to_ascii_lowercase()))
        } else {
            Err(DbError::InvalidTableName(raw.to_string()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name used for the table's index, with any schema dot replaced.
    #[must_use]
    pub(crate) fn index_name(&self, suffix: &str) -> String {
        format!("idx_{}_{suffix}", self.0.replace('.', "_"))
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
