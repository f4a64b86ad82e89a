use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Upper bound on tracked keywords; the trends comparison endpoint accepts
/// at most five terms per request.
pub const MAX_KEYWORDS: usize = 5;

/// A tracked search term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    /// Query string sent upstream, e.g. `"vpn"`.
    pub term: String,
    /// Column name used for ranking tie-breaks and in the long table,
    /// e.g. `"VPN"`. Defaults to `term`.
    #[serde(default)]
    pub label: Option<String>,
}

impl Keyword {
    #[must_use]
    pub fn new(term: &str) -> Self {
        Self {
            term: term.to_string(),
            label: None,
        }
    }

    #[must_use]
    pub fn labelled(term: &str, label: &str) -> Self {
        Self {
            term: term.to_string(),
            label: Some(label.to_string()),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.term)
    }
}

/// On-disk shape of `config/keywords.yaml`.
#[derive(Debug, Deserialize)]
pub struct KeywordsFile {
    /// Term of the anchor keyword; must match one entry in `keywords`.
    pub anchor: String,
    pub keywords: Vec<Keyword>,
}

/// The validated, ordered keyword set for a run, with one anchor keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSet {
    keywords: Vec<Keyword>,
    anchor_index: usize,
}

impl KeywordSet {
    /// Builds a keyword set, validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] when the set is empty, larger than
    /// [`MAX_KEYWORDS`], has blank or duplicate terms or labels, or when
    /// `anchor` does not name one of the terms.
    pub fn new(keywords: Vec<Keyword>, anchor: &str) -> Result<Self, ConfigError> {
        validate_keywords(&keywords)?;

        let anchor_index = keywords
            .iter()
            .position(|k| k.term == anchor)
            .ok_or_else(|| {
                ConfigError::Validation(format!(
                    "anchor '{anchor}' is not one of the tracked keywords"
                ))
            })?;

        Ok(Self {
            keywords,
            anchor_index,
        })
    }

    /// The reference configuration: five security-related terms with `vpn`
    /// as the anchor.
    #[must_use]
    pub fn reference() -> Self {
        Self {
            keywords: vec![
                Keyword::labelled("vpn", "VPN"),
                Keyword::labelled("hack", "Hack"),
                Keyword::labelled("cyber", "Cyber"),
                Keyword::labelled("security", "Security"),
                Keyword::labelled("wifi", "WiFi"),
            ],
            anchor_index: 0,
        }
    }

    #[must_use]
    pub fn keywords(&self) -> &[Keyword] {
        &self.keywords
    }

    #[must_use]
    pub fn anchor(&self) -> &Keyword {
        &self.keywords[self.anchor_index]
    }

    #[must_use]
    pub fn anchor_label(&self) -> &str {
        self.anchor().label()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(Keyword::label)
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(|k| k.term.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    #[must_use]
    pub fn contains_label(&self, label: &str) -> bool {
        self.labels().any(|l| l == label)
    }
}

impl TryFrom<KeywordsFile> for KeywordSet {
    type Error = ConfigError;

    fn try_from(file: KeywordsFile) -> Result<Self, Self::Error> {
        KeywordSet::new(file.keywords, &file.anchor)
    }
}

/// Load and validate the keyword set from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_keywords(path: &Path) -> Result<KeywordSet, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::KeywordsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: KeywordsFile = serde_yaml::from_str(&content)?;
    let set = KeywordSet::try_from(file)?;

    tracing::debug!(
        path = %path.display(),
        keywords = set.len(),
        anchor = set.anchor_label(),
        "loaded keyword set"
    );

    Ok(set)
}

fn validate_keywords(keywords: &[Keyword]) -> Result<(), ConfigError> {
    if keywords.is_empty() {
        return Err(ConfigError::Validation(
            "at least one keyword must be configured".to_string(),
        ));
    }

    if keywords.len() > MAX_KEYWORDS {
        return Err(ConfigError::Validation(format!(
            "{} keywords configured; at most {MAX_KEYWORDS} are supported",
            keywords.len()
        )));
    }

    let mut seen_terms = HashSet::new();
    let mut seen_labels = HashSet::new();

    for keyword in keywords {
        if keyword.term.trim().is_empty() {
            return Err(ConfigError::Validation(
                "keyword term must be non-empty".to_string(),
            ));
        }

        if keyword.label().trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "keyword '{}' has an empty label",
                keyword.term
            )));
        }

        if !seen_terms.insert(keyword.term.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate keyword term: '{}'",
                keyword.term
            )));
        }

        if !seen_labels.insert(keyword.label()) {
            return Err(ConfigError::Validation(format!(
                "duplicate keyword label: '{}' (from term '{}')",
                keyword.label(),
                keyword.term
            )));
        }
    }

    Ok(())
}
