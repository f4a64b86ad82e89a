//! Table shapes flowing through a run: the wide observation table produced by
//! the fetch step, the ranked wide table, and the long table handed to
//! persistence.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

use crate::keywords::KeywordSet;

/// Days between `StartDate` and `EndDate` of a reporting window.
pub const LOOKBACK_DAYS: u64 = 7;

/// Raw interest score for one keyword in one country.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Score {
    Value(f64),
    /// A cell that could not be read as a number; kept verbatim.
    Malformed(String),
}

impl Score {
    /// Parses a textual cell. Anything that is not a finite, non-negative
    /// number is kept as [`Score::Malformed`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => Score::Value(v),
            _ => Score::Malformed(raw.to_string()),
        }
    }

    /// Value used to order scores. Malformed, negative and non-finite scores
    /// all map to negative infinity so they sort after every valid score.
    #[must_use]
    pub fn ordering_value(&self) -> f64 {
        match self {
            Score::Value(v) if v.is_finite() && *v >= 0.0 => *v,
            _ => f64::NEG_INFINITY,
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.ordering_value() != f64::NEG_INFINITY
    }
}

impl From<f64> for Score {
    fn from(v: f64) -> Self {
        Score::Value(v)
    }
}

impl From<u32> for Score {
    fn from(v: u32) -> Self {
        Score::Value(f64::from(v))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScore {
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for Score {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match RawScore::deserialize(deserializer)? {
            RawScore::Number(v) => Score::Value(v),
            RawScore::Text(s) => Score::parse(&s),
        })
    }
}

/// Temporal metadata shared by every row of one extraction run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingWindow {
    pub date_extracted: NaiveDate,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl ReportingWindow {
    /// Window for an extraction on `date`: ends on `date`, starts
    /// [`LOOKBACK_DAYS`] earlier.
    #[must_use]
    pub fn ending_on(date: NaiveDate) -> Self {
        let start_date = date.checked_sub_days(Days::new(LOOKBACK_DAYS)).unwrap_or(date);
        Self {
            date_extracted: date,
            start_date,
            end_date: date,
        }
    }

    /// Window for an extraction happening now (UTC).
    #[must_use]
    pub fn today() -> Self {
        Self::ending_on(chrono::Utc::now().date_naive())
    }

    /// Upstream timeframe expression matching this window.
    #[must_use]
    pub fn timeframe(&self) -> String {
        format!("now {LOOKBACK_DAYS}-d")
    }
}

/// One country's raw scores, keyed by keyword label. Absent keywords have
/// no entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationRow {
    pub country: String,
    pub country_code: String,
    pub scores: BTreeMap<String, Score>,
}

impl ObservationRow {
    #[must_use]
    pub fn new(country: &str, country_code: &str) -> Self {
        Self {
            country: country.to_string(),
            country_code: country_code.to_string(),
            scores: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_score(mut self, label: &str, score: impl Into<Score>) -> Self {
        self.scores.insert(label.to_string(), score.into());
        self
    }

    #[must_use]
    pub fn score(&self, label: &str) -> Option<&Score> {
        self.scores.get(label)
    }
}

/// Wide input table: one row per country, one score column per keyword.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationTable {
    pub window: ReportingWindow,
    pub keywords: KeywordSet,
    pub rows: Vec<ObservationRow>,
}

/// One country's ranks, keyed by keyword label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedRow {
    pub country: String,
    pub country_code: String,
    pub ranks: BTreeMap<String, u32>,
}

impl RankedRow {
    #[must_use]
    pub fn rank(&self, label: &str) -> Option<u32> {
        self.ranks.get(label).copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedTable {
    pub window: ReportingWindow,
    pub keywords: KeywordSet,
    pub rows: Vec<RankedRow>,
}

/// One (country, keyword) pair of the long table. Field order is the
/// persisted column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LongRow {
    pub country: String,
    pub country_code: String,
    pub keyword: String,
    pub ranking: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub date_extracted: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LongTable {
    pub rows: Vec<LongRow>,
}

impl LongTable {
    pub const COLUMNS: [&'static str; 7] = [
        "Country",
        "CountryCode",
        "Keyword",
        "Ranking",
        "StartDate",
        "EndDate",
        "DateExtracted",
    ];

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LongRow> {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn window_starts_seven_days_before_extraction() {
        let window = ReportingWindow::ending_on(date(2024, 3, 5));
        assert_eq!(window.date_extracted, date(2024, 3, 5));
        assert_eq!(window.end_date, date(2024, 3, 5));
        assert_eq!(window.start_date, date(2024, 2, 27));
        assert_eq!(window.timeframe(), "now 7-d");
    }

    #[test]
    fn score_parse_accepts_numeric_text() {
        assert_eq!(Score::parse("45"), Score::Value(45.0));
        assert_eq!(Score::parse(" 12.5 "), Score::Value(12.5));
    }

    #[test]
    fn score_parse_keeps_malformed_text() {
        assert_eq!(Score::parse("<1"), Score::Malformed("<1".to_string()));
        assert_eq!(Score::parse("-3"), Score::Malformed("-3".to_string()));
        assert_eq!(Score::parse("NaN"), Score::Malformed("NaN".to_string()));
    }

    #[test]
    fn invalid_scores_order_below_zero() {
        assert!(Score::Value(0.0).ordering_value() > Score::parse("n/a").ordering_value());
        assert_eq!(Score::Value(-1.0).ordering_value(), f64::NEG_INFINITY);
        assert_eq!(Score::Value(f64::NAN).ordering_value(), f64::NEG_INFINITY);
        assert!(!Score::Value(f64::NAN).is_valid());
        assert!(Score::Value(0.0).is_valid());
    }

    #[test]
    fn score_deserializes_from_number_or_text() {
        let scores: Vec<Score> = serde_json::from_str(r#"[60, "40", "<1", 7.5]"#).unwrap();
        assert_eq!(
            scores,
            vec![
                Score::Value(60.0),
                Score::Value(40.0),
                Score::Malformed("<1".to_string()),
                Score::Value(7.5),
            ]
        );
    }

    #[test]
    fn long_row_serializes_with_column_names_in_order() {
        let row = LongRow {
            country: "Germany".to_string(),
            country_code: "DE".to_string(),
            keyword: "VPN".to_string(),
            ranking: 5,
            start_date: date(2024, 2, 27),
            end_date: date(2024, 3, 5),
            date_extracted: date(2024, 3, 5),
        };
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(
            json,
            r#"{"Country":"Germany","CountryCode":"DE","Keyword":"VPN","Ranking":5,"StartDate":"2024-02-27","EndDate":"2024-03-05","DateExtracted":"2024-03-05"}"#
        );

        let value = serde_json::to_value(&row).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        for column in LongTable::COLUMNS {
            assert!(keys.iter().any(|k| *k == column), "missing column {column}");
        }
    }
}
