//! The offline `rank` command: rank a local observation fixture.
//!
//! A fixture is a JSON array of wide rows:
//!
//! ```json
//! [{ "Country": "Germany", "CountryCode": "DE", "VPN": 60, "Hack": 70 }]
//! ```
//!
//! Keys other than `Country` and `CountryCode` are keyword labels. A `null`
//! score is treated as a missing keyword; a string that is not a number is
//! kept as a malformed score.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use trendrank_core::{KeywordSet, ObservationRow, ObservationTable, ReportingWindow, Score};

use crate::rank_and_reshape;

#[derive(Debug, Deserialize)]
pub(crate) struct FixtureRow {
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "CountryCode")]
    pub country_code: String,
    #[serde(flatten)]
    pub scores: BTreeMap<String, Option<Score>>,
}

impl From<FixtureRow> for ObservationRow {
    fn from(row: FixtureRow) -> Self {
        ObservationRow {
            country: row.country,
            country_code: row.country_code,
            scores: row
                .scores
                .into_iter()
                .filter_map(|(label, score)| score.map(|s| (label, s)))
                .collect(),
        }
    }
}

/// Parses fixture JSON into an observation table for `keywords`.
///
/// # Errors
///
/// Returns an error if the JSON is not an array of fixture rows.
pub(crate) fn parse_fixture(
    json: &str,
    keywords: KeywordSet,
    window: ReportingWindow,
) -> anyhow::Result<ObservationTable> {
    let rows: Vec<FixtureRow> = serde_json::from_str(json)?;

    for row in &rows {
        for label in row.scores.keys() {
            if !keywords.contains_label(label) {
                tracing::warn!(
                    country = %row.country,
                    column = %label,
                    "fixture column is not a tracked keyword; ignoring"
                );
            }
        }
    }

    Ok(ObservationTable {
        window,
        keywords,
        rows: rows.into_iter().map(ObservationRow::from).collect(),
    })
}

/// Reads `input`, ranks it and prints the long table as JSON on stdout.
///
/// # Errors
///
/// Returns an error if either file cannot be read or parsed.
pub(crate) fn run_rank(
    input: &Path,
    keywords_path: Option<&Path>,
    as_of: Option<NaiveDate>,
) -> anyhow::Result<()> {
    let keywords = match keywords_path {
        Some(path) => trendrank_core::load_keywords(path)?,
        None => KeywordSet::reference(),
    };
    let window = as_of.map_or_else(ReportingWindow::today, ReportingWindow::ending_on);

    let json = std::fs::read_to_string(input)
        .map_err(|e| anyhow::anyhow!("failed to read fixture {}: {e}", input.display()))?;
    let observations = parse_fixture(&json, keywords, window)?;
    let long = rank_and_reshape(&observations);

    tracing::info!(
        input = %input.display(),
        countries = observations.rows.len(),
        rows = long.len(),
        "ranked local fixture"
    );

    println!("{}", serde_json::to_string_pretty(&long)?);
    Ok(())
}
