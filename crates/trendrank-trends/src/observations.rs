//! Conversion of region interest data into an observation table.

use std::collections::HashSet;

use trendrank_core::{KeywordSet, ObservationRow, ObservationTable, ReportingWindow};

use crate::types::GeoMapEntry;

/// Builds the wide observation table from `comparedgeo` entries.
///
/// The i-th value of an entry becomes the score of the i-th keyword. A value
/// list shorter than the keyword set leaves the trailing keywords absent.
/// Repeated country names keep their first entry.
#[must_use]
pub fn to_observation_table(
    entries: Vec<GeoMapEntry>,
    keywords: &KeywordSet,
    window: ReportingWindow,
) -> ObservationTable {
    let mut seen = HashSet::new();
    let mut rows = Vec::with_capacity(entries.len());

    for entry in entries {
        if !seen.insert(entry.geo_name.clone()) {
            tracing::warn!(
                country = %entry.geo_name,
                "skipping duplicate country in trends response"
            );
            continue;
        }

        if entry.value.len() < keywords.len() {
            tracing::debug!(
                country = %entry.geo_name,
                values = entry.value.len(),
                keywords = keywords.len(),
                "region has fewer values than keywords"
            );
        }

        let mut row = ObservationRow::new(&entry.geo_name, &entry.geo_code);
        for (label, score) in keywords.labels().zip(entry.value) {
            row.scores.insert(label.to_string(), score);
        }
        rows.push(row);
    }

    ObservationTable {
        window,
        keywords: keywords.clone(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use trendrank_core::Score;

    use super::*;

    fn entry(name: &str, code: &str, values: &[f64]) -> GeoMapEntry {
        GeoMapEntry {
            geo_code: code.to_string(),
            geo_name: name.to_string(),
            value: values.iter().copied().map(Score::Value).collect(),
        }
    }

    fn window() -> ReportingWindow {
        ReportingWindow::ending_on(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap())
    }

    #[test]
    fn maps_values_to_labels_in_keyword_order() {
        let table = to_observation_table(
            vec![entry("Germany", "DE", &[60.0, 70.0, 10.0, 40.0, 50.0])],
            &KeywordSet::reference(),
            window(),
        );

        let row = &table.rows[0];
        assert_eq!(row.country, "Germany");
        assert_eq!(row.country_code, "DE");
        assert_eq!(row.score("VPN"), Some(&Score::Value(60.0)));
        assert_eq!(row.score("Hack"), Some(&Score::Value(70.0)));
        assert_eq!(row.score("WiFi"), Some(&Score::Value(50.0)));
        assert_eq!(table.window, window());
    }

    #[test]
    fn short_value_list_leaves_keywords_absent() {
        let table = to_observation_table(
            vec![entry("Chile", "CL", &[5.0, 6.0])],
            &KeywordSet::reference(),
            window(),
        );
        let row = &table.rows[0];
        assert_eq!(row.scores.len(), 2);
        assert!(row.score("Cyber").is_none());
    }

    #[test]
    fn duplicate_countries_keep_first_entry() {
        let table = to_observation_table(
            vec![
                entry("Peru", "PE", &[1.0]),
                entry("Peru", "PE", &[2.0]),
                entry("Chile", "CL", &[3.0]),
            ],
            &KeywordSet::reference(),
            window(),
        );
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].score("VPN"), Some(&Score::Value(1.0)));
    }

    #[test]
    fn empty_response_gives_empty_table() {
        let table = to_observation_table(vec![], &KeywordSet::reference(), window());
        assert!(table.rows.is_empty());
    }
}
