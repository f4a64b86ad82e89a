//! Wide-to-long reshape of a ranked table.

use crate::table::{LongRow, LongTable, RankedTable};

/// Emits one [`LongRow`] per (country, ranked keyword) pair.
///
/// Keywords are visited in keyword-set order; a keyword with no rank in a
/// row produces no output row. The result is stable-sorted by country
/// ascending, then ranking descending, so within a country rank 1 is last.
#[must_use]
pub fn reshape(table: &RankedTable) -> LongTable {
    let window = table.window;

    let mut rows: Vec<LongRow> = table
        .rows
        .iter()
        .flat_map(|row| {
            table.keywords.labels().filter_map(move |label| {
                row.rank(label).map(|ranking| LongRow {
                    country: row.country.clone(),
                    country_code: row.country_code.clone(),
                    keyword: label.to_string(),
                    ranking,
                    start_date: window.start_date,
                    end_date: window.end_date,
                    date_extracted: window.date_extracted,
                })
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        a.country
            .cmp(&b.country)
            .then_with(|| b.ranking.cmp(&a.ranking))
    });

    tracing::info!(
        countries = table.rows.len(),
        rows = rows.len(),
        "reshaped ranked table to long format"
    );

    LongTable { rows }
}
