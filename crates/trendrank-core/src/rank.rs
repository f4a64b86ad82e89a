//! Per-country keyword ranking.
//!
//! Keywords are ordered by score (descending) with the label as an ascending
//! tie-breaker, and every keyword receives a distinct rank. The anchor
//! keyword is then pushed to the worst rank among the keywords that share
//! its score.

use std::cmp::Ordering;

use crate::keywords::KeywordSet;
use crate::table::{ObservationRow, ObservationTable, RankedRow, RankedTable, Score};

/// A keyword with its score and assigned rank.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    pub keyword: String,
    pub score: Score,
    pub rank: u32,
}

/// Assigns ranks `1..=K` to the given `(label, score)` pairs.
///
/// Higher scores rank first; equal scores are ordered by label. Malformed
/// scores rank after every valid score. The result is in rank order.
pub fn dense_ranks<'a, I>(scores: I) -> Vec<RankedEntry>
where
    I: IntoIterator<Item = (&'a str, &'a Score)>,
{
    let mut present: Vec<(&str, &Score)> = scores.into_iter().collect();
    present.sort_by(|(label_a, score_a), (label_b, score_b)| {
        score_b
            .ordering_value()
            .partial_cmp(&score_a.ordering_value())
            .unwrap_or(Ordering::Equal)
            .then_with(|| label_a.cmp(label_b))
    });

    present
        .into_iter()
        .zip(1u32..)
        .map(|((keyword, score), rank)| RankedEntry {
            keyword: keyword.to_string(),
            score: score.clone(),
            rank,
        })
        .collect()
}

/// Moves `anchor` to the worst rank among the keywords tied with it.
///
/// With `E` the keywords whose raw score equals the anchor's and `max` the
/// largest rank in `E`: the anchor gets `max`, every other member of `E`
/// gets `min(rank, max - 1)`, and keywords outside `E` keep their rank.
/// All comparisons use the input ranks. Returns the input unchanged when the
/// anchor is absent or tied with nothing. Applying it twice is the same as
/// applying it once.
///
/// When three or more keywords tie and at least two of them sort after the
/// anchor, the `min` step leaves two members on `max - 1`. Malformed cells
/// are only tied when their text is identical.
#[must_use]
pub fn adjust_for_anchor(entries: &[RankedEntry], anchor: &str) -> Vec<RankedEntry> {
    let Some(anchor_score) = entries
        .iter()
        .find(|e| e.keyword == anchor)
        .map(|e| &e.score)
    else {
        return entries.to_vec();
    };

    let tied: Vec<&RankedEntry> = entries
        .iter()
        .filter(|e| e.score == *anchor_score)
        .collect();
    if tied.len() < 2 {
        return entries.to_vec();
    }

    let max_rank = tied.iter().map(|e| e.rank).max().unwrap_or(1);

    entries
        .iter()
        .map(|e| {
            let rank = if e.keyword == anchor {
                max_rank
            } else if e.score == *anchor_score {
                e.rank.min(max_rank.saturating_sub(1))
            } else {
                e.rank
            };
            RankedEntry {
                rank,
                ..e.clone()
            }
        })
        .collect()
}

/// Ranks one country's keywords.
#[must_use]
pub fn rank_row(row: &ObservationRow, keywords: &KeywordSet) -> RankedRow {
    let present = keywords.labels().filter_map(|label| {
        let score = row.score(label)?;
        if !score.is_valid() {
            tracing::debug!(
                country = %row.country,
                keyword = label,
                ?score,
                "score is not a valid number; ranking it last"
            );
        }
        Some((label, score))
    });

    let pre_adjustment = dense_ranks(present);
    let adjusted = adjust_for_anchor(&pre_adjustment, keywords.anchor_label());

    RankedRow {
        country: row.country.clone(),
        country_code: row.country_code.clone(),
        ranks: adjusted.into_iter().map(|e| (e.keyword, e.rank)).collect(),
    }
}

/// Ranks every row of the table independently.
#[must_use]
pub fn rank_table(table: &ObservationTable) -> RankedTable {
    let rows: Vec<RankedRow> = table
        .rows
        .iter()
        .map(|row| rank_row(row, &table.keywords))
        .collect();

    tracing::info!(
        countries = rows.len(),
        keywords = table.keywords.len(),
        anchor = table.keywords.anchor_label(),
        "ranked observation table"
    );

    RankedTable {
        window: table.window,
        keywords: table.keywords.clone(),
        rows,
    }
}

#[cfg(test)]
#[path = "rank_test.rs"]
mod tests;
