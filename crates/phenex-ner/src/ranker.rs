//! Ranking of matched terms into result rows.
//! Order: most occurrences first, then earliest first appearance, then term ID.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// One row of a safe or unsafe result table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRow {
    pub term_id: String,
    pub name: String,
    pub occurrence_count: usize,
    pub earliest_position: usize,
    pub example_sentence: String,
}

/// Term IDs sorted by (−occurrences, earliest position, term ID).
/// Terms with no positions are dropped.
pub fn rank_terms(hits: &BTreeMap<String, BTreeSet<usize>>) -> Vec<&str> {
    let mut keyed: Vec<(Reverse<usize>, usize, &str)> = hits
        .iter()
        .filter_map(|(id, positions)| {
            positions
                .first()
                .map(|earliest| (Reverse(positions.len()), *earliest, id.as_str()))
        })
        .collect();
    keyed.sort();
    keyed.into_iter().map(|(_, _, id)| id).collect()
}

/// Build ranked rows. The example sentence is the one holding the term's
/// earliest position.
pub fn ranked_rows<N, S>(hits: &BTreeMap<String, BTreeSet<usize>>, name_of: N, sentence_of: S) -> Vec<ExtractionRow>
where
    N: Fn(&str) -> String,
    S: Fn(usize) -> String,
{
    rank_terms(hits)
        .into_iter()
        .filter_map(|id| {
            let positions = hits.get(id)?;
            let earliest = *positions.first()?;
            Some(ExtractionRow {
                term_id: id.to_string(),
                name: name_of(id),
                occurrence_count: positions.len(),
                earliest_position: earliest,
                example_sentence: sentence_of(earliest),
            })
        })
        .collect()
}
