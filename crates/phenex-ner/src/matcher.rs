//! Synonym matching against the position index.
//!
//! A synonym phrase matches a subsentence when every one of its tokens is
//! present in that subsentence's expanded token set; word order and
//! adjacency are not checked.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::index::PositionIndex;
use crate::normalise::alphanumeric_words;
use crate::ontology::OntologyDictionary;

/// One term found at one subsentence position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub term_id: String,
    pub position: usize,
    /// Union of the tokens of every synonym phrase that matched here.
    pub vocabulary: BTreeSet<String>,
}

#[derive(Debug, Clone)]
struct CompiledTerm {
    term_id: String,
    phrases: Vec<BTreeSet<String>>,
}

/// Matcher with every synonym phrase pre-tokenised.
#[derive(Debug, Clone)]
pub struct OntologyMatcher {
    terms: Vec<CompiledTerm>,
}

/// Lowercased alphanumeric tokens of a synonym phrase.
pub fn phrase_tokens(phrase: &str) -> BTreeSet<String> {
    let lower = phrase.to_lowercase();
    alphanumeric_words(&lower).map(str::to_string).collect()
}

impl OntologyMatcher {
    pub fn new(ontology: &OntologyDictionary) -> Self {
        let terms: Vec<CompiledTerm> = ontology
            .terms()
            .map(|(term_id, synonyms)| {
                let mut phrases: Vec<BTreeSet<String>> = synonyms
                    .iter()
                    .map(|s| phrase_tokens(s))
                    .filter(|tokens| !tokens.is_empty())
                    .collect();
                phrases.dedup();
                CompiledTerm {
                    term_id: term_id.to_string(),
                    phrases,
                }
            })
            .filter(|t| !t.phrases.is_empty())
            .collect();
        debug!("Compiled {} matchable terms", terms.len());
        Self { terms }
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// All raw matches, ordered by term ID then position.
    pub fn find_matches(&self, index: &PositionIndex) -> Vec<Match> {
        let mut matches = Vec::new();
        for term in &self.terms {
            let mut hits: BTreeMap<usize, BTreeSet<String>> = BTreeMap::new();
            for phrase in &term.phrases {
                for position in index.intersect(phrase.iter().map(String::as_str)) {
                    hits.entry(position).or_default().extend(phrase.iter().cloned());
                }
            }
            matches.extend(hits.into_iter().map(|(position, vocabulary)| Match {
                term_id: term.term_id.clone(),
                position,
                vocabulary,
            }));
        }
        matches
    }
}
