//! Reverse index from normalised token to subsentence positions.

use std::collections::BTreeSet;

use ahash::AHashMap;

use crate::normalise::TokenSet;

/// Accumulates token postings; call [`IndexBuilder::build`] to freeze.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    postings: AHashMap<String, BTreeSet<usize>>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, position: usize, tokens: &TokenSet) {
        for token in tokens.iter() {
            self.postings.entry(token.to_string()).or_default().insert(position);
        }
    }

    pub fn build(self) -> PositionIndex {
        PositionIndex {
            postings: self.postings,
        }
    }
}

/// Immutable token → positions map for one document.
#[derive(Debug, Default)]
pub struct PositionIndex {
    postings: AHashMap<String, BTreeSet<usize>>,
}

impl PositionIndex {
    pub fn positions(&self, token: &str) -> Option<&BTreeSet<usize>> {
        self.postings.get(token)
    }

    /// Positions holding every one of `tokens`. Empty when `tokens` is empty
    /// or any token is absent.
    pub fn intersect<'a, I>(&self, tokens: I) -> BTreeSet<usize>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut tokens = tokens.into_iter();
        let Some(first) = tokens.next() else {
            return BTreeSet::new();
        };
        let Some(initial) = self.postings.get(first) else {
            return BTreeSet::new();
        };
        let mut current = initial.clone();
        for token in tokens {
            let Some(postings) = self.postings.get(token) else {
                return BTreeSet::new();
            };
            current.retain(|p| postings.contains(p));
            if current.is_empty() {
                break;
            }
        }
        current
    }
}
