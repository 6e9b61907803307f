//! Safe / unsafe classification of raw matches.

use std::collections::BTreeSet;

use crate::flags::FlagSet;
use crate::normalise::TokenSet;

/// Default number of leading positions that are always safe.
pub const DEFAULT_EARLY_SAFE_POSITIONS: usize = 4;

/// Outcome for one match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Among the first positions of the document (problem list, chief complaint).
    SafeEarly,
    /// The subsentence carries an override word such as "inherited".
    SafeOverride,
    /// Every flag in the line belongs to the term's own vocabulary.
    SafeUnflagged,
    /// A flag outside the term's vocabulary modifies the line.
    Unsafe { flag: String },
}

impl Classification {
    pub fn is_safe(&self) -> bool {
        !matches!(self, Classification::Unsafe { .. })
    }
}

#[derive(Debug, Clone)]
pub struct Classifier {
    early_safe_positions: usize,
    override_words: Vec<String>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_EARLY_SAFE_POSITIONS, vec!["inherited".to_string()])
    }
}

impl Classifier {
    pub fn new(early_safe_positions: usize, override_words: Vec<String>) -> Self {
        Self {
            early_safe_positions,
            override_words,
        }
    }

    /// Classify a match at `position`.
    ///
    /// `subsentence` is the expanded token set of the matched subsentence,
    /// `line_flags` the flags of its containing line and `vocabulary` the
    /// synonym tokens that produced the match.
    pub fn classify(
        &self,
        position: usize,
        subsentence: &TokenSet,
        line_flags: &FlagSet,
        vocabulary: &BTreeSet<String>,
    ) -> Classification {
        if position < self.early_safe_positions {
            return Classification::SafeEarly;
        }
        if self.override_words.iter().any(|w| subsentence.mentions(w)) {
            return Classification::SafeOverride;
        }
        match line_flags.tokens().find(|flag| !vocabulary.contains(*flag)) {
            Some(flag) => Classification::Unsafe {
                flag: flag.to_string(),
            },
            None => Classification::SafeUnflagged,
        }
    }
}
