//! Sentence and clause segmentation of clinical narratives.
//!
//! A narrative is cut into sentences, and every sentence into subsentences
//! (clause-level units). Each configured [`SegmentationStrategy`] produces its
//! own sentence list and the lists are concatenated, so the same clause can be
//! covered twice. That overlap is expected: matches are deduplicated per
//! position further down the pipeline.

use serde::{Deserialize, Serialize};

/// Characters that close a sentence when they end a word.
const SENTENCE_END_CHARS: &[char] = &['.', '•', ';', '\t'];

/// Words that open a new sentence after themselves.
const SENTENCE_END_WORDS: &[&str] = &["but", "except", "however", "though"];

/// Characters that close a subsentence when they end a word.
const CLAUSE_END_CHARS: &[char] = &[':', ','];

/// Words that close a subsentence.
const CLAUSE_END_WORDS: &[&str] = &["and"];

/// How a narrative is turned into sentences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentationStrategy {
    /// The whole narrative is read as one line; every line takes part.
    Flattened,
    /// Lines are read one by one and only lines holding a colon are kept,
    /// since those are the "Label: finding" statements of a clinical note.
    Linewise,
}

/// One sentence-level line of the segmented narrative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    pub subsentences: Vec<String>,
}

impl Sentence {
    /// The full sentence, rebuilt from its subsentences.
    pub fn text(&self) -> String {
        self.subsentences.join(" ")
    }
}

/// A clause-level span with its document-wide position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subsentence<'a> {
    pub position: usize,
    pub sentence: usize,
    pub text: &'a str,
}

/// The segmented form of one narrative.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    sentences: Vec<Sentence>,
}

impl Document {
    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    /// All subsentences in input order, numbered from zero.
    pub fn subsentences(&self) -> impl Iterator<Item = Subsentence<'_>> {
        self.sentences
            .iter()
            .enumerate()
            .flat_map(|(sentence, s)| s.subsentences.iter().map(move |text| (sentence, text)))
            .enumerate()
            .map(|(position, (sentence, text))| Subsentence {
                position,
                sentence,
                text: text.as_str(),
            })
    }

    pub fn subsentence_count(&self) -> usize {
        self.sentences.iter().map(|s| s.subsentences.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.subsentence_count() == 0
    }
}

/// Runs a list of segmentation strategies and concatenates their output.
#[derive(Debug, Clone)]
pub struct Segmenter {
    strategies: Vec<SegmentationStrategy>,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(vec![SegmentationStrategy::Flattened, SegmentationStrategy::Linewise])
    }
}

impl Segmenter {
    pub fn new(strategies: Vec<SegmentationStrategy>) -> Self {
        Self { strategies }
    }

    pub fn strategies(&self) -> &[SegmentationStrategy] {
        &self.strategies
    }

    pub fn segment(&self, narrative: &str) -> Document {
        let mut sentences = Vec::new();
        for strategy in &self.strategies {
            let raw = match strategy {
                SegmentationStrategy::Flattened => flattened_sentences(narrative),
                SegmentationStrategy::Linewise => linewise_sentences(narrative),
            };
            sentences.extend(raw.iter().map(|s| Sentence {
                subsentences: split_clauses(s),
            }));
        }
        Document { sentences }
    }
}

fn flattened_sentences(narrative: &str) -> Vec<String> {
    let joined = narrative
        .split('\n')
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let mut sentences = Vec::new();
    collect_sentences(joined.split(' '), &mut sentences);
    sentences
}

fn linewise_sentences(narrative: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    for line in narrative.split('\n') {
        if !line.contains(':') {
            continue;
        }
        collect_sentences(line.trim().split(' '), &mut sentences);
    }
    sentences
}

fn collect_sentences<'a>(words: impl Iterator<Item = &'a str>, out: &mut Vec<String>) {
    let mut current: Vec<String> = Vec::new();
    for word in words {
        if word.is_empty() {
            continue;
        }
        let word = word.to_lowercase();
        let closes = ends_sentence(&word);
        current.push(word);
        if closes {
            out.push(current.join(" "));
            current.clear();
        }
    }
    if !current.is_empty() {
        out.push(current.join(" "));
    }
}

fn split_clauses(sentence: &str) -> Vec<String> {
    let mut clauses = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for word in sentence.split(' ') {
        current.push(word);
        if ends_clause(word) {
            clauses.push(current.join(" "));
            current.clear();
        }
    }
    if !current.is_empty() {
        clauses.push(current.join(" "));
    }
    clauses
}

fn ends_sentence(word: &str) -> bool {
    word.chars().last().is_some_and(|c| SENTENCE_END_CHARS.contains(&c))
        || SENTENCE_END_WORDS.contains(&word)
}

fn ends_clause(word: &str) -> bool {
    word.chars().last().is_some_and(|c| CLAUSE_END_CHARS.contains(&c))
        || CLAUSE_END_WORDS.contains(&word)
}
