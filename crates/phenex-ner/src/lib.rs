//! Rule-based phenotype concept extraction from clinical narratives.
//!
//! Matches ontology synonyms against lemma-expanded clause units, then sorts
//! every hit into a safe or unsafe table depending on the contextual flags
//! (negation, family attribution, "normal" findings, disease literature) found
//! around it. A biometric pre-pass turns standard-deviation scores and IQ
//! values into explanatory text before matching.
//!
//! Everything here is synchronous and free of I/O apart from the optional
//! dictionary loaders in [`ontology`].

pub mod biometrics;
pub mod classifier;
pub mod flags;
pub mod index;
pub mod matcher;
pub mod normalise;
pub mod ontology;
pub mod pipeline;
pub mod ranker;
pub mod segmenter;

pub use biometrics::{BiometricAnnotation, BiometricAnnotator, IqBand, Measurement, ParseFailure};
pub use classifier::{Classification, Classifier};
pub use flags::{ContextFlagger, FlagCatalog, FlagCategory, FlagSet};
pub use index::{IndexBuilder, PositionIndex};
pub use matcher::{Match, OntologyMatcher};
pub use normalise::{Lemmatizer, MorphyLemmatizer, Normalizer, TokenSet};
pub use ontology::{OntologyBuilder, OntologyDictionary};
pub use pipeline::{ExtractionResult, ExtractorConfig, PhenotypeExtractor};
pub use ranker::{rank_terms, ExtractionRow};
pub use segmenter::{Document, SegmentationStrategy, Segmenter, Sentence};

pub type Result<T> = std::result::Result<T, NerError>;

#[derive(Debug, thiserror::Error)]
pub enum NerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed row in {table} table at line {line}: {reason}")]
    MalformedRow {
        table: &'static str,
        line: usize,
        reason: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
