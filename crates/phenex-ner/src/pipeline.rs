//! End-to-end extraction: narrative in, ranked safe/unsafe tables out.
//!
//! ```ignore
//! let ontology = Arc::new(OntologyDictionary::from_files(names, synonyms)?);
//! let extractor = PhenotypeExtractor::new(ontology, ExtractorConfig::default(), FlagCatalog::default())?;
//! let result = extractor.extract("Seizures since birth. He denies headache.");
//! ```
//!
//! An extractor is immutable once built; `extract` can be called from many
//! threads at once and each call builds its own index.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::biometrics::BiometricAnnotator;
use crate::classifier::{Classifier, DEFAULT_EARLY_SAFE_POSITIONS};
use crate::flags::{ContextFlagger, FlagCatalog};
use crate::index::IndexBuilder;
use crate::matcher::OntologyMatcher;
use crate::normalise::{Normalizer, TokenSet};
use crate::ontology::OntologyDictionary;
use crate::ranker::{ranked_rows, ExtractionRow};
use crate::segmenter::{SegmentationStrategy, Segmenter};
use crate::{NerError, Result};

/// Tunables of one extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Positions below this index are always safe.
    #[serde(default = "default_early_safe_positions")]
    pub early_safe_positions: usize,

    /// Words whose presence in a subsentence forces it safe.
    #[serde(default = "default_safe_override_words")]
    pub safe_override_words: Vec<String>,

    /// Run the biometric annotator before matching.
    #[serde(default = "default_biometrics")]
    pub biometrics: bool,

    #[serde(default = "default_segmentation")]
    pub segmentation: Vec<SegmentationStrategy>,
}

fn default_early_safe_positions() -> usize {
    DEFAULT_EARLY_SAFE_POSITIONS
}

fn default_safe_override_words() -> Vec<String> {
    vec!["inherited".to_string()]
}

fn default_biometrics() -> bool {
    true
}

fn default_segmentation() -> Vec<SegmentationStrategy> {
    vec![SegmentationStrategy::Flattened, SegmentationStrategy::Linewise]
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            early_safe_positions: default_early_safe_positions(),
            safe_override_words: default_safe_override_words(),
            biometrics: default_biometrics(),
            segmentation: default_segmentation(),
        }
    }
}

impl ExtractorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.segmentation.is_empty() {
            return Err(NerError::InvalidConfig(
                "at least one segmentation strategy is required".to_string(),
            ));
        }
        if let Some(word) = self.safe_override_words.iter().find(|w| w.trim().is_empty()) {
            return Err(NerError::InvalidConfig(format!(
                "blank safe override word {:?} would match every subsentence",
                word
            )));
        }
        Ok(())
    }
}

/// Output of one extraction call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub safe_table: Vec<ExtractionRow>,
    pub unsafe_table: Vec<ExtractionRow>,
    /// Terms the biometric pass appended to the narrative, in order.
    pub derived_terms: Vec<String>,
}

impl ExtractionResult {
    pub fn is_empty(&self) -> bool {
        self.safe_table.is_empty() && self.unsafe_table.is_empty()
    }
}

/// The assembled engine.
pub struct PhenotypeExtractor {
    ontology: Arc<OntologyDictionary>,
    normalizer: Normalizer,
    flagger: ContextFlagger,
    matcher: OntologyMatcher,
    classifier: Classifier,
    segmenter: Segmenter,
    annotator: Option<BiometricAnnotator>,
}

impl PhenotypeExtractor {
    pub fn new(ontology: Arc<OntologyDictionary>, config: ExtractorConfig, catalog: FlagCatalog) -> Result<Self> {
        config.validate()?;
        let normalizer = Normalizer::new();
        let flagger = ContextFlagger::new(&catalog, &normalizer);
        let matcher = OntologyMatcher::new(&ontology);
        info!(
            "Phenotype extractor ready: {} matchable terms, {} flag keywords, biometrics {}",
            matcher.term_count(),
            flagger.keyword_count(),
            if config.biometrics { "on" } else { "off" }
        );
        Ok(Self {
            ontology,
            normalizer,
            flagger,
            matcher,
            classifier: Classifier::new(config.early_safe_positions, config.safe_override_words),
            segmenter: Segmenter::new(config.segmentation),
            annotator: config.biometrics.then(BiometricAnnotator::new),
        })
    }

    /// Extractor with default configuration and flag catalog.
    pub fn with_defaults(ontology: Arc<OntologyDictionary>) -> Result<Self> {
        Self::new(ontology, ExtractorConfig::default(), FlagCatalog::default())
    }

    pub fn ontology(&self) -> &OntologyDictionary {
        &self.ontology
    }

    pub fn extract(&self, narrative: &str) -> ExtractionResult {
        let (text, derived_terms) = match &self.annotator {
            Some(annotator) => {
                let annotation = annotator.annotate(narrative);
                (annotation.text, annotation.derived_terms)
            }
            None => (narrative.to_string(), Vec::new()),
        };

        let document = self.segmenter.segment(&text);
        let sentence_text: Vec<String> = document.sentences().iter().map(|s| s.text()).collect();
        // Flags see one round of expansion only; chained suffix rules invent keywords
        let line_flags: Vec<_> = sentence_text
            .iter()
            .map(|line| self.flagger.flags_for_line(&self.normalizer.expand_text_once(line)))
            .collect();

        let mut builder = IndexBuilder::new();
        let mut subsentence_tokens: Vec<TokenSet> = Vec::with_capacity(document.subsentence_count());
        let mut sentence_of: Vec<usize> = Vec::with_capacity(document.subsentence_count());
        for sub in document.subsentences() {
            let tokens = self.normalizer.expand_text(sub.text);
            builder.add(sub.position, &tokens);
            subsentence_tokens.push(tokens);
            sentence_of.push(sub.sentence);
        }
        let index = builder.build();

        let mut safe: BTreeMap<String, BTreeSet<usize>> = BTreeMap::new();
        let mut unsafe_: BTreeMap<String, BTreeSet<usize>> = BTreeMap::new();
        let matches = self.matcher.find_matches(&index);
        for m in &matches {
            let sentence = sentence_of[m.position];
            let verdict = self.classifier.classify(
                m.position,
                &subsentence_tokens[m.position],
                &line_flags[sentence],
                &m.vocabulary,
            );
            let table = if verdict.is_safe() { &mut safe } else { &mut unsafe_ };
            table.entry(m.term_id.clone()).or_default().insert(m.position);
        }

        let name_of = |id: &str| self.ontology.name(id).unwrap_or_default().to_string();
        let example_of = |position: usize| sentence_text[sentence_of[position]].clone();
        let result = ExtractionResult {
            safe_table: ranked_rows(&safe, name_of, example_of),
            unsafe_table: ranked_rows(&unsafe_, name_of, example_of),
            derived_terms,
        };

        debug!(
            "Extracted {} safe and {} unsafe terms from {} matches over {} subsentences",
            result.safe_table.len(),
            result.unsafe_table.len(),
            matches.len(),
            document.subsentence_count()
        );
        result
    }

    /// Extract several narratives. Parallel when the `parallel` feature is on.
    pub fn extract_batch(&self, narratives: &[&str]) -> Vec<ExtractionResult> {
        #[cfg(feature = "parallel")]
        {
            if narratives.len() > 1 {
                use rayon::prelude::*;
                return narratives.par_iter().map(|text| self.extract(text)).collect();
            }
        }
        narratives.iter().map(|text| self.extract(text)).collect()
    }
}
