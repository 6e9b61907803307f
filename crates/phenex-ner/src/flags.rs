//! Context flags: keywords that change what a literal match means.
//!
//! A [`FlagCatalog`] maps each [`FlagCategory`] to its seed keywords. The
//! [`ContextFlagger`] lemma-expands the seeds once and then reports, per line,
//! which expanded keywords occur among the line's own expanded tokens.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::normalise::{Lemmatizer, Normalizer, TokenSet};

/// Recognised flag categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagCategory {
    Negative,
    Family,
    Healthy,
    Disease,
    Treatment,
    History,
    Mild,
    Uncertain,
}

impl FlagCategory {
    pub const ALL: [FlagCategory; 8] = [
        FlagCategory::Negative,
        FlagCategory::Family,
        FlagCategory::Healthy,
        FlagCategory::Disease,
        FlagCategory::Treatment,
        FlagCategory::History,
        FlagCategory::Mild,
        FlagCategory::Uncertain,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FlagCategory::Negative => "negative",
            FlagCategory::Family => "family",
            FlagCategory::Healthy => "healthy",
            FlagCategory::Disease => "disease",
            FlagCategory::Treatment => "treatment",
            FlagCategory::History => "history",
            FlagCategory::Mild => "mild",
            FlagCategory::Uncertain => "uncertain",
        }
    }

    /// Built-in seed keywords. Several categories are empty on purpose.
    pub fn default_keywords(&self) -> &'static [&'static str] {
        match self {
            FlagCategory::Negative => &[
                "no", "not", "none", "negative", "non", "never", "without", "denies", "haven't",
                "don't", "doesn't", "haven t", "don t", "doesn t", "didn t", "doesn", "don", "haven",
                "didn",
            ],
            FlagCategory::Family => &[
                "<person>", "<person", "cousin", "parent", "mom", "mother", "dad", "father",
                "grandmother", "grandfather", "grandparent", "family", "brother", "sister",
                "sibling", "uncle", "aunt", "nephew", "niece", "son", "daughter", "grandchild",
            ],
            FlagCategory::Healthy => &["normal"],
            FlagCategory::Disease => &[
                "associated", "gene", "recessive", "dominant", "variant", "cause", "literature",
                "individuals",
            ],
            FlagCategory::Treatment
            | FlagCategory::History
            | FlagCategory::Mild
            | FlagCategory::Uncertain => &[],
        }
    }
}

/// Seed keywords per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagCatalog {
    categories: BTreeMap<FlagCategory, BTreeSet<String>>,
}

impl Default for FlagCatalog {
    fn default() -> Self {
        let categories = FlagCategory::ALL
            .iter()
            .map(|c| (*c, c.default_keywords().iter().map(|k| k.to_string()).collect()))
            .collect();
        Self { categories }
    }
}

impl FlagCatalog {
    /// A catalog where every category is empty.
    pub fn empty() -> Self {
        let categories = FlagCategory::ALL.iter().map(|c| (*c, BTreeSet::new())).collect();
        Self { categories }
    }

    /// Replace the keywords of one category.
    pub fn with_keywords<I, S>(mut self, category: FlagCategory, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories
            .insert(category, keywords.into_iter().map(Into::into).collect());
        self
    }

    pub fn keywords(&self, category: FlagCategory) -> impl Iterator<Item = &str> {
        self.categories
            .get(&category)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }
}

/// Flags present in one line: flag token → first category that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagSet(BTreeMap<String, FlagCategory>);

impl FlagSet {
    pub fn iter(&self) -> impl Iterator<Item = (&str, FlagCategory)> {
        self.0.iter().map(|(t, c)| (t.as_str(), *c))
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.contains_key(token)
    }

    pub fn has_category(&self, category: FlagCategory) -> bool {
        self.0.values().any(|c| *c == category)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Detects flag keywords in lines.
#[derive(Debug, Clone)]
pub struct ContextFlagger {
    expanded: Vec<(FlagCategory, Vec<String>)>,
}

impl ContextFlagger {
    pub fn new<L: Lemmatizer>(catalog: &FlagCatalog, normalizer: &Normalizer<L>) -> Self {
        let expanded = FlagCategory::ALL
            .iter()
            .map(|category| {
                let mut keywords: Vec<String> = normalizer
                    .expand(catalog.keywords(*category))
                    .iter()
                    .map(str::to_string)
                    .collect();
                keywords.sort_unstable();
                (*category, keywords)
            })
            .collect();
        Self { expanded }
    }

    /// Flags whose expanded keyword appears in the line's expanded tokens.
    pub fn flags_for_line(&self, line_tokens: &TokenSet) -> FlagSet {
        let mut flags = BTreeMap::new();
        for (category, keywords) in &self.expanded {
            for keyword in keywords {
                if line_tokens.contains(keyword) {
                    flags.entry(keyword.clone()).or_insert(*category);
                }
            }
        }
        FlagSet(flags)
    }

    pub fn keyword_count(&self) -> usize {
        self.expanded.iter().map(|(_, k)| k.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flagger(catalog: &FlagCatalog) -> (ContextFlagger, Normalizer) {
        let norm = Normalizer::new();
        (ContextFlagger::new(catalog, &norm), norm)
    }

    #[test]
    fn test_default_catalog_has_all_categories() {
        let catalog = FlagCatalog::default();
        for category in FlagCategory::ALL {
            let count = catalog.keywords(category).count();
            assert_eq!(count, category.default_keywords().len(), "{}", category.as_str());
        }
        assert_eq!(catalog.keywords(FlagCategory::Treatment).count(), 0);
    }

    #[test]
    fn test_negation_is_lemma_expanded() {
        let (flagger, norm) = flagger(&FlagCatalog::default());
        let flags = flagger.flags_for_line(&norm.expand_text("he denies headache"));
        assert!(flags.contains("denies"));
        assert!(flags.has_category(FlagCategory::Negative));
        assert!(!flags.has_category(FlagCategory::Family));
    }

    #[test]
    fn test_family_and_healthy() {
        let (flagger, norm) = flagger(&FlagCatalog::default());
        let flags = flagger.flags_for_line(&norm.expand_text("his mother has normal hearing"));
        assert!(flags.contains("mother"));
        assert!(flags.contains("normal"));
        assert_eq!(flags.iter().find(|(t, _)| *t == "normal").map(|(_, c)| c), Some(FlagCategory::Healthy));
    }

    #[test]
    fn test_plural_line_matches_singular_flag() {
        let (flagger, norm) = flagger(&FlagCatalog::default());
        let flags = flagger.flags_for_line(&norm.expand_text("two brothers are affected"));
        assert!(flags.contains("brother"));
    }

    #[test]
    fn test_empty_catalog_flags_nothing() {
        let (flagger, norm) = flagger(&FlagCatalog::empty());
        assert_eq!(flagger.keyword_count(), 0);
        assert!(flagger.flags_for_line(&norm.expand_text("no fever")).is_empty());
    }

    #[test]
    fn test_custom_category_keywords() {
        let catalog = FlagCatalog::empty().with_keywords(FlagCategory::Uncertain, ["possible", "suspected"]);
        let (flagger, norm) = flagger(&catalog);
        let flags = flagger.flags_for_line(&norm.expand_text("suspected scoliosis"));
        assert!(flags.has_category(FlagCategory::Uncertain));
    }
}
