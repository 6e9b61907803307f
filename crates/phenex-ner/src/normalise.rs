//! Token normalisation: cleaning, lemmatisation and variant expansion.
//!
//! Every word is expanded into a set of surface variants so that a synonym
//! written "seizure" still finds "seizures", and "reduced" still finds
//! "decreased". Three sources feed the set:
//! - a WordNet-style [`Lemmatizer`] (plural nouns to singular),
//! - the fixed low/high/abnormal synonym clusters,
//! - a table of length-gated suffix rules tuned on phenotype vocabulary.
//!
//! Expansion is repeated until no new variant appears, so expanding an
//! already expanded set is a no-op.

use ahash::AHashSet;

/// Upper bound on expansion rounds; every rule chain settles well before it.
const MAX_EXPANSION_ROUNDS: usize = 16;

const LOW_SYNONYMS: &[&str] = &[
    "low", "decreased", "decrease", "deficient", "deficiency", "deficit", "deficits", "reduce",
    "reduced", "lack", "lacking", "insufficient", "impairment", "impaired", "impair", "difficulty",
    "difficulties", "trouble",
];

const HIGH_SYNONYMS: &[&str] = &["high", "increased", "increase", "elevated", "elevate", "elevation"];

const ABNORMAL_SYNONYMS: &[&str] = &[
    "abnormal", "unusual", "atypical", "abnormality", "anomaly", "anomalies", "problem",
];

const SYNONYM_CLUSTERS: &[&[&str]] = &[LOW_SYNONYMS, HIGH_SYNONYMS, ABNORMAL_SYNONYMS];

/// Irregular plurals common in clinical writing.
const PLURAL_EXCEPTIONS: &[(&str, &str)] = &[
    ("analyses", "analysis"),
    ("appendices", "appendix"),
    ("bacteria", "bacterium"),
    ("bronchi", "bronchus"),
    ("calves", "calf"),
    ("children", "child"),
    ("criteria", "criterion"),
    ("diagnoses", "diagnosis"),
    ("feet", "foot"),
    ("fibroses", "fibrosis"),
    ("foci", "focus"),
    ("geese", "goose"),
    ("halves", "half"),
    ("indices", "index"),
    ("knives", "knife"),
    ("lice", "louse"),
    ("matrices", "matrix"),
    ("men", "man"),
    ("metastases", "metastasis"),
    ("mice", "mouse"),
    ("nuclei", "nucleus"),
    ("people", "person"),
    ("phalanges", "phalanx"),
    ("phenomena", "phenomenon"),
    ("prognoses", "prognosis"),
    ("stenoses", "stenosis"),
    ("teeth", "tooth"),
    ("testes", "testis"),
    ("vertebrae", "vertebra"),
    ("women", "woman"),
];

/// Strip everything but ASCII letters and digits, then lowercase.
pub fn clean_token(word: &str) -> String {
    word.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Split text on runs of non-alphanumeric characters.
pub fn alphanumeric_words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_ascii_alphanumeric()).filter(|w| !w.is_empty())
}

/// All members of every synonym cluster holding `word`.
pub fn synonym_lemmas(word: &str) -> impl Iterator<Item = &'static str> + '_ {
    SYNONYM_CLUSTERS
        .iter()
        .filter(move |cluster| cluster.contains(&word))
        .flat_map(|cluster| cluster.iter().copied())
}

/// Suffix-rule variants of a word. Rules fire independently and accumulate.
pub fn custom_lemmas(word: &str) -> Vec<String> {
    let mut out = Vec::new();
    let len = word.chars().count();
    if len < 2 {
        return out;
    }
    if let Some(stem) = word.strip_suffix('s') {
        out.push(stem.to_string());
    }
    if let Some(stem) = word.strip_suffix('i') {
        out.push(format!("{stem}us"));
    }
    if let Some(stem) = word.strip_suffix('a') {
        out.push(format!("{stem}um"));
        out.push(format!("{stem}on"));
    }
    if len < 3 {
        return out;
    }
    if let Some(stem) = word.strip_suffix("es") {
        out.push(stem.to_string());
        out.push(format!("{stem}is"));
    }
    if let Some(stem) = word.strip_suffix("ic") {
        out.push(format!("{stem}ia"));
        out.push(format!("{stem}y"));
    }
    if let Some(stem) = word.strip_suffix("ly") {
        out.push(stem.to_string());
    }
    if let Some(stem) = word.strip_suffix("ed") {
        out.push(stem.to_string());
    }
    if len < 4 {
        return out;
    }
    if let Some(stem) = word.strip_suffix("ta") {
        if stem.ends_with('a') {
            out.push(stem.to_string());
        }
    }
    if let Some(stem) = word.strip_suffix("ies") {
        out.push(format!("{stem}y"));
    }
    if let Some(stem) = word.strip_suffix("le") {
        if stem.ends_with('b') {
            out.push(format!("{stem}ility"));
        }
    }
    if len < 7 {
        return out;
    }
    if let Some(stem) = word.strip_suffix("ility") {
        if stem.ends_with('b') {
            out.push(format!("{stem}le"));
        }
    }
    if len < 8 {
        return out;
    }
    if let Some(stem) = word.strip_suffix("ication") {
        out.push(format!("{stem}y"));
        out.push(format!("{stem}ied"));
    }
    out
}

/// Maps a cleaned word to its dictionary form.
pub trait Lemmatizer: Send + Sync {
    fn lemmatize(&self, word: &str) -> String;
}

/// Noun lemmatiser following WordNet's morphological detachment rules,
/// without a backing lexicon: the exception table covers irregular plurals
/// and the regular rules are applied to everything else.
#[derive(Debug, Clone, Copy, Default)]
pub struct MorphyLemmatizer;

impl Lemmatizer for MorphyLemmatizer {
    fn lemmatize(&self, word: &str) -> String {
        if let Some((_, lemma)) = PLURAL_EXCEPTIONS.iter().find(|(plural, _)| *plural == word) {
            return lemma.to_string();
        }
        if word.len() < 4 || word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
            return word.to_string();
        }
        if let Some(stem) = word.strip_suffix("ies") {
            return format!("{stem}y");
        }
        for suffix in ["sses", "xes", "zzes", "shes"] {
            if let Some(stem) = word.strip_suffix(suffix) {
                return format!("{stem}{}", &suffix[..suffix.len() - 2]);
            }
        }
        if word.ends_with("ches") && !word.ends_with("aches") {
            return word[..word.len() - 2].to_string();
        }
        match word.strip_suffix('s') {
            Some(stem) => stem.to_string(),
            None => word.to_string(),
        }
    }
}

/// A lemma/synonym-expanded set of normalised tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSet(AHashSet<String>);

impl TokenSet {
    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when any token contains `needle` as a substring.
    pub fn mentions(&self, needle: &str) -> bool {
        self.0.iter().any(|t| t.contains(needle))
    }

    /// Tokens in lexical order, for stable display.
    pub fn sorted(&self) -> Vec<&str> {
        let mut tokens: Vec<&str> = self.iter().collect();
        tokens.sort_unstable();
        tokens
    }
}

impl FromIterator<String> for TokenSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().filter(|t| !t.is_empty()).collect())
    }
}

/// Expands words into [`TokenSet`]s.
#[derive(Debug, Clone, Default)]
pub struct Normalizer<L = MorphyLemmatizer> {
    lemmatizer: L,
}

impl Normalizer<MorphyLemmatizer> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<L: Lemmatizer> Normalizer<L> {
    pub fn with_lemmatizer(lemmatizer: L) -> Self {
        Self { lemmatizer }
    }

    /// Expand a bag of raw words. The words themselves are kept.
    pub fn expand<I, S>(&self, words: I) -> TokenSet
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set: AHashSet<String> = AHashSet::new();
        let mut frontier = Vec::new();
        for word in words {
            let word = word.as_ref();
            if !word.is_empty() && set.insert(word.to_string()) {
                frontier.push(word.to_string());
            }
        }

        let mut rounds = 0;
        while !frontier.is_empty() && rounds < MAX_EXPANSION_ROUNDS {
            let mut next = Vec::new();
            for word in &frontier {
                for variant in self.variants(word) {
                    if !variant.is_empty() && !set.contains(&variant) {
                        set.insert(variant.clone());
                        next.push(variant);
                    }
                }
            }
            frontier = next;
            rounds += 1;
        }

        TokenSet(set)
    }

    /// Expand the alphanumeric words of a piece of text.
    pub fn expand_text(&self, text: &str) -> TokenSet {
        self.expand(alphanumeric_words(text))
    }

    /// A single round of expansion: the words and their direct variants,
    /// without chaining rules. Used for line flags, where a chain such as
    /// `nosed -> nos -> no` would invent a negation.
    pub fn expand_once<I, S>(&self, words: I) -> TokenSet
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set: AHashSet<String> = AHashSet::new();
        for word in words {
            let word = word.as_ref();
            if word.is_empty() {
                continue;
            }
            set.insert(word.to_string());
            set.extend(self.variants(word).into_iter().filter(|v| !v.is_empty()));
        }
        TokenSet(set)
    }

    pub fn expand_text_once(&self, text: &str) -> TokenSet {
        self.expand_once(alphanumeric_words(text))
    }

    /// Expand an already built set again.
    pub fn expand_set(&self, tokens: &TokenSet) -> TokenSet {
        self.expand(tokens.iter())
    }

    fn variants(&self, word: &str) -> Vec<String> {
        let mut out = vec![self.lemmatizer.lemmatize(&clean_token(word))];
        out.extend(synonym_lemmas(word).map(str::to_string));
        out.extend(custom_lemmas(word));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(set: &TokenSet) -> Vec<&str> {
        set.sorted()
    }

    #[test]
    fn test_clean_token() {
        assert_eq!(clean_token("Seizures,"), "seizures");
        assert_eq!(clean_token("<person>"), "person");
        assert_eq!(clean_token("(+2.5"), "25");
        assert_eq!(clean_token(""), "");
    }

    #[test]
    fn test_alphanumeric_words() {
        let words: Vec<&str> = alphanumeric_words("short-stature, (mild)").collect();
        assert_eq!(words, vec!["short", "stature", "mild"]);
    }

    #[test]
    fn test_custom_lemmas_accumulate() {
        let lemmas = custom_lemmas("epileptic");
        assert!(lemmas.contains(&"epileptia".to_string()));
        assert!(lemmas.contains(&"epilepty".to_string()));

        let lemmas = custom_lemmas("anomalies");
        assert!(lemmas.contains(&"anomalie".to_string()));
        assert!(lemmas.contains(&"anomali".to_string()));
        assert!(lemmas.contains(&"anomaly".to_string()));
    }

    #[test]
    fn test_custom_lemmas_length_gates() {
        assert!(custom_lemmas("").is_empty());
        assert!(custom_lemmas("s").is_empty());
        assert_eq!(custom_lemmas("is"), vec!["i".to_string()]);
        // "ication" only fires from eight characters up
        assert!(custom_lemmas("ossification").contains(&"ossify".to_string()));
        assert!(custom_lemmas("ossification").contains(&"ossified".to_string()));
    }

    #[test]
    fn test_ble_bility_pair() {
        assert!(custom_lemmas("irritable").contains(&"irritability".to_string()));
        assert!(custom_lemmas("irritability").contains(&"irritable".to_string()));
        assert!(custom_lemmas("stomata").contains(&"stoma".to_string()));
    }

    #[test]
    fn test_morphy_lemmatizer() {
        let lem = MorphyLemmatizer;
        assert_eq!(lem.lemmatize("seizures"), "seizure");
        assert_eq!(lem.lemmatize("diseases"), "disease");
        assert_eq!(lem.lemmatize("headaches"), "headache");
        assert_eq!(lem.lemmatize("patches"), "patch");
        assert_eq!(lem.lemmatize("abnormalities"), "abnormality");
        assert_eq!(lem.lemmatize("teeth"), "tooth");
        assert_eq!(lem.lemmatize("diagnosis"), "diagnosis");
        assert_eq!(lem.lemmatize("fetus"), "fetus");
        assert_eq!(lem.lemmatize("no"), "no");
    }

    #[test]
    fn test_synonym_cluster_expansion() {
        let norm = Normalizer::new();
        let set = norm.expand(["reduced"]);
        assert!(set.contains("decreased"));
        assert!(set.contains("low"));
        assert!(!set.contains("high"));
    }

    #[test]
    fn test_expansion_keeps_raw_words() {
        let norm = Normalizer::new();
        let set = norm.expand(["<person>", "seizures"]);
        assert!(set.contains("<person>"));
        assert!(set.contains("person"));
        assert!(set.contains("seizures"));
        assert!(set.contains("seizure"));
    }

    #[test]
    fn test_expand_empty_input() {
        let norm = Normalizer::new();
        assert!(norm.expand(Vec::<String>::new()).is_empty());
        assert!(norm.expand([""]).is_empty());
        assert!(norm.expand_text("  ,, ").is_empty());
    }

    #[test]
    fn test_expansion_is_idempotent() {
        let norm = Normalizer::new();
        for text in ["denies seizures and abnormal gait", "epileptic irritability", "the families"] {
            let once = norm.expand_text(text);
            let twice = norm.expand_set(&once);
            assert_eq!(sorted(&once), sorted(&twice), "not idempotent for {text:?}");
        }
    }

    #[test]
    fn test_single_round_does_not_chain_rules() {
        let norm = Normalizer::new();
        let once = norm.expand_text_once("flat nosed");
        assert!(once.contains("nos"));
        assert!(!once.contains("no"));
        assert!(norm.expand_text("flat nosed").contains("no"));
        assert!(norm.expand_text_once("two brothers").contains("brother"));
    }

    struct Identity;
    impl Lemmatizer for Identity {
        fn lemmatize(&self, word: &str) -> String {
            word.to_string()
        }
    }

    #[test]
    fn test_custom_lemmatizer_is_used() {
        let norm = Normalizer::with_lemmatizer(Identity);
        let set = norm.expand(["teeth"]);
        assert!(!set.contains("tooth"));
        assert!(set.contains("teeth"));
    }
}
