//! Ontology dictionary: term names and synonym phrases.
//!
//! Loaded once from two tab-separated tables and shared read-only by every
//! extraction call:
//! - term names: `term_id<TAB>name`, one line per term
//! - synonyms:   `term_id<TAB>synonym phrase`, any number of lines per term
//!
//! Usage:
//! ```ignore
//! let ontology = OntologyDictionary::from_files("hpo_term_names.txt", "hpo_synonyms.txt")?;
//! assert_eq!(ontology.name("HP:0001250"), Some("Seizure"));
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use tracing::{info, warn};

use crate::{NerError, Result};

/// Immutable term-name and synonym tables.
#[derive(Debug, Clone, Default)]
pub struct OntologyDictionary {
    names: BTreeMap<String, String>,
    synonyms: BTreeMap<String, BTreeSet<String>>,
}

impl OntologyDictionary {
    pub fn builder() -> OntologyBuilder {
        OntologyBuilder::default()
    }

    /// Parse both tables from in-memory TSV text.
    pub fn from_tables(names_tsv: &str, synonyms_tsv: &str) -> Result<Self> {
        let mut builder = Self::builder();
        for_each_row(names_tsv, "term names", |id, name| {
            builder.add_name(id, name);
        })?;
        for_each_row(synonyms_tsv, "synonyms", |id, phrase| {
            builder.add_synonym(id, phrase);
        })?;
        Ok(builder.build())
    }

    /// Read and parse both tables from disk.
    pub fn from_files(names_path: impl AsRef<Path>, synonyms_path: impl AsRef<Path>) -> Result<Self> {
        let names_path = names_path.as_ref();
        let synonyms_path = synonyms_path.as_ref();
        info!("Loading ontology from {:?} and {:?}", names_path, synonyms_path);
        let names = std::fs::read_to_string(names_path)?;
        let synonyms = std::fs::read_to_string(synonyms_path)?;
        Self::from_tables(&names, &synonyms)
    }

    pub fn name(&self, term_id: &str) -> Option<&str> {
        self.names.get(term_id).map(String::as_str)
    }

    pub fn synonyms(&self, term_id: &str) -> Option<&BTreeSet<String>> {
        self.synonyms.get(term_id)
    }

    /// Terms with at least one synonym, in term ID order.
    pub fn terms(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.synonyms.iter().map(|(id, syns)| (id.as_str(), syns))
    }

    pub fn term_count(&self) -> usize {
        self.names.len()
    }

    pub fn synonym_count(&self) -> usize {
        self.synonyms.values().map(BTreeSet::len).sum()
    }
}

/// Accumulates rows into an [`OntologyDictionary`].
#[derive(Debug, Default)]
pub struct OntologyBuilder {
    names: BTreeMap<String, String>,
    synonyms: BTreeMap<String, BTreeSet<String>>,
}

impl OntologyBuilder {
    pub fn add_name(&mut self, term_id: &str, name: &str) -> &mut Self {
        self.names.insert(term_id.to_string(), name.to_string());
        self
    }

    pub fn add_synonym(&mut self, term_id: &str, phrase: &str) -> &mut Self {
        self.synonyms
            .entry(term_id.to_string())
            .or_default()
            .insert(phrase.to_string());
        self
    }

    /// Add a term with its name, which also serves as a synonym.
    pub fn term(mut self, term_id: &str, name: &str) -> Self {
        self.add_name(term_id, name);
        self.add_synonym(term_id, name);
        self
    }

    pub fn synonym(mut self, term_id: &str, phrase: &str) -> Self {
        self.add_synonym(term_id, phrase);
        self
    }

    pub fn build(self) -> OntologyDictionary {
        let unnamed = self
            .synonyms
            .keys()
            .filter(|id| !self.names.contains_key(*id))
            .count();
        if unnamed > 0 {
            warn!("{} ontology terms have synonyms but no name", unnamed);
        }
        let dict = OntologyDictionary {
            names: self.names,
            synonyms: self.synonyms,
        };
        info!(
            "Ontology ready: {} terms, {} synonym phrases",
            dict.term_count(),
            dict.synonym_count()
        );
        dict
    }
}

fn for_each_row(text: &str, table: &'static str, mut row: impl FnMut(&str, &str)) -> Result<()> {
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut cols = line.split('\t');
        let id = cols.next().unwrap_or_default();
        let Some(value) = cols.next() else {
            return Err(NerError::MalformedRow {
                table,
                line: idx + 1,
                reason: "expected at least two tab-separated columns".to_string(),
            });
        };
        row(id, value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const NAMES: &str = "HP:0001250\tSeizure\nHP:0004322\tShort stature\n";
    const SYNONYMS: &str = "HP:0001250\tSeizure\nHP:0001250\tEpileptic seizure\n\nHP:0004322\tShort stature\n";

    #[test]
    fn test_from_tables() {
        let dict = OntologyDictionary::from_tables(NAMES, SYNONYMS).unwrap();
        assert_eq!(dict.term_count(), 2);
        assert_eq!(dict.synonym_count(), 3);
        assert_eq!(dict.name("HP:0001250"), Some("Seizure"));
        assert!(dict.synonyms("HP:0001250").unwrap().contains("Epileptic seizure"));
        let ids: Vec<&str> = dict.terms().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["HP:0001250", "HP:0004322"]);
    }

    #[test]
    fn test_malformed_row_reports_line() {
        let err = OntologyDictionary::from_tables(NAMES, "HP:0001250\tSeizure\nHP:0004322\n").unwrap_err();
        match err {
            NerError::MalformedRow { table, line, .. } => {
                assert_eq!(table, "synonyms");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_extra_columns_ignored() {
        let dict = OntologyDictionary::from_tables("HP:1\tName\textra\n", "HP:1\tname\tx\n").unwrap();
        assert_eq!(dict.name("HP:1"), Some("Name"));
        assert!(dict.synonyms("HP:1").unwrap().contains("name"));
    }

    #[test]
    fn test_builder_term_adds_name_as_synonym() {
        let dict = OntologyDictionary::builder()
            .term("HP:0002315", "Headache")
            .synonym("HP:0002315", "Cephalgia")
            .build();
        let syns = dict.synonyms("HP:0002315").unwrap();
        assert_eq!(syns.len(), 2);
        assert!(syns.contains("Headache"));
    }

    #[test]
    fn test_from_files() {
        let mut names = tempfile::NamedTempFile::new().unwrap();
        let mut syns = tempfile::NamedTempFile::new().unwrap();
        names.write_all(NAMES.as_bytes()).unwrap();
        syns.write_all(SYNONYMS.as_bytes()).unwrap();
        let dict = OntologyDictionary::from_files(names.path(), syns.path()).unwrap();
        assert_eq!(dict.name("HP:0004322"), Some("Short stature"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = OntologyDictionary::from_files("/nonexistent/names.tsv", "/nonexistent/syn.tsv").unwrap_err();
        assert!(matches!(err, NerError::Io(_)));
    }
}
