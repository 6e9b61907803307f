//! Configuration loading for phenex.
//! Reads phenex.toml from the path in PHENEX_CONFIG, the current directory,
//! or the user config directory, in that order.

use std::path::{Path, PathBuf};

use anyhow::Context;
use phenex_ner::{ExtractorConfig, FlagCatalog, FlagCategory};
use serde::{Deserialize, Serialize};

use crate::output::OutputFormat;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ontology: OntologyConfig,
    #[serde(default)]
    pub extraction: ExtractorConfig,
    #[serde(default)]
    pub flags: FlagsConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OntologyConfig {
    #[serde(default = "default_term_names")]
    pub term_names: PathBuf,
    #[serde(default = "default_synonyms")]
    pub synonyms: PathBuf,
}

fn default_term_names() -> PathBuf { PathBuf::from("data/hpo_term_names.txt") }
fn default_synonyms()   -> PathBuf { PathBuf::from("data/hpo_synonyms.txt") }

impl Default for OntologyConfig {
    fn default() -> Self {
        Self {
            term_names: default_term_names(),
            synonyms: default_synonyms(),
        }
    }
}

/// Per-category keyword overrides. An absent category keeps its built-in
/// list; an empty list disables it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlagsConfig {
    pub negative: Option<Vec<String>>,
    pub family: Option<Vec<String>>,
    pub healthy: Option<Vec<String>>,
    pub disease: Option<Vec<String>>,
    pub treatment: Option<Vec<String>>,
    pub history: Option<Vec<String>>,
    pub mild: Option<Vec<String>>,
    pub uncertain: Option<Vec<String>>,
}

impl FlagsConfig {
    fn overrides(&self) -> [(FlagCategory, &Option<Vec<String>>); 8] {
        [
            (FlagCategory::Negative, &self.negative),
            (FlagCategory::Family, &self.family),
            (FlagCategory::Healthy, &self.healthy),
            (FlagCategory::Disease, &self.disease),
            (FlagCategory::Treatment, &self.treatment),
            (FlagCategory::History, &self.history),
            (FlagCategory::Mild, &self.mild),
            (FlagCategory::Uncertain, &self.uncertain),
        ]
    }

    pub fn catalog(&self) -> FlagCatalog {
        self.overrides()
            .into_iter()
            .fold(FlagCatalog::default(), |catalog, (category, keywords)| match keywords {
                Some(keywords) => catalog.with_keywords(category, keywords.iter().cloned()),
                None => catalog,
            })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub include_unsafe: bool,
}

impl Config {
    /// Path of the configuration file to read, if any exists.
    pub fn locate() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("PHENEX_CONFIG") {
            return Some(PathBuf::from(path));
        }
        let local = PathBuf::from("phenex.toml");
        if local.exists() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|dir| dir.join("phenex").join("phenex.toml"))
            .filter(|path| path.exists())
    }

    /// Load configuration from `explicit`, or from the first located file.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => Self::locate().context("no phenex.toml found")?,
        };

        if !path.exists() {
            anyhow::bail!(
                "Config file not found: {}\n\
                 Copy phenex.example.toml to phenex.toml and edit it.",
                path.display()
            );
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.extraction.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests;
