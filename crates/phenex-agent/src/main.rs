//! phenex: phenotype term extraction from clinical narratives.
//! Entry point for the command-line binary.

mod config;
mod output;

use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use phenex_ner::{OntologyDictionary, PhenotypeExtractor};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "phenex",
    version,
    about = "Extract HPO phenotype terms from clinical narratives",
    long_about = "Reads one or more clinical narratives, matches them against an HPO term table and \
                  sorts every term into a safe table or an unsafe table (negated, family history, \
                  normal findings, disease literature)."
)]
struct Args {
    /// Narrative files; `-` or nothing reads standard input
    inputs: Vec<PathBuf>,

    /// Configuration file (default: $PHENEX_CONFIG, ./phenex.toml, then the user config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Skip the SD score / IQ annotation pass
    #[arg(long)]
    no_biometrics: bool,

    /// Append the unsafe table to TSV output
    #[arg(long)]
    include_unsafe: bool,

    /// Term name table (`term_id<TAB>name`)
    #[arg(long)]
    terms: Option<PathBuf>,

    /// Synonym table (`term_id<TAB>phrase`)
    #[arg(long)]
    synonyms: Option<PathBuf>,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(format) = self.format {
            config.output.format = format;
        }
        if self.no_biometrics {
            config.extraction.biometrics = false;
        }
        if self.include_unsafe {
            config.output.include_unsafe = true;
        }
        if let Some(ref terms) = self.terms {
            config.ontology.term_names = terms.clone();
        }
        if let Some(ref synonyms) = self.synonyms {
            config.ontology.synonyms = synonyms.clone();
        }
    }
}

fn read_inputs(inputs: &[PathBuf]) -> anyhow::Result<Vec<(String, String)>> {
    let stdin_only = [PathBuf::from("-")];
    let inputs = if inputs.is_empty() { &stdin_only[..] } else { inputs };

    let mut narratives = Vec::with_capacity(inputs.len());
    for path in inputs {
        if path.as_os_str() == "-" {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("reading narrative from stdin")?;
            narratives.push(("<stdin>".to_string(), text));
        } else {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading narrative {}", path.display()))?;
            narratives.push((path.display().to_string(), text));
        }
    }
    Ok(narratives)
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("phenex=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match args.config.as_deref() {
        Some(path) => Config::load(Some(path))?,
        None => match Config::load(None) {
            Ok(c) => c,
            Err(e) => {
                warn!("Could not load phenex.toml: {e}");
                warn!("Running with built-in defaults.");
                Config::default()
            }
        },
    };
    args.apply(&mut config);

    let ontology = OntologyDictionary::from_files(&config.ontology.term_names, &config.ontology.synonyms)
        .with_context(|| {
            format!(
                "loading ontology tables {} and {}",
                config.ontology.term_names.display(),
                config.ontology.synonyms.display()
            )
        })?;
    let extractor = PhenotypeExtractor::new(Arc::new(ontology), config.extraction.clone(), config.flags.catalog())?;

    let narratives = read_inputs(&args.inputs)?;
    let texts: Vec<&str> = narratives.iter().map(|(_, text)| text.as_str()).collect();
    let results = extractor.extract_batch(&texts);

    let mut stdout = std::io::stdout().lock();
    for ((label, _), result) in narratives.iter().zip(&results) {
        info!(
            "{}: {} safe, {} unsafe, {} derived",
            label,
            result.safe_table.len(),
            result.unsafe_table.len(),
            result.derived_terms.len()
        );
        if narratives.len() > 1 {
            writeln!(stdout, "# {label}")?;
        }
        let rendered = output::render(result, config.output.format, config.output.include_unsafe)?;
        stdout.write_all(rendered.as_bytes())?;
        if !rendered.ends_with('\n') {
            writeln!(stdout)?;
        }
    }
    Ok(())
}
