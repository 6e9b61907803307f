//! Biometric annotation: standard-deviation scores and IQ values to terms.
//!
//! Clinical letters often give growth parameters as numbers rather than
//! words ("weighs 93 kg (+3.6 SD)"). This pass reads those numbers and
//! appends the phenotype they imply as plain text, e.g.
//! `... (+3.6 SD) This means Increased body weight.`, so the regular
//! matcher can pick them up.
//!
//! Only sentences holding a unit marker (`cm`, `kg`, `qi`, `qit`) are read.
//! Weight, height and head circumference are extracted independently: a
//! sentence where one of them cannot be parsed still yields the others.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

const UNIT_MARKERS: &[&str] = &["cm", "kg", "qit", "qi"];
const SD_MARKERS: &[&str] = &["SD", "DS"];
const IQ_MARKERS: &[&str] = &["FSIQ", "IQ"];

/// Z-score magnitude from which a measurement is abnormal.
const SD_THRESHOLD: f64 = 2.0;

/// A growth parameter scored in standard deviations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measurement {
    Weight,
    Height,
    HeadCircumference,
}

impl Measurement {
    pub const ALL: [Measurement; 3] = [
        Measurement::Weight,
        Measurement::Height,
        Measurement::HeadCircumference,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Measurement::Weight => "weight",
            Measurement::Height => "height",
            Measurement::HeadCircumference => "head circumference",
        }
    }

    /// Term for a score, if it is at or beyond ±2 SD.
    pub fn term_for(&self, sd: f64) -> Option<&'static str> {
        let (high, low) = match self {
            Measurement::Weight => ("Increased body weight", "Decreased body weight"),
            Measurement::Height => ("Tall stature", "Short stature"),
            Measurement::HeadCircumference => ("Macrocephaly", "Microcephaly"),
        };
        if sd >= SD_THRESHOLD {
            Some(high)
        } else if sd <= -SD_THRESHOLD {
            Some(low)
        } else {
            None
        }
    }
}

/// Intellectual disability severity bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IqBand {
    Borderline,
    Mild,
    Moderate,
    Severe,
    Profound,
}

impl IqBand {
    /// Band for an IQ value; `None` from 84 up.
    pub fn from_score(iq: f64) -> Option<Self> {
        if iq < 20.0 {
            Some(IqBand::Profound)
        } else if iq < 35.0 {
            Some(IqBand::Severe)
        } else if iq < 50.0 {
            Some(IqBand::Moderate)
        } else if iq < 70.0 {
            Some(IqBand::Mild)
        } else if iq < 84.0 {
            Some(IqBand::Borderline)
        } else {
            None
        }
    }

    pub fn term(&self) -> &'static str {
        match self {
            IqBand::Borderline => "Intellectual disability, borderline",
            IqBand::Mild => "Intellectual disability, mild",
            IqBand::Moderate => "Intellectual disability, moderate",
            IqBand::Severe => "Intellectual disability, severe",
            IqBand::Profound => "Intellectual disability, profound",
        }
    }
}

/// Why one measurement of a sentence yielded nothing. Always recovered.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseFailure {
    #[error("no {0} marker in sentence")]
    MarkerAbsent(&'static str),

    #[error("no {0} score in sentence")]
    ScoreAbsent(&'static str),

    #[error("unparseable number {0:?}")]
    InvalidNumber(String),
}

/// Output of [`BiometricAnnotator::annotate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BiometricAnnotation {
    pub text: String,
    pub derived_terms: Vec<String>,
}

fn sd_score_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // A signed or unsigned number directly followed by "sd": "(+2.5 sd)", "-3,1sd"
    RE.get_or_init(|| Regex::new(r"([-+]?\s?\d+(?:[.,]\d+)?)\s*sd\b").expect("valid SD regex"))
}

fn unit_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d\s*(kg|cm|m)\b").expect("valid unit regex"))
}

fn head_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"head|cranial|\bofc\b|\bhc\b").expect("valid head regex"))
}

fn iq_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"iq\D*?(\d+(?:[.,]\d+)?)").expect("valid IQ regex"))
}

fn parse_number(raw: &str) -> Result<f64, ParseFailure> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    cleaned
        .parse::<f64>()
        .map_err(|_| ParseFailure::InvalidNumber(raw.to_string()))
}

/// Split one line into sentences at `.`, `!` or `?` followed by whitespace
/// or the end of the line. A decimal point never splits.
pub fn split_sentences(line: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = line.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let at_boundary = chars.peek().map_or(true, |(_, next)| next.is_whitespace());
        if at_boundary {
            let end = i + c.len_utf8();
            let sentence = line[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
        }
    }
    let rest = line[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences
}

/// Derives phenotype terms from biometric values.
#[derive(Debug, Clone, Copy, Default)]
pub struct BiometricAnnotator;

impl BiometricAnnotator {
    pub fn new() -> Self {
        Self
    }

    /// Annotate a whole narrative, line by line. Lines without derived terms
    /// are kept verbatim.
    pub fn annotate(&self, text: &str) -> BiometricAnnotation {
        let mut derived_terms = Vec::new();
        let mut lines = Vec::new();
        for line in text.split('\n') {
            let sentences = split_sentences(line);
            let mut changed = false;
            let mut rebuilt = Vec::with_capacity(sentences.len());
            for sentence in sentences {
                if sentence == "." {
                    changed = true;
                    continue;
                }
                let terms = self.derive_terms(sentence);
                if terms.is_empty() {
                    rebuilt.push(sentence.to_string());
                } else {
                    changed = true;
                    rebuilt.push(format!("{} This means {}.", sentence, terms.join(", ")));
                    derived_terms.extend(terms.iter().map(|t| t.to_string()));
                }
            }
            lines.push(if changed { rebuilt.join(" ") } else { line.to_string() });
        }
        BiometricAnnotation {
            text: lines.join("\n"),
            derived_terms,
        }
    }

    /// Terms implied by one sentence, in weight, height, head
    /// circumference, IQ order.
    pub fn derive_terms(&self, sentence: &str) -> Vec<&'static str> {
        let lower = sentence.to_lowercase();
        if !UNIT_MARKERS.iter().any(|u| lower.contains(u)) {
            return Vec::new();
        }

        let mut terms = Vec::new();
        if SD_MARKERS.iter().any(|m| sentence.contains(m)) {
            let scored = sentence.replace("DS", "SD").replace('\u{2212}', "-").to_lowercase();
            for measurement in Measurement::ALL {
                match self.measurement_score(&scored, measurement) {
                    Ok(sd) => terms.extend(measurement.term_for(sd)),
                    Err(e) => debug!("No {} term for {:?}: {}", measurement.as_str(), sentence, e),
                }
            }
        }
        if IQ_MARKERS.iter().any(|m| sentence.contains(m)) {
            match self.iq_score(&lower) {
                Ok(iq) => terms.extend(IqBand::from_score(iq).map(|b| b.term())),
                Err(e) => debug!("No IQ term for {:?}: {}", sentence, e),
            }
        }
        terms
    }

    /// SD score of one measurement in a lowercased sentence.
    ///
    /// Every "<number> sd" is attributed to the measurement named by the
    /// text between it and the previous score: the last unit wins (`kg` for
    /// weight, `cm`/`m` for height), and a head marker turns a length into
    /// head circumference.
    pub fn measurement_score(&self, sentence: &str, measurement: Measurement) -> Result<f64, ParseFailure> {
        let mut context_start = 0;
        for caps in sd_score_regex().captures_iter(sentence) {
            let (Some(whole), Some(number)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let context = &sentence[context_start..whole.start()];
            context_start = whole.end();
            if classify_context(context) == Some(measurement) {
                return parse_number(number.as_str());
            }
        }
        Err(ParseFailure::ScoreAbsent(measurement.as_str()))
    }

    /// First number after an IQ marker in a lowercased sentence.
    pub fn iq_score(&self, sentence: &str) -> Result<f64, ParseFailure> {
        if !sentence.contains("iq") {
            return Err(ParseFailure::MarkerAbsent("IQ"));
        }
        let number = iq_regex()
            .captures(sentence)
            .and_then(|caps| caps.get(1))
            .ok_or(ParseFailure::ScoreAbsent("IQ"))?;
        parse_number(number.as_str())
    }
}

fn classify_context(context: &str) -> Option<Measurement> {
    let unit = unit_regex()
        .captures_iter(context)
        .last()
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())?;
    match unit {
        "kg" => Some(Measurement::Weight),
        _ if head_regex().is_match(context) => Some(Measurement::HeadCircumference),
        _ => Some(Measurement::Height),
    }
}
