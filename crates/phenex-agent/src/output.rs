//! Result rendering for the command line.

use clap::ValueEnum;
use phenex_ner::{ExtractionResult, ExtractionRow};
use serde::{Deserialize, Serialize};

pub const TSV_HEADER: &str =
    "HPO ID\tPhenotype name\tNo. occurrences\tEarliness (lower = earlier)\tExample sentence";

pub const COMBINED_HEADER: &str = "HPO ID\tPhenotype name\tTo keep in list\tNo. occurrences\t\
                                   Earliness (lower = earlier)\tConfidence on extraction\tExample sentence";

const NO_TERMS: &str = "No HPO in letters.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Safe table as tab-separated values
    #[default]
    Tsv,
    /// Safe terms as a phenotype feature list
    Json,
    /// Comma-joined safe term IDs
    Ids,
    /// Safe and unsafe rows with a confidence column
    Combined,
}

#[derive(Serialize)]
struct Feature<'a> {
    id: &'a str,
    observed: &'static str,
    label: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct FeatureList<'a> {
    features: Vec<Feature<'a>>,
}

/// Render one extraction result. `include_unsafe` appends the unsafe table
/// to TSV output; the other formats ignore it.
pub fn render(result: &ExtractionResult, format: OutputFormat, include_unsafe: bool) -> anyhow::Result<String> {
    let out = match format {
        OutputFormat::Tsv => {
            let mut out = render_tsv(&result.safe_table);
            if include_unsafe {
                out.push('\n');
                out.push_str(&render_tsv(&result.unsafe_table));
            }
            out
        }
        OutputFormat::Json => render_json(&result.safe_table)?,
        OutputFormat::Ids => render_ids(&result.safe_table),
        OutputFormat::Combined => render_combined(result),
    };
    Ok(out)
}

fn cell(text: &str) -> String {
    text.replace(&['\t', '\n', '\r'][..], " ")
}

pub fn render_tsv(rows: &[ExtractionRow]) -> String {
    let mut out = String::from(TSV_HEADER);
    out.push('\n');
    for row in rows {
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\n",
            row.term_id,
            cell(&row.name),
            row.occurrence_count,
            row.earliest_position,
            cell(&row.example_sentence)
        ));
    }
    out
}

pub fn render_json(rows: &[ExtractionRow]) -> anyhow::Result<String> {
    let list = FeatureList {
        features: rows
            .iter()
            .map(|row| Feature {
                id: &row.term_id,
                observed: "yes",
                label: &row.name,
                kind: "phenotype",
            })
            .collect(),
    };
    Ok(serde_json::to_string(&list)?)
}

pub fn render_ids(rows: &[ExtractionRow]) -> String {
    if rows.is_empty() {
        return NO_TERMS.to_string();
    }
    rows.iter().map(|r| r.term_id.as_str()).collect::<Vec<_>>().join(",")
}

/// Safe rows marked high confidence and kept, then unsafe rows marked low
/// confidence and dropped.
pub fn render_combined(result: &ExtractionResult) -> String {
    let mut out = String::from(COMBINED_HEADER);
    out.push('\n');
    let tagged = result
        .safe_table
        .iter()
        .map(|row| (row, true, "high"))
        .chain(result.unsafe_table.iter().map(|row| (row, false, "low")));
    for (row, keep, confidence) in tagged {
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
            row.term_id,
            cell(&row.name),
            keep,
            row.occurrence_count,
            row.earliest_position,
            confidence,
            cell(&row.example_sentence)
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, name: &str, count: usize) -> ExtractionRow {
        ExtractionRow {
            term_id: id.to_string(),
            name: name.to_string(),
            occurrence_count: count,
            earliest_position: 3,
            example_sentence: "seizures since\tbirth.".to_string(),
        }
    }

    fn result() -> ExtractionResult {
        ExtractionResult {
            safe_table: vec![row("HP:0001250", "Seizure", 2), row("HP:0001251", "Ataxia", 1)],
            unsafe_table: vec![row("HP:0002315", "Headache", 1)],
            derived_terms: vec![],
        }
    }

    #[test]
    fn test_tsv() {
        let out = render_tsv(&result().safe_table);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], TSV_HEADER);
        assert_eq!(lines[1], "HP:0001250\tSeizure\t2\t3\tseizures since birth.");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_empty_tsv_is_header_only() {
        assert_eq!(render_tsv(&[]), format!("{TSV_HEADER}\n"));
    }

    #[test]
    fn test_tsv_with_unsafe() {
        let out = render(&result(), OutputFormat::Tsv, true).unwrap();
        assert_eq!(out.matches(TSV_HEADER).count(), 2);
        assert!(out.contains("HP:0002315"));
        let safe_only = render(&result(), OutputFormat::Tsv, false).unwrap();
        assert!(!safe_only.contains("HP:0002315"));
    }

    #[test]
    fn test_json_features() {
        let out = render_json(&result().safe_table).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        let features = value["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0]["id"], "HP:0001250");
        assert_eq!(features[0]["observed"], "yes");
        assert_eq!(features[0]["label"], "Seizure");
        assert_eq!(features[0]["type"], "phenotype");
        assert_eq!(render_json(&[]).unwrap(), r#"{"features":[]}"#);
    }

    #[test]
    fn test_ids() {
        assert_eq!(render_ids(&result().safe_table), "HP:0001250,HP:0001251");
        assert_eq!(render_ids(&[]), "No HPO in letters.");
    }

    #[test]
    fn test_combined_marks_confidence() {
        let out = render_combined(&result());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], COMBINED_HEADER);
        assert!(lines[1].starts_with("HP:0001250\tSeizure\ttrue\t2\t3\thigh\t"));
        assert!(lines[3].starts_with("HP:0002315\tHeadache\tfalse\t1\t3\tlow\t"));
    }
}
