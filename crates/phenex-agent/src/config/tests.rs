#[cfg(test)]
mod tests {
    use super::super::*;
    use phenex_ner::SegmentationStrategy;
    use std::io::Write;

    #[test]
    fn test_empty_file_is_all_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.extraction, ExtractorConfig::default());
        assert_eq!(config.extraction.early_safe_positions, 4);
        assert_eq!(config.ontology.term_names, default_term_names());
        assert_eq!(config.output.format, OutputFormat::Tsv);
        assert!(!config.output.include_unsafe);
    }

    #[test]
    fn test_sections_parse() {
        let config = Config::from_toml(
            r#"
            [ontology]
            term_names = "/srv/hpo/names.tsv"

            [extraction]
            early_safe_positions = 0
            biometrics = false
            segmentation = ["linewise"]

            [output]
            format = "combined"
            include_unsafe = true
            "#,
        )
        .unwrap();
        assert_eq!(config.ontology.term_names, PathBuf::from("/srv/hpo/names.tsv"));
        assert_eq!(config.ontology.synonyms, default_synonyms());
        assert_eq!(config.extraction.early_safe_positions, 0);
        assert!(!config.extraction.biometrics);
        assert_eq!(config.extraction.segmentation, vec![SegmentationStrategy::Linewise]);
        assert_eq!(config.extraction.safe_override_words, vec!["inherited".to_string()]);
        assert_eq!(config.output.format, OutputFormat::Combined);
    }

    #[test]
    fn test_flag_overrides() {
        let config = Config::from_toml(
            r#"
            [flags]
            family = []
            uncertain = ["possible", "suspected"]
            "#,
        )
        .unwrap();
        let catalog = config.flags.catalog();
        assert_eq!(catalog.keywords(FlagCategory::Family).count(), 0);
        assert_eq!(catalog.keywords(FlagCategory::Uncertain).count(), 2);
        assert_eq!(
            catalog.keywords(FlagCategory::Negative).count(),
            FlagCategory::Negative.default_keywords().len()
        );
    }

    #[test]
    fn test_invalid_extraction_rejected() {
        let err = Config::from_toml("[extraction]\nsegmentation = []\n").unwrap_err();
        assert!(err.to_string().contains("segmentation"), "{err}");
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(Config::from_toml("[output]\nformat = \"xml\"\n").is_err());
    }

    #[test]
    fn test_load_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[output]\nformat = \"ids\"").unwrap();
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.output.format, OutputFormat::Ids);
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }
}
