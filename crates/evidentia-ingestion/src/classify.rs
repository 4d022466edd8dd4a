//! Free-text heuristics over titles and abstracts.
//!
//! Study design is inferred from keyword rules and sample size from regex
//! patterns. Both are ordered lists evaluated top to bottom, first match wins.

use std::sync::OnceLock;

use evidentia_common::StudyType;
use regex::Regex;

/// Ordered design rules. Earlier rules take precedence, so a systematic
/// review of RCTs is a meta-analysis, not an RCT.
pub const STUDY_TYPE_RULES: &[(&[&str], StudyType)] = &[
    (&["meta-analysis", "meta analysis", "systematic review"], StudyType::MetaAnalysis),
    (&["randomized controlled trial", "rct", "randomized"],    StudyType::Rct),
    (&["cohort study", "longitudinal", "prospective"],         StudyType::Cohort),
    (&["case-control", "case control"],                        StudyType::CaseControl),
    (&["cross-sectional", "survey"],                           StudyType::CrossSectional),
    (&["review", "narrative review"],                          StudyType::Review),
];

/// Classify a paper's design from its title and abstract.
/// Falls back to `Observational` when no rule matches.
pub fn classify_study_type(title: &str, abstract_text: &str) -> StudyType {
    let text = format!("{} {}", title, abstract_text).to_lowercase();
    STUDY_TYPE_RULES
        .iter()
        .find(|(terms, _)| terms.iter().any(|t| text.contains(t)))
        .map(|(_, study_type)| *study_type)
        .unwrap_or(StudyType::Observational)
}

/// Sample-size patterns, in priority order. Group 1 holds the number.
pub const SAMPLE_SIZE_PATTERNS: &[&str] = &[
    r"(?i)n\s*=\s*(\d+)",
    r"(\d+)\s+(?:patients|subjects|participants|individuals|people)",
    r"total\s+of\s+(\d+)",
    r"sample\s+size\s+of\s+(\d+)",
];

fn sample_size_regexes() -> &'static [Regex] {
    static REGEXES: OnceLock<Vec<Regex>> = OnceLock::new();
    REGEXES.get_or_init(|| {
        SAMPLE_SIZE_PATTERNS
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect()
    })
}

/// Extract a sample size from abstract text.
///
/// A pattern whose captured number does not fit an integer is skipped
/// and the next pattern is tried.
pub fn extract_sample_size(text: &str) -> Option<u64> {
    if text.is_empty() {
        return None;
    }
    sample_size_regexes().iter().find_map(|re| {
        re.captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_patterns_compile() {
        assert_eq!(sample_size_regexes().len(), SAMPLE_SIZE_PATTERNS.len());
    }

    #[test]
    fn test_meta_analysis_precedes_rct() {
        let t = classify_study_type(
            "A meta-analysis of aspartame",
            "We pooled every randomized controlled trial published since 1980.",
        );
        assert_eq!(t, StudyType::MetaAnalysis);
    }

    #[test]
    fn test_systematic_review_is_meta_analysis() {
        assert_eq!(classify_study_type("Systematic Review of sweeteners", ""), StudyType::MetaAnalysis);
    }

    #[test]
    fn test_each_rule() {
        assert_eq!(classify_study_type("A Randomized trial", ""), StudyType::Rct);
        assert_eq!(classify_study_type("", "a prospective study of nurses"), StudyType::Cohort);
        assert_eq!(classify_study_type("", "a case-control analysis"), StudyType::CaseControl);
        assert_eq!(classify_study_type("National survey of intake", ""), StudyType::CrossSectional);
        assert_eq!(classify_study_type("A narrative review", ""), StudyType::Review);
    }

    #[test]
    fn test_cohort_precedes_review() {
        assert_eq!(
            classify_study_type("Longitudinal data", "We review outcomes."),
            StudyType::Cohort
        );
    }

    #[test]
    fn test_no_match_is_observational() {
        assert_eq!(classify_study_type("Sweetener intake in mice", "Mice were fed."), StudyType::Observational);
        assert_eq!(classify_study_type("", ""), StudyType::Observational);
    }

    #[test]
    fn test_sample_size_n_equals() {
        assert_eq!(extract_sample_size("n=245 patients enrolled"), Some(245));
        assert_eq!(extract_sample_size("We enrolled adults (N = 1200)."), Some(1200));
    }

    #[test]
    fn test_sample_size_none() {
        assert_eq!(extract_sample_size("no size mentioned"), None);
        assert_eq!(extract_sample_size(""), None);
    }

    #[test]
    fn test_sample_size_pattern_order() {
        assert_eq!(extract_sample_size("180 participants completed"), Some(180));
        assert_eq!(extract_sample_size("a total of 3021 adults"), Some(3021));
        assert_eq!(extract_sample_size("with a sample size of 64 mice"), Some(64));
        // n= beats "<k> patients" even when it appears later
        assert_eq!(extract_sample_size("40 patients in arm A, overall n=80"), Some(80));
    }

    #[test]
    fn test_sample_size_overflow_falls_through() {
        let text = "n=99999999999999999999999 (typo); 120 subjects analysed";
        assert_eq!(extract_sample_size(text), Some(120));
    }

    #[test]
    fn test_later_patterns_case_sensitive() {
        assert_eq!(extract_sample_size("A Total Of 12 adults"), None);
    }
}
