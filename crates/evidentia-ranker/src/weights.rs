//! Weight table for per-paper quality scoring.
//!
//! These are fixed heuristics, not calibrated against impact factors.

use evidentia_common::StudyType;
use serde::{Deserialize, Serialize};

/// Journals that earn the prestige bonus when their name appears
/// (case-insensitively) inside a record's journal field.
pub const HIGH_IMPACT_JOURNALS: &[&str] = &[
    "new england journal of medicine",
    "lancet",
    "jama",
    "bmj",
    "nature",
    "science",
    "cochrane",
];

/// Sample-size bands, highest first. Only the first band reached applies.
pub const SAMPLE_SIZE_BANDS: &[(u64, f64)] = &[
    (1000, 0.3),
    (100,  0.2),
    (50,   0.1),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Multiplier applied to the study-design base weight.
    pub design_share: f64,
    pub journal_bonus: f64,
    pub recency_bonus: f64,
    /// Maximum age in years that still earns the recency bonus.
    pub recency_window_years: i32,
    pub disclosure_bonus: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            design_share:         0.4,
            journal_bonus:        0.2,
            recency_bonus:        0.1,
            recency_window_years: 5,
            disclosure_bonus:     0.05,
        }
    }
}

impl ScoringWeights {
    /// Base weight of a study design before `design_share` is applied.
    pub fn design_weight(&self, study_type: StudyType) -> f64 {
        match study_type {
            StudyType::MetaAnalysis   => 1.0,
            StudyType::Rct            => 0.9,
            StudyType::Cohort         => 0.7,
            StudyType::CaseControl    => 0.6,
            StudyType::Observational  => 0.5,
            StudyType::CrossSectional => 0.4,
            StudyType::Review         => 0.3,
            StudyType::Preprint
            | StudyType::Unknown      => 0.3,
        }
    }

    /// Bonus for the highest band the sample size reaches; 0 when absent.
    pub fn sample_size_bonus(&self, sample_size: Option<u64>) -> f64 {
        let Some(n) = sample_size else { return 0.0 };
        SAMPLE_SIZE_BANDS
            .iter()
            .find(|(floor, _)| n >= *floor)
            .map(|(_, bonus)| *bonus)
            .unwrap_or(0.0)
    }

    pub fn is_high_impact(&self, journal: &str) -> bool {
        let journal = journal.to_lowercase();
        HIGH_IMPACT_JOURNALS.iter().any(|j| journal.contains(j))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_design_weights_ordered_by_rigour() {
        let w = ScoringWeights::default();
        assert!(w.design_weight(StudyType::MetaAnalysis) > w.design_weight(StudyType::Rct));
        assert!(w.design_weight(StudyType::Rct) > w.design_weight(StudyType::Cohort));
        assert!(w.design_weight(StudyType::Cohort) > w.design_weight(StudyType::CaseControl));
        assert!(w.design_weight(StudyType::Observational) > w.design_weight(StudyType::CrossSectional));
        assert_eq!(w.design_weight(StudyType::Unknown), 0.3);
    }

    #[test]
    fn test_sample_size_bands_exclusive() {
        let w = ScoringWeights::default();
        assert_eq!(w.sample_size_bonus(None), 0.0);
        assert_eq!(w.sample_size_bonus(Some(49)), 0.0);
        assert_eq!(w.sample_size_bonus(Some(50)), 0.1);
        assert_eq!(w.sample_size_bonus(Some(99)), 0.1);
        assert_eq!(w.sample_size_bonus(Some(100)), 0.2);
        assert_eq!(w.sample_size_bonus(Some(999)), 0.2);
        assert_eq!(w.sample_size_bonus(Some(1000)), 0.3);
        assert_eq!(w.sample_size_bonus(Some(250_000)), 0.3);
    }

    #[test]
    fn test_high_impact_case_insensitive() {
        let w = ScoringWeights::default();
        assert!(w.is_high_impact("The Lancet"));
        assert!(w.is_high_impact("JAMA internal medicine"));
        assert!(w.is_high_impact("Cochrane Database Syst Rev"));
        assert!(!w.is_high_impact("Unknown Journal"));
        assert!(!w.is_high_impact("arXiv preprint"));
    }
}
