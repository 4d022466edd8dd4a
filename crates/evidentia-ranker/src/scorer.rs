//! Per-paper quality score.
//!
//! Q(r) = min(1, w_design(r) × 0.4 + B_sample + B_journal + B_recency + B_disclosure)
//!
//! Every term that cannot be computed (missing sample size, unparsable
//! date) contributes zero; scoring never fails.

use chrono::Datelike;
use evidentia_common::{BibliographicRecord, RecordSource};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::weights::ScoringWeights;

/// How records from the preprint source are scored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "score")]
pub enum ScoringPolicy {
    /// Preprints bypass the scorer and receive this fixed score.
    PreprintFixed(f64),
    /// Every record runs through the full scorer.
    Uniform,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        ScoringPolicy::PreprintFixed(0.3)
    }
}

/// Individual contributions, useful for explaining a score.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub design: f64,
    pub sample_size: f64,
    pub journal: f64,
    pub recency: f64,
    pub disclosure: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        let sum = self.design + self.sample_size + self.journal + self.recency + self.disclosure;
        sum.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone)]
pub struct QualityScorer {
    weights: ScoringWeights,
    current_year: i32,
}

impl Default for QualityScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl QualityScorer {
    /// Scorer using the default weights and today's year for recency.
    pub fn new() -> Self {
        Self::with_current_year(chrono::Utc::now().year())
    }

    /// Scorer with a pinned reference year.
    pub fn with_current_year(current_year: i32) -> Self {
        Self {
            weights: ScoringWeights::default(),
            current_year,
        }
    }

    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn breakdown(&self, record: &BibliographicRecord) -> ScoreBreakdown {
        let w = &self.weights;

        let recent = publication_year(&record.publication_date)
            .map(|year| self.current_year - year <= w.recency_window_years)
            .unwrap_or(false);

        ScoreBreakdown {
            design:      w.design_weight(record.study_type) * w.design_share,
            sample_size: w.sample_size_bonus(record.sample_size),
            journal:     if w.is_high_impact(&record.journal) { w.journal_bonus } else { 0.0 },
            recency:     if recent { w.recency_bonus } else { 0.0 },
            disclosure:  if record.conflicts_disclosed { w.disclosure_bonus } else { 0.0 },
        }
    }

    /// Quality score in [0, 1].
    pub fn score(&self, record: &BibliographicRecord) -> f64 {
        self.breakdown(record).total()
    }

    /// Returns the record carrying the score the policy assigns to it.
    pub fn assess(&self, record: BibliographicRecord, policy: ScoringPolicy) -> BibliographicRecord {
        let score = match (policy, record.source) {
            (ScoringPolicy::PreprintFixed(fixed), RecordSource::Arxiv) => fixed.clamp(0.0, 1.0),
            _ => self.score(&record),
        };
        trace!(title = %record.title, source = record.source.as_str(), score, "Record assessed");
        record.with_quality_score(score)
    }
}

/// Year taken from the last four characters of a free-form date.
pub fn publication_year(date: &str) -> Option<i32> {
    let date = date.trim();
    let tail = date.get(date.len().checked_sub(4)?..)?;
    if !tail.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    tail.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use evidentia_common::StudyType;

    const YEAR: i32 = 2025;

    fn base() -> BibliographicRecord {
        BibliographicRecord::new(RecordSource::PubMed)
    }

    fn scorer() -> QualityScorer {
        QualityScorer::with_current_year(YEAR)
    }

    #[test]
    fn test_defaults_score_design_weight_only() {
        // title "No title", empty abstract, "Unknown Journal", study type unknown
        let s = scorer().score(&base());
        assert!((s - 0.12).abs() < 1e-9, "got {s}");
    }

    #[test]
    fn test_full_house_meta_analysis_capped() {
        let r = BibliographicRecord {
            study_type: StudyType::MetaAnalysis,
            sample_size: Some(1200),
            journal: "The Lancet".to_string(),
            publication_date: "2023".to_string(),
            conflicts_disclosed: true,
            ..base()
        };
        let b = scorer().breakdown(&r);
        assert!((b.design - 0.4).abs() < 1e-9);
        assert_eq!(b.sample_size, 0.3);
        assert_eq!(b.journal, 0.2);
        assert_eq!(b.recency, 0.1);
        assert_eq!(b.disclosure, 0.05);
        assert_eq!(b.total(), 1.0);
    }

    #[test]
    fn test_sample_threshold_crossing_adds_point_one() {
        let below = BibliographicRecord { study_type: StudyType::Cohort, sample_size: Some(999), ..base() };
        let at = BibliographicRecord { sample_size: Some(1000), ..below.clone() };
        let s = scorer();
        let diff = s.score(&at) - s.score(&below);
        assert!((diff - 0.1).abs() < 1e-9, "diff {diff}");
    }

    #[test]
    fn test_monotonic_in_sample_size() {
        let s = scorer();
        let mut last = 0.0;
        for n in [0u64, 10, 49, 50, 51, 99, 100, 500, 999, 1000, 10_000] {
            let r = BibliographicRecord { study_type: StudyType::Rct, sample_size: Some(n), ..base() };
            let score = s.score(&r);
            assert!(score >= last, "score dropped at n={n}");
            last = score;
        }
    }

    #[test]
    fn test_score_always_in_unit_interval() {
        let s = scorer();
        let types = [
            StudyType::MetaAnalysis, StudyType::Rct, StudyType::Cohort, StudyType::CaseControl,
            StudyType::CrossSectional, StudyType::Review, StudyType::Observational,
            StudyType::Preprint, StudyType::Unknown,
        ];
        for t in types {
            for n in [None, Some(0), Some(75), Some(500), Some(5000)] {
                for journal in ["BMJ Open", "Unknown Journal"] {
                    for date in ["", "Jan 2024", "1990", "garbage"] {
                        for disclosed in [true, false] {
                            let r = BibliographicRecord {
                                study_type: t,
                                sample_size: n,
                                journal: journal.to_string(),
                                publication_date: date.to_string(),
                                conflicts_disclosed: disclosed,
                                ..base()
                            };
                            let q = s.score(&r);
                            assert!((0.0..=1.0).contains(&q), "{q} out of range for {r:?}");
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_recency_window() {
        let s = scorer();
        let recent = BibliographicRecord { publication_date: "Mar 2020".to_string(), ..base() };
        let old = BibliographicRecord { publication_date: "Mar 2019".to_string(), ..base() };
        assert_eq!(s.breakdown(&recent).recency, 0.1);
        assert_eq!(s.breakdown(&old).recency, 0.0);
    }

    #[test]
    fn test_unparsable_date_skipped() {
        let s = scorer();
        for date in ["", "199", "2023-05-01", "Spring", "Jan ２０２４"] {
            let r = BibliographicRecord { publication_date: date.to_string(), ..base() };
            assert_eq!(s.breakdown(&r).recency, 0.0, "date {date:?}");
        }
    }

    #[test]
    fn test_publication_year_tail() {
        assert_eq!(publication_year("Dec 2022"), Some(2022));
        assert_eq!(publication_year("2022"), Some(2022));
        assert_eq!(publication_year("2022 "), Some(2022));
        assert_eq!(publication_year("22"), None);
        assert_eq!(publication_year("2022-01-01"), None);
    }

    #[test]
    fn test_preprint_fixed_policy_bypasses_scorer() {
        let preprint = BibliographicRecord {
            study_type: StudyType::Preprint,
            sample_size: Some(5000),
            ..BibliographicRecord::new(RecordSource::Arxiv)
        };
        let s = scorer();
        let fixed = s.assess(preprint.clone(), ScoringPolicy::default());
        assert_eq!(fixed.quality_score, 0.3);

        let uniform = s.assess(preprint, ScoringPolicy::Uniform);
        // 0.3 × 0.4 + 0.3 sample bonus
        assert!((uniform.quality_score - 0.42).abs() < 1e-9);
    }

    #[test]
    fn test_fixed_policy_does_not_touch_pubmed_records() {
        let r = BibliographicRecord { study_type: StudyType::Rct, ..base() };
        let assessed = scorer().assess(r, ScoringPolicy::PreprintFixed(0.3));
        assert!((assessed.quality_score - 0.36).abs() < 1e-9);
    }
}
