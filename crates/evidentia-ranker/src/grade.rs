//! Corpus-level evidence grade (Very Low / Low / Moderate / High).
//!
//! Rules are evaluated top to bottom and the first match wins. Each
//! predicate also excludes the cases claimed by the rules above it, so
//! for any corpus exactly one predicate holds.

use std::fmt;

use evidentia_common::{BibliographicRecord, StudyType};
use serde::{Serialize, Serializer};

/// Records scoring above this count as high quality.
pub const HIGH_QUALITY_THRESHOLD: f64 = 0.8;
/// High-quality records needed alongside a meta-analysis for a High grade.
pub const MIN_HIGH_QUALITY_RECORDS: usize = 2;
/// RCTs needed for a Moderate grade without a meta-analysis.
pub const MIN_RCTS_FOR_MODERATE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GradeLevel {
    VeryLow,
    Low,
    Moderate,
    High,
}

impl GradeLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            GradeLevel::VeryLow  => "Very Low",
            GradeLevel::Low      => "Low",
            GradeLevel::Moderate => "Moderate",
            GradeLevel::High     => "High",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvidenceGrade {
    NoStudies,
    HighQualityMetaAnalyses,
    LimitedQualityMetaAnalysis,
    MultipleRcts,
    LimitedRcts,
    ObservationalOnly,
    LimitedStudyEvidence,
}

impl EvidenceGrade {
    pub fn level(&self) -> GradeLevel {
        match self {
            EvidenceGrade::NoStudies                  => GradeLevel::VeryLow,
            EvidenceGrade::HighQualityMetaAnalyses    => GradeLevel::High,
            EvidenceGrade::LimitedQualityMetaAnalysis => GradeLevel::Moderate,
            EvidenceGrade::MultipleRcts               => GradeLevel::Moderate,
            EvidenceGrade::LimitedRcts                => GradeLevel::Low,
            EvidenceGrade::ObservationalOnly          => GradeLevel::Low,
            EvidenceGrade::LimitedStudyEvidence       => GradeLevel::VeryLow,
        }
    }

    pub fn qualifier(&self) -> &'static str {
        match self {
            EvidenceGrade::NoStudies                  => "no academic studies found",
            EvidenceGrade::HighQualityMetaAnalyses    => "multiple high-quality meta-analyses",
            EvidenceGrade::LimitedQualityMetaAnalysis => "meta-analysis available but limited quality",
            EvidenceGrade::MultipleRcts               => "multiple randomized controlled trials",
            EvidenceGrade::LimitedRcts                => "limited randomized controlled trials",
            EvidenceGrade::ObservationalOnly          => "observational studies only",
            EvidenceGrade::LimitedStudyEvidence       => "limited study evidence",
        }
    }

    /// Display label, e.g. "Moderate — multiple randomized controlled trials".
    pub fn label(&self) -> String {
        format!("{} — {}", self.level().as_str(), self.qualifier())
    }
}

impl fmt::Display for EvidenceGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl Serialize for EvidenceGrade {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

/// The facts about a corpus the grading rules look at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorpusProfile {
    pub total: usize,
    pub meta_analyses: usize,
    pub rcts: usize,
    pub cohort_or_case_control: usize,
    pub high_quality: usize,
}

impl CorpusProfile {
    pub fn from_records(records: &[BibliographicRecord]) -> Self {
        let count = |t: StudyType| records.iter().filter(|r| r.study_type == t).count();
        Self {
            total: records.len(),
            meta_analyses: count(StudyType::MetaAnalysis),
            rcts: count(StudyType::Rct),
            cohort_or_case_control: count(StudyType::Cohort) + count(StudyType::CaseControl),
            high_quality: records
                .iter()
                .filter(|r| r.quality_score > HIGH_QUALITY_THRESHOLD)
                .count(),
        }
    }

    fn has_meta_analysis(&self) -> bool {
        self.meta_analyses > 0
    }

    fn strong_quality(&self) -> bool {
        self.high_quality >= MIN_HIGH_QUALITY_RECORDS
    }
}

type GradeRule = (fn(&CorpusProfile) -> bool, EvidenceGrade);

fn no_records(p: &CorpusProfile) -> bool {
    p.total == 0
}

fn strong_meta_analyses(p: &CorpusProfile) -> bool {
    p.has_meta_analysis() && p.strong_quality()
}

fn weak_meta_analysis(p: &CorpusProfile) -> bool {
    p.has_meta_analysis() && !p.strong_quality()
}

fn many_rcts(p: &CorpusProfile) -> bool {
    !p.has_meta_analysis() && p.rcts >= MIN_RCTS_FOR_MODERATE
}

fn few_rcts(p: &CorpusProfile) -> bool {
    !p.has_meta_analysis() && p.rcts > 0 && p.rcts < MIN_RCTS_FOR_MODERATE
}

fn observational_only(p: &CorpusProfile) -> bool {
    !p.has_meta_analysis() && p.rcts == 0 && p.cohort_or_case_control > 0
}

fn anything_else(p: &CorpusProfile) -> bool {
    p.total > 0 && !p.has_meta_analysis() && p.rcts == 0 && p.cohort_or_case_control == 0
}

/// Ordered rule cascade; order encodes precedence.
pub const GRADE_RULES: &[GradeRule] = &[
    (no_records,           EvidenceGrade::NoStudies),
    (strong_meta_analyses, EvidenceGrade::HighQualityMetaAnalyses),
    (weak_meta_analysis,   EvidenceGrade::LimitedQualityMetaAnalysis),
    (many_rcts,            EvidenceGrade::MultipleRcts),
    (few_rcts,             EvidenceGrade::LimitedRcts),
    (observational_only,   EvidenceGrade::ObservationalOnly),
    (anything_else,        EvidenceGrade::LimitedStudyEvidence),
];

pub fn grade_profile(profile: &CorpusProfile) -> EvidenceGrade {
    GRADE_RULES
        .iter()
        .find(|(applies, _)| applies(profile))
        .map(|(_, grade)| *grade)
        // Unreachable for consistent profiles; see test_rules_total_and_exclusive
        .unwrap_or(EvidenceGrade::LimitedStudyEvidence)
}

/// Grade a scored corpus.
pub fn grade_evidence(records: &[BibliographicRecord]) -> EvidenceGrade {
    grade_profile(&CorpusProfile::from_records(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use evidentia_common::RecordSource;

    fn rec(study_type: StudyType, quality: f64) -> BibliographicRecord {
        BibliographicRecord { study_type, ..BibliographicRecord::new(RecordSource::PubMed) }
            .with_quality_score(quality)
    }

    #[test]
    fn test_rules_total_and_exclusive() {
        // Every consistent profile matches exactly one rule.
        for total in 0..=6usize {
            for meta in 0..=total {
                for rcts in 0..=(total - meta) {
                    for obs in 0..=(total - meta - rcts) {
                        for high in 0..=total {
                            let p = CorpusProfile {
                                total,
                                meta_analyses: meta,
                                rcts,
                                cohort_or_case_control: obs,
                                high_quality: high,
                            };
                            let hits = GRADE_RULES.iter().filter(|(f, _)| f(&p)).count();
                            assert_eq!(hits, 1, "profile {p:?} matched {hits} rules");
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_empty_corpus() {
        let g = grade_evidence(&[]);
        assert_eq!(g, EvidenceGrade::NoStudies);
        assert_eq!(g.label(), "Very Low — no academic studies found");
    }

    #[test]
    fn test_three_rcts_moderate() {
        let records = vec![rec(StudyType::Rct, 0.5); 3];
        let g = grade_evidence(&records);
        assert_eq!(g.label(), "Moderate — multiple randomized controlled trials");
    }

    #[test]
    fn test_two_rcts_low() {
        let records = vec![rec(StudyType::Rct, 0.9), rec(StudyType::Rct, 0.9)];
        assert_eq!(grade_evidence(&records), EvidenceGrade::LimitedRcts);
    }

    #[test]
    fn test_meta_analysis_with_two_high_quality_records() {
        let records = [rec(StudyType::MetaAnalysis, 0.95), rec(StudyType::Rct, 0.85)];
        let g = grade_evidence(&records);
        assert_eq!(g.level(), GradeLevel::High);
        assert_eq!(g.label(), "High — multiple high-quality meta-analyses");
    }

    #[test]
    fn test_meta_analysis_threshold_is_strict() {
        // exactly 0.8 is not "above 0.8"
        let records = [rec(StudyType::MetaAnalysis, 0.8), rec(StudyType::MetaAnalysis, 0.8)];
        assert_eq!(grade_evidence(&records), EvidenceGrade::LimitedQualityMetaAnalysis);
    }

    #[test]
    fn test_meta_analysis_outranks_many_rcts() {
        let mut records = vec![rec(StudyType::Rct, 0.5); 4];
        records.push(rec(StudyType::MetaAnalysis, 0.5));
        assert_eq!(grade_evidence(&records), EvidenceGrade::LimitedQualityMetaAnalysis);
    }

    #[test]
    fn test_observational_only() {
        let records = [rec(StudyType::CaseControl, 0.4), rec(StudyType::CrossSectional, 0.3)];
        assert_eq!(grade_evidence(&records).label(), "Low — observational studies only");
    }

    #[test]
    fn test_reviews_and_preprints_only() {
        let records = [rec(StudyType::Review, 0.2), rec(StudyType::Preprint, 0.3)];
        let g = grade_evidence(&records);
        assert_eq!(g, EvidenceGrade::LimitedStudyEvidence);
        assert_eq!(g.level(), GradeLevel::VeryLow);
    }

    #[test]
    fn test_grade_serialises_as_label() {
        let json = serde_json::to_string(&EvidenceGrade::LimitedRcts).unwrap();
        assert_eq!(json, "\"Low — limited randomized controlled trials\"");
    }

    #[test]
    fn test_levels_ordered() {
        assert!(GradeLevel::High > GradeLevel::Moderate);
        assert!(GradeLevel::Low > GradeLevel::VeryLow);
    }
}
