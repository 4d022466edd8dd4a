//! evidentia-ranker — Per-paper quality scoring and corpus-level evidence grading.

pub mod weights;
pub mod scorer;
pub mod grade;
pub mod credibility;

pub use grade::{grade_evidence, EvidenceGrade, GradeLevel};
pub use scorer::{QualityScorer, ScoringPolicy};
