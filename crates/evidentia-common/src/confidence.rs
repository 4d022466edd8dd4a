//! Confidence in the final answer, combining academic and web evidence.
//!
//! academic = mean(quality) × 0.8 + (distinct study types ÷ 5) × 0.2
//! web      = mean(credibility) × 0.5
//! total    = academic × 0.7 + web × 0.3, capped at 0.95

use std::collections::HashSet;

use crate::entities::{BibliographicRecord, WebResult};

/// Returned when neither collection holds anything.
pub const NO_EVIDENCE_CONFIDENCE: f64 = 0.2;
/// Absolute certainty is never claimed.
pub const CONFIDENCE_CAP: f64 = 0.95;

const ACADEMIC_SHARE: f64 = 0.7;
const WEB_SHARE: f64 = 0.3;
const QUALITY_WEIGHT: f64 = 0.8;
const DIVERSITY_WEIGHT: f64 = 0.2;
const DIVERSITY_DIVISOR: f64 = 5.0;
const WEB_CREDIBILITY_WEIGHT: f64 = 0.5;

/// Compute the overall confidence in [0, 0.95].
pub fn compute_confidence(records: &[BibliographicRecord], web: &[WebResult]) -> f64 {
    if records.is_empty() && web.is_empty() {
        return NO_EVIDENCE_CONFIDENCE;
    }

    let total = academic_component(records) * ACADEMIC_SHARE + web_component(web) * WEB_SHARE;
    total.clamp(0.0, CONFIDENCE_CAP)
}

/// Mean quality plus a study-design diversity term; 0 when there are no records.
pub fn academic_component(records: &[BibliographicRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let mean_quality = records.iter().map(|r| r.quality_score).sum::<f64>() / records.len() as f64;
    let distinct: HashSet<_> = records.iter().map(|r| r.study_type).collect();
    let diversity = distinct.len() as f64 / DIVERSITY_DIVISOR;

    mean_quality * QUALITY_WEIGHT + diversity * DIVERSITY_WEIGHT
}

/// Half the mean credibility; 0 when there are no web results.
pub fn web_component(web: &[WebResult]) -> f64 {
    if web.is_empty() {
        return 0.0;
    }
    let mean = web.iter().map(|w| w.credibility_score).sum::<f64>() / web.len() as f64;
    mean * WEB_CREDIBILITY_WEIGHT
}
