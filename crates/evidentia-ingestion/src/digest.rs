//! Plain-text digest of an evidence bundle, handed to the narration step.
//!
//! Deterministic for a given bundle: the top three records (already sorted
//! best first), the top three web sources, then grade and confidence.

use evidentia_common::{BibliographicRecord, WebResult};

use crate::pipeline::EvidenceBundle;

/// Records and web sources included in the digest.
pub const DIGEST_TOP_N: usize = 3;
/// Abstracts and web snippets are cut to this many characters.
pub const SNIPPET_CHARS: usize = 300;

fn snippet(text: &str) -> String {
    let cut: String = text.chars().take(SNIPPET_CHARS).collect();
    format!("{}...", cut)
}

fn record_block(i: usize, r: &BibliographicRecord) -> String {
    let sample_size = r
        .sample_size
        .map(|n| n.to_string())
        .unwrap_or_else(|| "Not specified".to_string());

    format!(
        "ACADEMIC PAPER {}:\n\
         Title: {}\n\
         Journal: {} ({})\n\
         Study Type: {}\n\
         Sample Size: {}\n\
         Quality Score: {:.2}/1.0\n\
         Abstract: {}\n",
        i + 1,
        r.title,
        r.journal,
        r.publication_date,
        r.study_type,
        sample_size,
        r.quality_score,
        snippet(&r.abstract_text),
    )
}

fn web_block(i: usize, w: &WebResult) -> String {
    format!("WEB SOURCE {}: {}\n{}", i + 1, w.title, snippet(&w.content))
}

/// Render the digest text for a bundle.
pub fn render_digest(bundle: &EvidenceBundle) -> String {
    let academic: Vec<String> = bundle
        .records()
        .iter()
        .take(DIGEST_TOP_N)
        .enumerate()
        .map(|(i, r)| record_block(i, r))
        .collect();

    let web: Vec<String> = bundle
        .web_results()
        .iter()
        .take(DIGEST_TOP_N)
        .enumerate()
        .map(|(i, w)| web_block(i, w))
        .collect();

    format!(
        "ACADEMIC RESEARCH:\n{}\n\nWEB SOURCES:\n{}\n\nEVIDENCE GRADE: {}\nCONFIDENCE: {:.2}\n",
        academic.join("\n\n"),
        web.join("\n\n"),
        bundle.evidence_grade(),
        bundle.confidence(),
    )
}
