//! Core entity types shared by retrieval, scoring and aggregation.
//! Every value here lives for a single query; nothing is persisted.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Title used when an article carries no locatable title.
pub const DEFAULT_TITLE: &str = "No title";
/// Journal used when an article carries no locatable journal name.
pub const DEFAULT_JOURNAL: &str = "Unknown Journal";

// ---------------------------------------------------------------------------
// Study design
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum StudyType {
    MetaAnalysis,
    Rct,
    Cohort,
    CaseControl,
    CrossSectional,
    Review,
    Observational,
    Preprint,
    #[default]
    Unknown,
}

impl StudyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StudyType::MetaAnalysis   => "meta-analysis",
            StudyType::Rct            => "rct",
            StudyType::Cohort         => "cohort",
            StudyType::CaseControl    => "case-control",
            StudyType::CrossSectional => "cross-sectional",
            StudyType::Review         => "review",
            StudyType::Observational  => "observational",
            StudyType::Preprint       => "preprint",
            StudyType::Unknown        => "unknown",
        }
    }
}

impl fmt::Display for StudyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Bibliographic record
// ---------------------------------------------------------------------------

/// Which upstream source produced a record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource {
    PubMed,
    Arxiv,
}

impl RecordSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordSource::PubMed => "pubmed",
            RecordSource::Arxiv  => "arxiv",
        }
    }
}

/// One retrieved publication, normalised across sources.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BibliographicRecord {
    pub title: String,
    pub authors: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Free-form, e.g. "Mar 2021", "2021" or "2021-03-04".
    pub publication_date: String,
    pub journal: String,
    /// Source-specific identifier (PMID, arXiv id).
    pub external_id: Option<String>,
    pub doi: Option<String>,
    pub url: String,
    pub study_type: StudyType,
    pub sample_size: Option<u64>,
    pub peer_reviewed: bool,
    pub funding_source: String,
    pub conflicts_disclosed: bool,
    /// 0.0 until the scoring stage runs.
    pub quality_score: f64,
    pub source: RecordSource,
}

impl BibliographicRecord {
    /// An empty record with every field at its documented default.
    pub fn new(source: RecordSource) -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            authors: Vec::new(),
            abstract_text: String::new(),
            publication_date: String::new(),
            journal: DEFAULT_JOURNAL.to_string(),
            external_id: None,
            doi: None,
            url: String::new(),
            study_type: StudyType::Unknown,
            sample_size: None,
            peer_reviewed: source == RecordSource::PubMed,
            funding_source: String::new(),
            conflicts_disclosed: false,
            quality_score: 0.0,
            source,
        }
    }

    /// Returns a copy carrying the given score.
    pub fn with_quality_score(self, quality_score: f64) -> Self {
        Self { quality_score, ..self }
    }
}

// ---------------------------------------------------------------------------
// Web result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WebSourceType {
    Academic,
    MedicalAuthority,
    MedicalSite,
    News,
}

impl WebSourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebSourceType::Academic         => "academic",
            WebSourceType::MedicalAuthority => "medical_authority",
            WebSourceType::MedicalSite      => "medical_site",
            WebSourceType::News             => "news",
        }
    }
}

/// One general web page, classified by its URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebResult {
    pub title: String,
    pub url: String,
    pub content: String,
    pub source_type: WebSourceType,
    pub credibility_score: f64,
}
