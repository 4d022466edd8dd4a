//! arXiv Atom API client and feed parser.
//!
//! Endpoint: http://export.arxiv.org/api/query
//! Preprints are never peer reviewed; their score is decided by the
//! scoring stage's preprint policy, not here.

use async_trait::async_trait;
use evidentia_common::entities::DEFAULT_TITLE;
use evidentia_common::sandbox::SandboxClient;
use evidentia_common::{BibliographicRecord, EvidentiaError, RecordSource, Result, StudyType};
use tracing::{debug, instrument, warn};

use super::{read_body, ParsedBatch, PreprintSource};
use crate::classify::extract_sample_size;
use crate::xml::{parse_document, XmlElement};

const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";

/// Journal label carried by every arXiv record.
pub const ARXIV_JOURNAL: &str = "arXiv preprint";

pub struct ArxivClient {
    client: SandboxClient,
}

impl ArxivClient {
    pub fn new(client: SandboxClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PreprintSource for ArxivClient {
    fn name(&self) -> &'static str {
        "arxiv"
    }

    #[instrument(skip(self))]
    async fn search(&self, query: &str, max_results: usize) -> Result<String> {
        let params = [
            ("search_query", format!("all:{}", query)),
            ("start", "0".to_string()),
            ("max_results", max_results.to_string()),
            ("sortBy", "relevance".to_string()),
            ("sortOrder", "descending".to_string()),
        ];

        let resp = self.client.get(ARXIV_API_URL)?.query(&params).send().await?;
        let body = read_body(resp, "arxiv").await?;
        debug!(bytes = body.len(), "arXiv feed received");
        Ok(body)
    }
}

/// Parse an Atom feed into preprint records, skipping malformed entries.
pub fn parse_arxiv_feed(xml: &str) -> Result<ParsedBatch> {
    let root = parse_document(xml)?;
    if root.name != "feed" {
        return Err(EvidentiaError::Xml(format!("expected <feed>, found <{}>", root.name)));
    }

    let mut batch = ParsedBatch::default();
    for (i, entry) in root.children_named("entry").enumerate() {
        match parse_arxiv_entry(entry) {
            Ok(record) => batch.records.push(record),
            Err(e) => {
                warn!(index = i, error = %e, "Skipping malformed arXiv entry");
                batch.skipped += 1;
            }
        }
    }
    Ok(batch)
}

pub fn parse_arxiv_entry(entry: &XmlElement) -> Result<BibliographicRecord> {
    let id_url = entry.child_text("id").unwrap_or_default();
    // The API reports query errors as a single entry pointing at its error docs
    if id_url.contains("/api/errors") {
        let detail = entry.child_text("summary").unwrap_or_else(|| id_url.clone());
        return Err(EvidentiaError::MalformedItem(format!("arXiv error entry: {}", detail)));
    }

    let title = entry.child_text("title").unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let abstract_text = entry.child_text("summary").unwrap_or_default();

    let authors = entry
        .children_named("author")
        .filter_map(|a| a.child_text("name"))
        .collect();

    let publication_date = entry
        .child_text("published")
        .map(|p| p.chars().take(10).collect())
        .unwrap_or_default();

    let external_id = id_url
        .split_once("/abs/")
        .map(|(_, id)| id.to_string())
        .filter(|id| !id.is_empty());

    Ok(BibliographicRecord {
        sample_size: extract_sample_size(&abstract_text),
        doi: entry.child_text("doi"),
        title,
        authors,
        abstract_text,
        publication_date,
        journal: ARXIV_JOURNAL.to_string(),
        external_id,
        url: id_url,
        study_type: StudyType::Preprint,
        ..BibliographicRecord::new(RecordSource::Arxiv)
    })
}
