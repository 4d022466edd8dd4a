//! PubMed E-utilities client and article parser.
//!
//! Endpoints used:
//!   esearch: https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi
//!   efetch:  https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi

use async_trait::async_trait;
use evidentia_common::entities::{DEFAULT_JOURNAL, DEFAULT_TITLE};
use evidentia_common::sandbox::SandboxClient;
use evidentia_common::{BibliographicRecord, EvidentiaError, RecordSource, Result};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument, warn};

use super::{read_body, ParsedBatch, PrimarySource};
use crate::classify::{classify_study_type, extract_sample_size};
use crate::xml::{parse_document, XmlElement};

const ESEARCH_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi";
const EFETCH_URL:  &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi";
const ARTICLE_URL_BASE: &str = "https://pubmed.ncbi.nlm.nih.gov";

pub struct PubMedClient {
    client: SandboxClient,
    tool: String,
    email: String,
    api_key: Option<SecretString>,
}

impl PubMedClient {
    pub fn new(client: SandboxClient) -> Self {
        Self {
            client,
            tool: "evidentia".to_string(),
            email: "research@example.com".to_string(),
            api_key: None,
        }
    }

    /// Contact address NCBI asks E-utilities callers to send.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = tool.into();
        self
    }

    /// Optional NCBI API key for higher rate limits.
    pub fn with_api_key(mut self, api_key: Option<SecretString>) -> Self {
        self.api_key = api_key;
        self
    }

    fn base_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("db", "pubmed".to_string()),
            ("retmode", "xml".to_string()),
            ("tool", self.tool.clone()),
            ("email", self.email.clone()),
        ];
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.expose_secret().to_string()));
        }
        params
    }
}

#[async_trait]
impl PrimarySource for PubMedClient {
    fn name(&self) -> &'static str {
        "pubmed"
    }

    /// Search PubMed and return a list of PMIDs.
    #[instrument(skip(self))]
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<String>> {
        let mut params = self.base_params();
        params.push(("term", query.to_string()));
        params.push(("retmax", max_results.to_string()));
        params.push(("sort", "relevance".to_string()));

        let resp = self.client.get(ESEARCH_URL)?.query(&params).send().await?;
        let xml = read_body(resp, "pubmed esearch").await?;
        let ids = parse_esearch_ids(&xml)?;

        debug!(?ids, "PubMed esearch returned PMIDs");
        Ok(ids)
    }

    /// Fetch PubMed XML for a list of PMIDs.
    #[instrument(skip(self))]
    async fn fetch(&self, ids: &[String]) -> Result<String> {
        let mut params = self.base_params();
        params.push(("id", ids.join(",")));

        let resp = self.client.get(EFETCH_URL)?.query(&params).send().await?;
        read_body(resp, "pubmed efetch").await
    }
}

/// Parse an esearch response into PMIDs.
pub fn parse_esearch_ids(xml: &str) -> Result<Vec<String>> {
    let root = parse_document(xml)?;
    if let Some(err) = root.child_text("ERROR") {
        warn!(error = %err, "PubMed esearch reported an error");
    }
    let ids = root
        .find("IdList")
        .map(|list| {
            list.children_named("Id")
                .map(XmlElement::text)
                .filter(|id| !id.is_empty())
                .collect()
        })
        .unwrap_or_default();
    Ok(ids)
}

/// Parse an efetch `<PubmedArticleSet>` into records.
///
/// A syntax error fails the whole batch. An article that cannot be turned
/// into a record is skipped and counted; its siblings are unaffected.
pub fn parse_pubmed_articles(xml: &str) -> Result<ParsedBatch> {
    let root = parse_document(xml)?;
    let articles = if root.name == "PubmedArticle" {
        vec![&root]
    } else {
        root.descendants("PubmedArticle")
    };

    let mut batch = ParsedBatch::default();
    for (i, article) in articles.into_iter().enumerate() {
        match parse_pubmed_article(article) {
            Ok(record) => batch.records.push(record),
            Err(e) => {
                warn!(index = i, error = %e, "Skipping malformed PubMed article");
                batch.skipped += 1;
            }
        }
    }
    Ok(batch)
}

/// Convert one `<PubmedArticle>` subtree into a record.
/// Missing optional fields resolve to their documented defaults.
pub fn parse_pubmed_article(article: &XmlElement) -> Result<BibliographicRecord> {
    let citation = article
        .find("MedlineCitation")
        .ok_or_else(|| EvidentiaError::MalformedItem("PubmedArticle without MedlineCitation".to_string()))?;

    let pmid = citation.find("PMID").map(XmlElement::text).filter(|s| !s.is_empty());

    let title = article
        .find("ArticleTitle")
        .map(XmlElement::text)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    let abstract_text = article
        .descendants("AbstractText")
        .into_iter()
        .map(XmlElement::text)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let journal = article
        .find_path("Journal/Title")
        .map(XmlElement::text)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_JOURNAL.to_string());

    let url = pmid
        .as_ref()
        .map(|id| format!("{}/{}/", ARTICLE_URL_BASE, id))
        .unwrap_or_default();

    Ok(BibliographicRecord {
        study_type: classify_study_type(&title, &abstract_text),
        sample_size: extract_sample_size(&abstract_text),
        authors: extract_authors(article),
        publication_date: extract_publication_date(article),
        doi: extract_doi(article),
        funding_source: extract_funding(article),
        conflicts_disclosed: conflicts_disclosed(article),
        peer_reviewed: true,
        external_id: pmid,
        title,
        abstract_text,
        journal,
        url,
        ..BibliographicRecord::new(RecordSource::PubMed)
    })
}

/// "ForeName LastName" per author; authors missing either part are skipped.
fn extract_authors(article: &XmlElement) -> Vec<String> {
    article
        .descendants("Author")
        .into_iter()
        .filter_map(|a| {
            let last = a.child_text("LastName")?;
            let fore = a.child_text("ForeName")?;
            Some(format!("{} {}", fore, last))
        })
        .collect()
}

/// "<Month> <Year>", "<Year>", or empty.
fn extract_publication_date(article: &XmlElement) -> String {
    let Some(pub_date) = article.find("PubDate") else { return String::new() };
    match (pub_date.child_text("Year"), pub_date.child_text("Month")) {
        (Some(year), Some(month)) => format!("{} {}", month, year),
        (Some(year), None) => year,
        (None, _) => String::new(),
    }
}

/// First identifier in the article's own id list whose IdType is "doi".
fn extract_doi(article: &XmlElement) -> Option<String> {
    let ids = article.find("ArticleIdList")?;
    ids.children_named("ArticleId")
        .find(|id| id.attr("IdType") == Some("doi"))
        .map(XmlElement::text)
        .filter(|s| !s.is_empty())
}

fn extract_funding(article: &XmlElement) -> String {
    let grants = article.descendants("Grant");
    if grants.is_empty() {
        return String::new();
    }
    let agencies: Vec<String> = grants
        .iter()
        .filter_map(|g| g.child_text("Agency"))
        .collect();
    if agencies.is_empty() {
        "Grant funded".to_string()
    } else {
        agencies.join(", ")
    }
}

/// True when any abstract section is labelled as a conflict-of-interest statement.
fn conflicts_disclosed(article: &XmlElement) -> bool {
    article
        .descendants("AbstractText")
        .iter()
        .filter_map(|s| s.attr("Label"))
        .any(|label| label.to_lowercase().contains("conflict"))
}
