//! Literature and web source clients.
//!
//! Clients are pure I/O: they return identifiers, raw XML or raw web hits
//! and never score anything. Any failure is returned as an error; turning
//! failures into empty results is the pipeline's job.

pub mod pubmed;
pub mod arxiv;
pub mod web;
pub mod mock;

use async_trait::async_trait;
use evidentia_common::{BibliographicRecord, EvidentiaError, Result};
use serde::{Deserialize, Deserializer, Serialize};

/// Primary peer-reviewed source (PubMed-style two-step search then fetch).
#[async_trait]
pub trait PrimarySource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Search for identifiers matching a query, best first.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<String>>;

    /// Fetch the raw article-set XML for a batch of identifiers.
    async fn fetch(&self, ids: &[String]) -> Result<String>;
}

/// Secondary preprint source returning a namespaced Atom feed.
#[async_trait]
pub trait PreprintSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Search and return the raw feed XML.
    async fn search(&self, query: &str, max_results: usize) -> Result<String>;
}

/// General web search restricted to a set of domains.
#[async_trait]
pub trait WebSearchSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn search(
        &self,
        query: &str,
        allowed_domains: &[String],
        max_results: usize,
    ) -> Result<Vec<WebHit>>;
}

/// One unclassified web search result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebHit {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Records parsed from one batch, plus the count of articles skipped as malformed.
#[derive(Debug, Clone, Default)]
pub struct ParsedBatch {
    pub records: Vec<BibliographicRecord>,
    pub skipped: usize,
}

/// Read a response body, mapping non-success statuses to an error.
pub(crate) async fn read_body(resp: reqwest::Response, source_name: &'static str) -> Result<String> {
    let status = resp.status();
    if !status.is_success() {
        return Err(EvidentiaError::Status { source_name, status: status.as_u16() });
    }
    Ok(resp.text().await?)
}
