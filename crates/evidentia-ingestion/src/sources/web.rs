//! Tavily web search client.
//!
//! Endpoint: https://api.tavily.com/search (POST, bearer auth)

use async_trait::async_trait;
use evidentia_common::sandbox::SandboxClient;
use evidentia_common::Result;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use super::{read_body, WebHit, WebSearchSource};

const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<WebHit>,
}

pub struct TavilyClient {
    client: SandboxClient,
    api_key: Option<SecretString>,
    query_suffix: String,
}

impl TavilyClient {
    pub fn new(client: SandboxClient, api_key: Option<SecretString>) -> Self {
        Self {
            client,
            api_key,
            query_suffix: "health medical".to_string(),
        }
    }

    /// Words appended to every query to bias results towards health content.
    pub fn with_query_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.query_suffix = suffix.into();
        self
    }

    fn full_query(&self, query: &str) -> String {
        let suffix = self.query_suffix.trim();
        if suffix.is_empty() {
            query.to_string()
        } else {
            format!("{} {}", query, suffix)
        }
    }
}

#[async_trait]
impl WebSearchSource for TavilyClient {
    fn name(&self) -> &'static str {
        "tavily"
    }

    #[instrument(skip(self, allowed_domains))]
    async fn search(
        &self,
        query: &str,
        allowed_domains: &[String],
        max_results: usize,
    ) -> Result<Vec<WebHit>> {
        let Some(api_key) = &self.api_key else {
            warn!("No web search API key configured; skipping web search");
            return Ok(Vec::new());
        };

        let body = serde_json::json!({
            "query": self.full_query(query),
            "search_depth": "basic",
            "max_results": max_results,
            "include_domains": allowed_domains,
        });

        let resp = self
            .client
            .post(TAVILY_SEARCH_URL)?
            .bearer_auth(api_key.expose_secret())
            .json(&body)
            .send()
            .await?;
        let text = read_body(resp, "tavily").await?;
        let hits = parse_search_response(&text)?;

        debug!(n = hits.len(), "Tavily returned results");
        Ok(hits)
    }
}

/// Parse a search response body; a missing `results` array means no hits.
pub fn parse_search_response(json: &str) -> Result<Vec<WebHit>> {
    let parsed: TavilyResponse = serde_json::from_str(json)?;
    Ok(parsed.results)
}
