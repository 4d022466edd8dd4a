use reqwest::{Client, ClientBuilder};
use std::collections::HashSet;
use std::time::Duration;
use tracing::warn;
use url::Url;
use crate::error::EvidentiaError;

/// Hosts the retrieval stage is permitted to reach.
pub const DEFAULT_ALLOWED_HOSTS: &[&str] = &[
    "eutils.ncbi.nlm.nih.gov", // PubMed E-utilities
    "export.arxiv.org",        // arXiv Atom API
    "api.tavily.com",          // Web search
];

const USER_AGENT: &str = "Evidentia/0.1 (research)";

/// An HTTP client that only issues requests to allowlisted hosts.
/// Each source client owns one; no request state is shared between calls.
#[derive(Debug, Clone)]
pub struct SandboxClient {
    client: Client,
    allowlist: HashSet<String>,
}

impl SandboxClient {
    /// Creates a client with the default allowlist and the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self, EvidentiaError> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| EvidentiaError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let allowlist = DEFAULT_ALLOWED_HOSTS.iter().map(|d| d.to_string()).collect();
        Ok(Self { client, allowlist })
    }

    /// Appends an exact hostname to the allowlist.
    pub fn allow_domain(&mut self, domain: &str) {
        self.allowlist.insert(domain.to_string());
    }

    /// Validates if a URL is permitted under the current policy.
    pub fn is_allowed(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else { return false };
        let Some(host) = parsed.host_str() else { return false };
        // Exact match or subdomain of an allowed host
        self.allowlist
            .iter()
            .any(|allowed| host == allowed || host.ends_with(&format!(".{}", allowed)))
    }

    pub fn get(&self, url: &str) -> Result<reqwest::RequestBuilder, EvidentiaError> {
        self.check(url)?;
        Ok(self.client.get(url))
    }

    pub fn post(&self, url: &str) -> Result<reqwest::RequestBuilder, EvidentiaError> {
        self.check(url)?;
        Ok(self.client.post(url))
    }

    fn check(&self, url: &str) -> Result<(), EvidentiaError> {
        if self.is_allowed(url) {
            Ok(())
        } else {
            warn!(url, "Blocked request to host outside the allowlist");
            Err(EvidentiaError::Security(format!(
                "domain not in allowlist for URL {}",
                url
            )))
        }
    }
}
