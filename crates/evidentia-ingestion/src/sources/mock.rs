//! In-memory sources for tests and offline runs.
//!
//! Each mock records the queries it receives so callers can assert on the
//! sequence of upstream calls.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use evidentia_common::{EvidentiaError, Result};

use super::{PreprintSource, PrimarySource, WebHit, WebSearchSource};

fn unavailable(source_name: &'static str) -> EvidentiaError {
    EvidentiaError::Status { source_name, status: 503 }
}

fn record_call(calls: &Mutex<Vec<String>>, query: &str) {
    if let Ok(mut calls) = calls.lock() {
        calls.push(query.to_string());
    }
}

fn snapshot(calls: &Mutex<Vec<String>>) -> Vec<String> {
    calls.lock().map(|c| c.clone()).unwrap_or_default()
}

async fn pause(delay: Option<Duration>) {
    if let Some(d) = delay {
        tokio::time::sleep(d).await;
    }
}

// ── Primary ───────────────────────────────────────────────────────────────

/// PubMed-shaped mock: queries map to PMIDs, PMIDs map to article XML.
pub struct MockPrimarySource {
    ids: HashMap<String, Vec<String>>,
    articles: HashMap<String, String>,
    raw_fetch: Option<String>,
    fail_search: bool,
    fail_fetch: bool,
    delay: Option<Duration>,
    searches: Mutex<Vec<String>>,
}

impl MockPrimarySource {
    pub fn new() -> Self {
        Self {
            ids: HashMap::new(),
            articles: HashMap::new(),
            raw_fetch: None,
            fail_search: false,
            fail_fetch: false,
            delay: None,
            searches: Mutex::new(Vec::new()),
        }
    }

    /// Identifiers returned for an exact query string.
    pub fn with_ids(mut self, query: &str, ids: &[&str]) -> Self {
        self.ids.insert(query.to_string(), ids.iter().map(|s| s.to_string()).collect());
        self
    }

    /// A minimal `<PubmedArticle>` served when `pmid` is fetched.
    pub fn with_article(mut self, pmid: &str, title: &str, abstract_text: &str) -> Self {
        let xml = format!(
            "<PubmedArticle><MedlineCitation><PMID>{pmid}</PMID><Article>\
             <Journal><Title>Test Journal</Title></Journal>\
             <ArticleTitle>{title}</ArticleTitle>\
             <Abstract><AbstractText>{abstract_text}</AbstractText></Abstract>\
             </Article></MedlineCitation></PubmedArticle>"
        );
        self.articles.insert(pmid.to_string(), xml);
        self
    }

    /// Serve `xml` verbatim for every fetch, ignoring registered articles.
    pub fn with_raw_fetch(mut self, xml: &str) -> Self {
        self.raw_fetch = Some(xml.to_string());
        self
    }

    pub fn failing_search(mut self) -> Self {
        self.fail_search = true;
        self
    }

    pub fn failing_fetch(mut self) -> Self {
        self.fail_fetch = true;
        self
    }

    /// Sleep before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queries received by `search`, in call order.
    pub fn searches(&self) -> Vec<String> {
        snapshot(&self.searches)
    }
}

impl Default for MockPrimarySource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PrimarySource for MockPrimarySource {
    fn name(&self) -> &'static str {
        "mock-primary"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<String>> {
        record_call(&self.searches, query);
        pause(self.delay).await;
        if self.fail_search {
            return Err(unavailable(self.name()));
        }
        Ok(self
            .ids
            .get(query)
            .map(|ids| ids.iter().take(max_results).cloned().collect())
            .unwrap_or_default())
    }

    async fn fetch(&self, ids: &[String]) -> Result<String> {
        pause(self.delay).await;
        if self.fail_fetch {
            return Err(unavailable(self.name()));
        }
        if let Some(raw) = &self.raw_fetch {
            return Ok(raw.clone());
        }
        let body: String = ids
            .iter()
            .filter_map(|id| self.articles.get(id))
            .map(String::as_str)
            .collect();
        Ok(format!("<PubmedArticleSet>{}</PubmedArticleSet>", body))
    }
}

// ── Preprints ─────────────────────────────────────────────────────────────

/// arXiv-shaped mock returning the same feed for every query.
pub struct MockPreprintSource {
    entries: Vec<String>,
    fail: bool,
    delay: Option<Duration>,
    searches: Mutex<Vec<String>>,
}

impl MockPreprintSource {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            fail: false,
            delay: None,
            searches: Mutex::new(Vec::new()),
        }
    }

    pub fn with_entry(mut self, arxiv_id: &str, title: &str) -> Self {
        self.entries.push(format!(
            "<entry><id>http://arxiv.org/abs/{arxiv_id}</id>\
             <published>2024-02-01T00:00:00Z</published>\
             <title>{title}</title><summary>Preprint summary.</summary>\
             <author><name>Test Author</name></author></entry>"
        ));
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn searches(&self) -> Vec<String> {
        snapshot(&self.searches)
    }
}

impl Default for MockPreprintSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PreprintSource for MockPreprintSource {
    fn name(&self) -> &'static str {
        "mock-preprint"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<String> {
        record_call(&self.searches, query);
        pause(self.delay).await;
        if self.fail {
            return Err(unavailable(self.name()));
        }
        let entries: String = self.entries.iter().take(max_results).map(String::as_str).collect();
        Ok(format!(
            r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">{}</feed>"#,
            entries
        ))
    }
}

// ── Web ───────────────────────────────────────────────────────────────────

/// Web search mock returning the same hits for every query.
pub struct MockWebSource {
    hits: Vec<WebHit>,
    fail: bool,
    delay: Option<Duration>,
    searches: Mutex<Vec<String>>,
}

impl MockWebSource {
    pub fn new() -> Self {
        Self {
            hits: Vec::new(),
            fail: false,
            delay: None,
            searches: Mutex::new(Vec::new()),
        }
    }

    pub fn with_hit(mut self, title: &str, url: &str, content: &str) -> Self {
        self.hits.push(WebHit {
            title: title.to_string(),
            url: url.to_string(),
            content: content.to_string(),
        });
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn searches(&self) -> Vec<String> {
        snapshot(&self.searches)
    }
}

impl Default for MockWebSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebSearchSource for MockWebSource {
    fn name(&self) -> &'static str {
        "mock-web"
    }

    async fn search(
        &self,
        query: &str,
        _allowed_domains: &[String],
        max_results: usize,
    ) -> Result<Vec<WebHit>> {
        record_call(&self.searches, query);
        pause(self.delay).await;
        if self.fail {
            return Err(unavailable(self.name()));
        }
        Ok(self.hits.iter().take(max_results).cloned().collect())
    }
}
