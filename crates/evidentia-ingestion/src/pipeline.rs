//! Evidence pipeline for one question.
//!
//! Orchestrates a single run:
//!   1. Up to N primary (PubMed) searches, concurrently, each search and
//!      fetch bounded by its own timeout
//!   2. One preprint (arXiv) search when the primary sources came up short
//!   3. Score every record and sort best first
//!   4. Grade the corpus
//!   5. Web search and URL classification, concurrently with 1-4
//!   6. Overall confidence
//!
//! Every upstream failure (transport, timeout, malformed batch) degrades that
//! call to zero results. `run` always returns a bundle.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use evidentia_common::confidence::compute_confidence;
use evidentia_common::{BibliographicRecord, EvidentiaError, Result, WebResult};
use evidentia_ranker::credibility::classify_web_result;
use evidentia_ranker::{grade_evidence, EvidenceGrade, QualityScorer, ScoringPolicy};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::sources::arxiv::parse_arxiv_feed;
use crate::sources::pubmed::parse_pubmed_articles;
use crate::sources::{PreprintSource, PrimarySource, WebSearchSource};

// ── Config ────────────────────────────────────────────────────────────────────

/// Domains the web search is restricted to by default.
pub const DEFAULT_WEB_DOMAINS: &[&str] = &[
    "mayoclinic.org",
    "webmd.com",
    "healthline.com",
    "nih.gov",
    "cdc.gov",
    "who.int",
    "harvard.edu",
    "clevelandclinic.org",
    "hopkinsmedicine.org",
];

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub max_primary_queries: usize,
    pub primary_max_results: usize,
    pub search_timeout: Duration,
    pub fetch_timeout: Duration,
    /// Retry an empty primary search with only the query's first word.
    pub simplified_query_fallback: bool,
    /// Below this many primary records, the preprint source is consulted.
    pub min_records_before_fallback: usize,
    pub preprint_max_results: usize,
    pub preprint_timeout: Duration,
    pub max_web_queries: usize,
    pub web_max_results: usize,
    pub web_timeout: Duration,
    pub web_domains: Vec<String>,
    pub scoring_policy: ScoringPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_primary_queries: 2,
            primary_max_results: 3,
            search_timeout: Duration::from_secs(10),
            fetch_timeout: Duration::from_secs(15),
            simplified_query_fallback: true,
            min_records_before_fallback: 3,
            preprint_max_results: 2,
            preprint_timeout: Duration::from_secs(10),
            max_web_queries: 2,
            web_max_results: 3,
            web_timeout: Duration::from_secs(10),
            web_domains: DEFAULT_WEB_DOMAINS.iter().map(|d| d.to_string()).collect(),
            scoring_policy: ScoringPolicy::default(),
        }
    }
}

// ── Request ───────────────────────────────────────────────────────────────────

/// Queries for one run, usually produced upstream by a text-generation step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRequest {
    pub academic_queries: Vec<String>,
    pub web_queries: Vec<String>,
}

impl EvidenceRequest {
    pub fn new(academic_queries: Vec<String>, web_queries: Vec<String>) -> Self {
        Self { academic_queries, web_queries }
    }

    /// Build a request from `"q1|q2"` style lists.
    pub fn from_generated(academic: &str, web: &str) -> Self {
        Self::new(parse_query_list(academic), parse_query_list(web))
    }
}

/// Split a `|`-separated list, trimming whitespace and surrounding quotes.
pub fn parse_query_list(raw: &str) -> Vec<String> {
    raw.split('|')
        .map(|q| q.trim().trim_matches('"').trim())
        .filter(|q| !q.is_empty())
        .map(str::to_string)
        .collect()
}

// ── Bundle ────────────────────────────────────────────────────────────────────

/// Output of one run. Records are sorted by descending quality score.
#[derive(Debug, Clone, Serialize)]
pub struct EvidenceBundle {
    run_id: Uuid,
    records: Vec<BibliographicRecord>,
    web_results: Vec<WebResult>,
    evidence_grade: EvidenceGrade,
    confidence: f64,
}

impl EvidenceBundle {
    /// Sort, grade and compute confidence over already-scored records.
    pub fn assemble(
        run_id: Uuid,
        mut records: Vec<BibliographicRecord>,
        web_results: Vec<WebResult>,
    ) -> Self {
        records.sort_by(|a, b| b.quality_score.total_cmp(&a.quality_score));
        let evidence_grade = grade_evidence(&records);
        let confidence = compute_confidence(&records, &web_results);
        Self { run_id, records, web_results, evidence_grade, confidence }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn records(&self) -> &[BibliographicRecord] {
        &self.records
    }

    pub fn web_results(&self) -> &[WebResult] {
        &self.web_results
    }

    pub fn evidence_grade(&self) -> EvidenceGrade {
        self.evidence_grade
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}

// ── Degrade-to-empty plumbing ─────────────────────────────────────────────────

/// Outcome of one upstream call. `Unavailable` is only ever logged;
/// downstream stages see an empty sequence.
enum Retrieval<T> {
    Items(Vec<T>),
    Unavailable { source: &'static str, reason: String },
}

impl<T> Retrieval<T> {
    fn unavailable(source: &'static str, err: EvidentiaError) -> Self {
        Retrieval::Unavailable { source, reason: err.to_string() }
    }

    fn into_items(self) -> Vec<T> {
        match self {
            Retrieval::Items(items) => items,
            Retrieval::Unavailable { source, reason } => {
                warn!(source, reason = %reason, "Source unavailable, using zero results");
                Vec::new()
            }
        }
    }
}

/// Await `fut` for at most `limit`.
async fn bounded<T, F>(what: &str, limit: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res,
        Err(_) => Err(EvidentiaError::Timeout(what.to_string(), limit.as_millis() as u64)),
    }
}

/// First whitespace-delimited word, if it differs from the query.
fn simplified_query(query: &str) -> Option<&str> {
    let first = query.split_whitespace().next()?;
    (first != query.trim()).then_some(first)
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

pub struct EvidencePipeline {
    primary: Arc<dyn PrimarySource>,
    preprints: Arc<dyn PreprintSource>,
    web: Arc<dyn WebSearchSource>,
    scorer: QualityScorer,
    config: PipelineConfig,
}

impl EvidencePipeline {
    pub fn new(
        primary: Arc<dyn PrimarySource>,
        preprints: Arc<dyn PreprintSource>,
        web: Arc<dyn WebSearchSource>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            primary,
            preprints,
            web,
            scorer: QualityScorer::new(),
            config,
        }
    }

    pub fn with_scorer(mut self, scorer: QualityScorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline once. Never fails; see the module docs.
    pub async fn run(&self, request: &EvidenceRequest) -> EvidenceBundle {
        let run_id = Uuid::new_v4();
        let span = info_span!("evidence_run", run_id = %run_id);

        async move {
            let t0 = std::time::Instant::now();
            info!(
                academic = ?request.academic_queries,
                web = ?request.web_queries,
                "Starting evidence run"
            );

            let (records, web_results) =
                tokio::join!(self.collect_academic(request), self.collect_web(request));

            let bundle = EvidenceBundle::assemble(run_id, records, web_results);
            info!(
                records = bundle.records.len(),
                web_results = bundle.web_results.len(),
                grade = %bundle.evidence_grade,
                confidence = bundle.confidence,
                elapsed_ms = t0.elapsed().as_millis() as u64,
                "Evidence run complete"
            );
            bundle
        }
        .instrument(span)
        .await
    }

    /// Retrieve, parse and score academic records.
    async fn collect_academic(&self, request: &EvidenceRequest) -> Vec<BibliographicRecord> {
        let calls = request
            .academic_queries
            .iter()
            .take(self.config.max_primary_queries)
            .map(|q| self.primary_call(q));

        let mut records: Vec<BibliographicRecord> = join_all(calls)
            .await
            .into_iter()
            .flat_map(Retrieval::into_items)
            .collect();
        info!(n = records.len(), source = self.primary.name(), "Primary records retrieved");

        if records.len() < self.config.min_records_before_fallback {
            if let Some(query) = request.academic_queries.first() {
                let preprints = self.preprint_call(query).await.into_items();
                info!(n = preprints.len(), source = self.preprints.name(), "Preprint records retrieved");
                records.extend(preprints);
            }
        }

        let policy = self.config.scoring_policy;
        records
            .into_iter()
            .map(|r| self.scorer.assess(r, policy))
            .collect()
    }

    /// One primary query: search, optional simplified re-search, fetch, parse.
    async fn primary_call(&self, query: &str) -> Retrieval<BibliographicRecord> {
        let source = self.primary.name();
        let max = self.config.primary_max_results;
        let timeout = self.config.search_timeout;

        let mut ids = match bounded(source, timeout, self.primary.search(query, max)).await {
            Ok(ids) => ids,
            Err(e) => return Retrieval::unavailable(source, e),
        };

        if ids.is_empty() && self.config.simplified_query_fallback {
            if let Some(simple) = simplified_query(query) {
                debug!(query, simple, "No hits, trying simplified query");
                ids = match bounded(source, timeout, self.primary.search(simple, max)).await {
                    Ok(ids) => ids,
                    Err(e) => return Retrieval::unavailable(source, e),
                };
            }
        }

        if ids.is_empty() {
            debug!(query, "Primary search returned no identifiers");
            return Retrieval::Items(Vec::new());
        }

        let xml = match bounded(source, self.config.fetch_timeout, self.primary.fetch(&ids)).await {
            Ok(xml) => xml,
            Err(e) => return Retrieval::unavailable(source, e),
        };

        match parse_pubmed_articles(&xml) {
            Ok(batch) => {
                if batch.skipped > 0 {
                    warn!(source, query, skipped = batch.skipped, "Malformed articles skipped");
                }
                Retrieval::Items(batch.records)
            }
            Err(e) => Retrieval::unavailable(source, e),
        }
    }

    async fn preprint_call(&self, query: &str) -> Retrieval<BibliographicRecord> {
        let source = self.preprints.name();
        let search = self.preprints.search(query, self.config.preprint_max_results);

        let xml = match bounded(source, self.config.preprint_timeout, search).await {
            Ok(xml) => xml,
            Err(e) => return Retrieval::unavailable(source, e),
        };

        match parse_arxiv_feed(&xml) {
            Ok(batch) => {
                if batch.skipped > 0 {
                    warn!(source, query, skipped = batch.skipped, "Malformed entries skipped");
                }
                Retrieval::Items(batch.records)
            }
            Err(e) => Retrieval::unavailable(source, e),
        }
    }

    /// Retrieve and classify web results for the first few web queries.
    async fn collect_web(&self, request: &EvidenceRequest) -> Vec<WebResult> {
        let calls = request
            .web_queries
            .iter()
            .take(self.config.max_web_queries)
            .map(|q| self.web_call(q));

        let results: Vec<WebResult> = join_all(calls)
            .await
            .into_iter()
            .flat_map(Retrieval::into_items)
            .collect();
        info!(n = results.len(), source = self.web.name(), "Web results retrieved");
        results
    }

    async fn web_call(&self, query: &str) -> Retrieval<WebResult> {
        let source = self.web.name();
        let search = self
            .web
            .search(query, &self.config.web_domains, self.config.web_max_results);

        match bounded(source, self.config.web_timeout, search).await {
            Ok(hits) => Retrieval::Items(
                hits.iter()
                    .map(|h| classify_web_result(&h.title, &h.url, &h.content))
                    .collect(),
            ),
            Err(e) => Retrieval::unavailable(source, e),
        }
    }
}
