//! Configuration loading for Evidentia.
//! Reads evidentia.toml from the current directory, the path in the
//! EVIDENTIA_CONFIG env var, or the path given on the command line.

use std::path::{Path, PathBuf};
use std::time::Duration;

use evidentia_ingestion::pipeline::DEFAULT_WEB_DOMAINS;
use evidentia_ingestion::PipelineConfig;
use evidentia_ranker::ScoringPolicy;
use secrecy::SecretString;
use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_CONFIG_FILE: &str = "evidentia.toml";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pubmed: PubMedConfig,
    #[serde(default)]
    pub arxiv: ArxivConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub pipeline: PipelineSettings,
}

#[derive(Debug, Deserialize)]
pub struct PubMedConfig {
    #[serde(default = "default_email")]
    pub email: String,
    #[serde(default = "default_tool")]
    pub tool: String,
    /// Falls back to NCBI_API_KEY.
    pub api_key: Option<SecretString>,
    #[serde(default = "default_pubmed_max_results")]
    pub max_results_per_query: usize,
    #[serde(default = "default_10")]
    pub search_timeout_secs: u64,
    #[serde(default = "default_15")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "bool_true")]
    pub simplified_query_fallback: bool,
}

fn default_email()              -> String { "research@example.com".to_string() }
fn default_tool()               -> String { "evidentia".to_string() }
fn default_pubmed_max_results() -> usize  { 3 }
fn default_10()                 -> u64    { 10 }
fn default_15()                 -> u64    { 15 }
fn bool_true()                  -> bool   { true }

impl Default for PubMedConfig {
    fn default() -> Self {
        Self {
            email: default_email(),
            tool: default_tool(),
            api_key: None,
            max_results_per_query: default_pubmed_max_results(),
            search_timeout_secs: default_10(),
            fetch_timeout_secs: default_15(),
            simplified_query_fallback: bool_true(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArxivConfig {
    #[serde(default = "default_arxiv_max_results")]
    pub max_results: usize,
    #[serde(default = "default_10")]
    pub timeout_secs: u64,
}

fn default_arxiv_max_results() -> usize { 2 }

impl Default for ArxivConfig {
    fn default() -> Self {
        Self { max_results: default_arxiv_max_results(), timeout_secs: default_10() }
    }
}

#[derive(Debug, Deserialize)]
pub struct WebConfig {
    /// Falls back to TAVILY_API_KEY.
    pub api_key: Option<SecretString>,
    #[serde(default = "default_web_max_results")]
    pub max_results: usize,
    #[serde(default = "default_query_suffix")]
    pub query_suffix: String,
    #[serde(default = "default_include_domains")]
    pub include_domains: Vec<String>,
    #[serde(default = "default_10")]
    pub timeout_secs: u64,
}

fn default_web_max_results() -> usize  { 3 }
fn default_query_suffix()    -> String { "health medical".to_string() }
fn default_include_domains() -> Vec<String> {
    DEFAULT_WEB_DOMAINS.iter().map(|d| d.to_string()).collect()
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            max_results: default_web_max_results(),
            query_suffix: default_query_suffix(),
            include_domains: default_include_domains(),
            timeout_secs: default_10(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreprintScoring {
    /// Preprints get `preprint_fixed_score` and skip the scorer.
    Fixed,
    /// Preprints are scored like any other record.
    Uniform,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSettings {
    #[serde(default = "default_2")]
    pub max_primary_queries: usize,
    #[serde(default = "default_2")]
    pub max_web_queries: usize,
    #[serde(default = "default_min_records")]
    pub min_records_before_fallback: usize,
    #[serde(default = "default_preprint_scoring")]
    pub preprint_scoring: PreprintScoring,
    #[serde(default = "default_preprint_score")]
    pub preprint_fixed_score: f64,
}

fn default_2()                -> usize           { 2 }
fn default_min_records()      -> usize           { 3 }
fn default_preprint_scoring() -> PreprintScoring { PreprintScoring::Fixed }
fn default_preprint_score()   -> f64             { 0.3 }

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_primary_queries: default_2(),
            max_web_queries: default_2(),
            min_records_before_fallback: default_min_records(),
            preprint_scoring: default_preprint_scoring(),
            preprint_fixed_score: default_preprint_score(),
        }
    }
}


impl Config {
    /// Load configuration.
    /// Resolution order: explicit path, EVIDENTIA_CONFIG, ./evidentia.toml.
    /// A missing file yields the built-in defaults.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("EVIDENTIA_CONFIG").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            Self::from_toml(&content)
                .map_err(|e| anyhow::anyhow!("Invalid config {}: {}", path.display(), e))?
        } else {
            warn!(
                "Config file not found: {}. Using built-in defaults; \
                 copy evidentia.example.toml to evidentia.toml to customise.",
                path.display()
            );
            Self::default()
        };

        config.apply_env_keys(
            std::env::var("NCBI_API_KEY").ok(),
            std::env::var("TAVILY_API_KEY").ok(),
        );
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Fill API keys missing from the file with values from the environment.
    pub fn apply_env_keys(&mut self, ncbi: Option<String>, tavily: Option<String>) {
        if self.pubmed.api_key.is_none() {
            self.pubmed.api_key = ncbi.filter(|k| !k.is_empty()).map(SecretString::from);
        }
        if self.web.api_key.is_none() {
            self.web.api_key = tavily.filter(|k| !k.is_empty()).map(SecretString::from);
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let score = self.pipeline.preprint_fixed_score;
        if !(0.0..=1.0).contains(&score) {
            anyhow::bail!("pipeline.preprint_fixed_score must be within [0, 1], got {}", score);
        }
        if self.pubmed.email.trim().is_empty() {
            anyhow::bail!("pubmed.email must not be empty");
        }
        Ok(())
    }

    /// Pipeline settings derived from this configuration.
    pub fn pipeline_config(&self) -> PipelineConfig {
        let scoring_policy = match self.pipeline.preprint_scoring {
            PreprintScoring::Fixed   => ScoringPolicy::PreprintFixed(self.pipeline.preprint_fixed_score),
            PreprintScoring::Uniform => ScoringPolicy::Uniform,
        };

        PipelineConfig {
            max_primary_queries: self.pipeline.max_primary_queries,
            primary_max_results: self.pubmed.max_results_per_query,
            search_timeout: Duration::from_secs(self.pubmed.search_timeout_secs),
            fetch_timeout: Duration::from_secs(self.pubmed.fetch_timeout_secs),
            simplified_query_fallback: self.pubmed.simplified_query_fallback,
            min_records_before_fallback: self.pipeline.min_records_before_fallback,
            preprint_max_results: self.arxiv.max_results,
            preprint_timeout: Duration::from_secs(self.arxiv.timeout_secs),
            max_web_queries: self.pipeline.max_web_queries,
            web_max_results: self.web.max_results,
            web_timeout: Duration::from_secs(self.web.timeout_secs),
            web_domains: self.web.include_domains.clone(),
            scoring_policy,
        }
    }
}
