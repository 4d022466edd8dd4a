//! Evidentia: evidence aggregation and quality scoring for health questions.
//! Entry point for the command-line binary.

mod config;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use evidentia_common::sandbox::SandboxClient;
use evidentia_ingestion::digest::render_digest;
use evidentia_ingestion::sources::arxiv::ArxivClient;
use evidentia_ingestion::sources::pubmed::PubMedClient;
use evidentia_ingestion::sources::web::TavilyClient;
use evidentia_ingestion::{EvidenceBundle, EvidencePipeline, EvidenceRequest};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Debug, Parser)]
#[command(name = "evidentia", version, about = "Retrieve, score and grade the evidence for a health question")]
struct Cli {
    /// Academic queries, separated by '|'
    #[arg(long)]
    academic: String,

    /// Web queries, separated by '|'. Defaults to the academic queries.
    #[arg(long)]
    web: Option<String>,

    /// Path to evidentia.toml
    #[arg(long, env = "EVIDENTIA_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Also print the plain-text evidence digest
    #[arg(long)]
    digest: bool,
}

/// Wire the HTTP source clients into a pipeline. API keys move out of the config here.
fn build_pipeline(config: config::Config) -> anyhow::Result<EvidencePipeline> {
    let pipeline_config = config.pipeline_config();

    let pubmed_http = SandboxClient::new(Duration::from_secs(
        config.pubmed.search_timeout_secs.max(config.pubmed.fetch_timeout_secs),
    ))?;
    let pubmed = PubMedClient::new(pubmed_http)
        .with_email(config.pubmed.email)
        .with_tool(config.pubmed.tool)
        .with_api_key(config.pubmed.api_key);

    let arxiv = ArxivClient::new(SandboxClient::new(Duration::from_secs(config.arxiv.timeout_secs))?);

    if config.web.api_key.is_none() {
        tracing::warn!("No web search key found (set web.api_key or TAVILY_API_KEY); web results will be empty");
    }
    let web = TavilyClient::new(
        SandboxClient::new(Duration::from_secs(config.web.timeout_secs))?,
        config.web.api_key,
    )
    .with_query_suffix(config.web.query_suffix);

    Ok(EvidencePipeline::new(
        Arc::new(pubmed),
        Arc::new(arxiv),
        Arc::new(web),
        pipeline_config,
    ))
}

fn print_text(bundle: &EvidenceBundle) {
    println!("Evidence grade: {}", bundle.evidence_grade());
    println!("Confidence:     {:.2}", bundle.confidence());
    println!();
    println!("{:>5}  {:<16} {:<8} TITLE", "SCORE", "DESIGN", "SOURCE");
    for r in bundle.records() {
        println!(
            "{:>5.2}  {:<16} {:<8} {}",
            r.quality_score,
            r.study_type.as_str(),
            r.source.as_str(),
            r.title
        );
    }
    if !bundle.web_results().is_empty() {
        println!();
        println!("{:>5}  {:<18} URL", "CRED", "TYPE");
        for w in bundle.web_results() {
            println!("{:>5.2}  {:<18} {}", w.credibility_score, w.source_type.as_str(), w.url);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("evidentia=debug,info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("Evidentia {} starting", env!("CARGO_PKG_VERSION"));

    let config = config::Config::load(cli.config.as_deref())?;
    info!(
        primary_queries = config.pipeline.max_primary_queries,
        web_queries = config.pipeline.max_web_queries,
        preprint_scoring = ?config.pipeline.preprint_scoring,
        "Configuration loaded"
    );

    let web_queries = cli.web.as_deref().unwrap_or(&cli.academic);
    let request = EvidenceRequest::from_generated(&cli.academic, web_queries);
    if request.academic_queries.is_empty() {
        anyhow::bail!("--academic must contain at least one non-empty query");
    }

    let pipeline = build_pipeline(config)?;
    let bundle = pipeline.run(&request).await;

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&bundle)?),
        OutputFormat::Text => print_text(&bundle),
    }
    if cli.digest {
        println!();
        print!("{}", render_digest(&bundle));
    }

    Ok(())
}
