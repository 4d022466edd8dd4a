//! End-to-end pipeline runs over recorded upstream payloads.

use std::sync::Arc;
use std::time::Duration;

use evidentia_common::{RecordSource, StudyType, WebSourceType};
use evidentia_ingestion::digest::render_digest;
use evidentia_ingestion::sources::arxiv::parse_arxiv_feed;
use evidentia_ingestion::sources::mock::{MockPreprintSource, MockPrimarySource, MockWebSource};
use evidentia_ingestion::sources::pubmed::parse_pubmed_articles;
use evidentia_ingestion::{EvidencePipeline, EvidenceRequest, PipelineConfig};
use evidentia_ranker::{EvidenceGrade, QualityScorer};
use pretty_assertions::assert_eq;

const PUBMED_FIXTURE: &str = include_str!("fixtures/pubmed_efetch.xml");
const ARXIV_FIXTURE: &str = include_str!("fixtures/arxiv_feed.xml");

fn config() -> PipelineConfig {
    PipelineConfig {
        search_timeout: Duration::from_millis(200),
        fetch_timeout: Duration::from_millis(200),
        preprint_timeout: Duration::from_millis(200),
        web_timeout: Duration::from_millis(200),
        ..PipelineConfig::default()
    }
}

#[test]
fn test_pubmed_fixture_parses() {
    let batch = parse_pubmed_articles(PUBMED_FIXTURE).unwrap();
    assert_eq!(batch.records.len(), 2);
    assert_eq!(batch.skipped, 1);

    let meta = &batch.records[0];
    assert_eq!(meta.external_id.as_deref(), Some("36000001"));
    assert_eq!(meta.study_type, StudyType::MetaAnalysis);
    assert_eq!(meta.sample_size, Some(405907));
    assert_eq!(meta.journal, "Lancet (London, England)");
    assert_eq!(meta.publication_date, "Jun 2023");
    assert_eq!(meta.authors, vec!["Meghan B Azad", "Ahmed M Abou-Setta"]);
    assert_eq!(meta.doi.as_deref(), Some("10.1016/S0140-6736(23)00001-1"));
    assert_eq!(meta.funding_source, "CIHR");
    assert!(meta.conflicts_disclosed);

    let cc = &batch.records[1];
    assert_eq!(cc.study_type, StudyType::CaseControl);
    assert_eq!(cc.sample_size, Some(64));
    assert_eq!(cc.publication_date, "2016");
    assert_eq!(cc.funding_source, "Grant funded");
    assert_eq!(cc.doi, None);
    assert!(!cc.conflicts_disclosed);
}

#[test]
fn test_arxiv_fixture_parses() {
    let batch = parse_arxiv_feed(ARXIV_FIXTURE).unwrap();
    assert_eq!(batch.records.len(), 2);
    let first = &batch.records[0];
    assert_eq!(first.title, "Graph neural networks for predicting sweetener receptor binding");
    assert_eq!(first.abstract_text, "We train a model on 1200 compounds and report binding affinities.");
    assert_eq!(first.authors, vec!["Priya Raman", "Tomás Ortega"]);
    assert_eq!(first.publication_date, "2023-10-02");
    assert_eq!(first.external_id.as_deref(), Some("2310.01234v1"));
    assert_eq!(batch.records[1].sample_size, Some(2500));
}

#[tokio::test]
async fn test_full_run_over_fixtures() {
    let primary = MockPrimarySource::new()
        .with_ids("aspartame safety", &["36000001", "35000002", "34000003"])
        .with_raw_fetch(PUBMED_FIXTURE);
    let preprints = Arc::new(MockPreprintSource::new().with_entry("2402.05678v2", "Exposure estimates"));
    let web = MockWebSource::new()
        .with_hit("Aspartame and cancer", "https://www.cancer.gov/about-cancer/aspartame", "No link found.")
        .with_hit("Artificial sweeteners", "https://www.mayoclinic.org/sweeteners", "Generally safe.");

    let pipeline = EvidencePipeline::new(Arc::new(primary), preprints.clone(), Arc::new(web), config())
        .with_scorer(QualityScorer::with_current_year(2025));

    let request = EvidenceRequest::from_generated("\"aspartame safety\"|aspartame cancer", "aspartame");
    let bundle = pipeline.run(&request).await;

    // Two parsed PubMed records are below the floor of three
    assert_eq!(preprints.searches(), vec!["aspartame safety"]);
    assert_eq!(bundle.records().len(), 3);

    let top = &bundle.records()[0];
    assert_eq!(top.source, RecordSource::PubMed);
    assert_eq!(top.study_type, StudyType::MetaAnalysis);
    assert_eq!(top.quality_score, 1.0);

    let scores: Vec<f64> = bundle.records().iter().map(|r| r.quality_score).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));

    // one meta-analysis but only one record above 0.8
    assert_eq!(bundle.evidence_grade(), EvidenceGrade::LimitedQualityMetaAnalysis);

    assert_eq!(bundle.web_results().len(), 2);
    assert_eq!(bundle.web_results()[0].source_type, WebSourceType::News);
    assert_eq!(bundle.web_results()[1].credibility_score, 0.85);

    assert!(bundle.confidence() > 0.2 && bundle.confidence() <= 0.95);

    let digest = render_digest(&bundle);
    assert!(digest.starts_with("ACADEMIC RESEARCH:\nACADEMIC PAPER 1:\nTitle: Non-nutritive sweeteners"));
    assert!(digest.contains("EVIDENCE GRADE: Moderate — meta-analysis available but limited quality"));
}
