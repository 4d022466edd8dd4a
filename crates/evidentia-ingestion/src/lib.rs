//! evidentia-ingestion — Literature retrieval and evidence assembly.
//! - Source clients (PubMed E-utilities, arXiv Atom, web search)
//! - Tolerant XML record parsing
//! - Study-design and sample-size heuristics
//! - Orchestration into an evidence bundle
//! - Plain-text digest for downstream narration

pub mod xml;
pub mod classify;
pub mod sources;
pub mod pipeline;
pub mod digest;

pub use pipeline::{EvidenceBundle, EvidencePipeline, EvidenceRequest, PipelineConfig};
