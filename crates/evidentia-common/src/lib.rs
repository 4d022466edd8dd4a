//! evidentia-common — Shared types, errors, and scoring maths used across all Evidentia crates.

pub mod error;
pub mod entities;
pub mod confidence;
pub mod sandbox;

// Re-export commonly used types
pub use entities::{BibliographicRecord, RecordSource, StudyType, WebResult, WebSourceType};
pub use error::{EvidentiaError, Result};
