use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvidentiaError {
    #[error("HTTP request error: {0}")]
    Http(reqwest::Error),

    #[error("{source_name} returned HTTP {status}")]
    Status { source_name: &'static str, status: u16 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("XML parse error: {0}")]
    Xml(String),

    #[error("Malformed item: {0}")]
    MalformedItem(String),

    #[error("{0} timed out after {1}ms")]
    Timeout(String, u64),

    #[error("Network capabilities capped: {0}")]
    Security(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, EvidentiaError>;

// Request URLs can carry API keys in the query string, and these errors end up in logs.
impl From<reqwest::Error> for EvidentiaError {
    fn from(e: reqwest::Error) -> Self {
        EvidentiaError::Http(e.without_url())
    }
}
