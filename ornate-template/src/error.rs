use thiserror::Error;

/// Failure reported by a [`Fetcher`](crate::fetch::Fetcher).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("template `{0}` not found")]
    NotFound(String),
    #[error("i/o error: {0}")]
    Io(String),
    #[error("http status {status} for {url}")]
    Http { status: u16, url: String },
    #[error("transport error: {0}")]
    Transport(String),
}

/// A template could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to load template `{id}`")]
pub struct LoadError {
    pub id: String,
    #[source]
    pub source: FetchError,
}

impl LoadError {
    pub fn new(id: &str, source: FetchError) -> Self {
        Self {
            id: id.to_string(),
            source,
        }
    }
}
