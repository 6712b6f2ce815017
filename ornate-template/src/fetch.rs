//! Template fetchers: where remote template markup comes from.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::FetchError;

/// Resolves a template identifier to its markup.
#[async_trait(?Send)]
pub trait Fetcher {
    async fn fetch(&self, id: &str) -> Result<String, FetchError>;
}

/// Serves templates from an in-memory table. Counts calls, and can delay
/// each response to simulate a slow network.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    templates: RefCell<HashMap<String, String>>,
    calls: Cell<usize>,
    delay: Option<Duration>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, id: &str, markup: &str) -> Self {
        self.insert(id, markup);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn insert(&self, id: &str, markup: &str) {
        self.templates
            .borrow_mut()
            .insert(id.to_string(), markup.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

#[async_trait(?Send)]
impl Fetcher for MemoryFetcher {
    async fn fetch(&self, id: &str) -> Result<String, FetchError> {
        self.calls.set(self.calls.get() + 1);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.templates
            .borrow()
            .get(id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(id.to_string()))
    }
}

/// Reads templates from files under a base directory.
#[derive(Debug, Clone)]
pub struct FileFetcher {
    base_dir: PathBuf,
}

impl FileFetcher {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn resolve(&self, id: &str) -> PathBuf {
        self.base_dir.join(id.trim_start_matches('/'))
    }
}

#[async_trait(?Send)]
impl Fetcher for FileFetcher {
    async fn fetch(&self, id: &str) -> Result<String, FetchError> {
        let path = self.resolve(id);
        debug!(path = %path.display(), "reading template file");
        tokio::fs::read_to_string(&path).await.map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => FetchError::NotFound(id.to_string()),
            _ => FetchError::Io(format!("{}: {err}", path.display())),
        })
    }
}

/// Fetches templates over HTTP, asking intermediaries for a long-lived
/// cached copy.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: Option<String>,
}

#[cfg(feature = "http")]
impl HttpFetcher {
    const CACHE_CONTROL: &'static str = "max-stale=31536000";

    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.trim_end_matches('/').to_string());
        self
    }

    fn url(&self, id: &str) -> String {
        match &self.base_url {
            Some(base) if !id.contains("://") => format!("{base}/{}", id.trim_start_matches('/')),
            _ => id.to_string(),
        }
    }
}

#[cfg(feature = "http")]
impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "http")]
#[async_trait(?Send)]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, id: &str) -> Result<String, FetchError> {
        let url = self.url(id);
        debug!(%url, "fetching template");
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::CACHE_CONTROL, Self::CACHE_CONTROL)
            .send()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(id.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                url,
            });
        }
        response
            .text()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))
    }
}
