//! Content acquisition with provider fallback.
//!
//! Every audit starts by enriching the target URL into an
//! [`EnrichedContent`] bundle. Providers implement [`ContentFetcher`]; the
//! [`FallbackFetcher`] runs them in order until one succeeds, so a flaky
//! primary source degrades to the next provider instead of failing the run.

pub mod http;

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AuditError, FetchError};

/// A content field a rule can declare as required input. Rules whose
/// requirements are not met by the fetched content are skipped rather than
/// failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKey {
    Html,
    Text,
    Title,
    Links,
    Metadata,
}

impl ContentKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Text => "text",
            Self::Title => "title",
            Self::Links => "links",
            Self::Metadata => "metadata",
        }
    }
}

impl std::fmt::Display for ContentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything a fetch provider recovered for one URL.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichedContent {
    pub html: Option<String>,
    pub text: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// Name of the provider that produced this bundle.
    pub provider: String,
    pub duration_ms: u64,
}

impl EnrichedContent {
    /// Whether a field is usable. Empty strings and empty collections count
    /// as absent, so rules gate on real data rather than placeholders.
    pub fn has(&self, key: ContentKey) -> bool {
        match key {
            ContentKey::Html => self.html.as_deref().is_some_and(|s| !s.is_empty()),
            ContentKey::Text => self.text.as_deref().is_some_and(|s| !s.is_empty()),
            ContentKey::Title => self.title.as_deref().is_some_and(|s| !s.is_empty()),
            ContentKey::Links => !self.links.is_empty(),
            ContentKey::Metadata => !self.metadata.is_empty(),
        }
    }
}

/// Common interface for content fetch providers.
#[async_trait::async_trait]
pub trait ContentFetcher: Send + Sync + std::fmt::Debug {
    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Fetch and enrich a single URL.
    async fn fetch(&self, url: &str) -> crate::error::Result<EnrichedContent>;
}

/// Runs registered providers in order until one succeeds.
#[derive(Debug, Default)]
pub struct FallbackFetcher {
    providers: Vec<Arc<dyn ContentFetcher>>,
}

impl FallbackFetcher {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn ContentFetcher>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn register(&mut self, provider: Arc<dyn ContentFetcher>) {
        self.providers.push(provider);
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Fetches `url`, trying the provider named by `preferred` first (when it
    /// is registered), then every other provider in registration order.
    /// Each failure is logged and the next provider is tried; only when all
    /// providers fail does an error surface.
    pub async fn fetch(
        &self,
        url: &str,
        preferred: Option<&str>,
    ) -> crate::error::Result<EnrichedContent> {
        let mut ordered: Vec<&Arc<dyn ContentFetcher>> = Vec::with_capacity(self.providers.len());
        if let Some(name) = preferred {
            if let Some(provider) = self.providers.iter().find(|p| p.name() == name) {
                ordered.push(provider);
            }
        }
        for provider in &self.providers {
            if preferred.is_some_and(|name| name == provider.name()) {
                continue;
            }
            ordered.push(provider);
        }

        for provider in ordered {
            match provider.fetch(url).await {
                Ok(content) => {
                    debug!(
                        provider = provider.name(),
                        url,
                        duration_ms = content.duration_ms,
                        "content fetched"
                    );
                    return Ok(content);
                }
                Err(e) => {
                    warn!(provider = provider.name(), url, error = %e, "fetch provider failed");
                }
            }
        }
        Err(AuditError::Fetch(FetchError::AllProvidersFailed(
            url.to_string(),
        )))
    }
}
