// HTTP content provider: reqwest for transport, scraper for extraction.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use reqwest::redirect::Policy;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::config::FetchSection;
use crate::error::{AuditError, FetchError, ResolveError};
use crate::resolve::{Hop, HopFetcher};

use super::{ContentFetcher, EnrichedContent};

/// Fetches pages over HTTP and extracts title, visible text, outbound links,
/// and `<meta>` pairs. Holds two clients: one that follows redirects for
/// content fetches, and one that never follows them for single-hop probes.
#[derive(Debug)]
pub struct HttpFetcher {
    client: Client,
    hop_client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchSection) -> crate::error::Result<Self> {
        // reqwest is built with rustls' no-provider feature; a process-wide
        // crypto provider must be installed before any client is built.
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| AuditError::Fetch(FetchError::Network(e.to_string())))?;
        let hop_client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(Policy::none())
            .build()
            .map_err(|e| AuditError::Fetch(FetchError::Network(e.to_string())))?;
        Ok(Self { client, hop_client })
    }
}

#[async_trait::async_trait]
#[allow(clippy::unnecessary_literal_bound)]
impl ContentFetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, url: &str) -> crate::error::Result<EnrichedContent> {
        let started = Instant::now();
        let parsed = Url::parse(url).map_err(|e| {
            AuditError::Fetch(FetchError::InvalidUrl {
                url: url.to_string(),
                message: e.to_string(),
            })
        })?;

        debug!(url, "fetching page content");
        let resp = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| AuditError::Fetch(FetchError::Network(e.to_string())))?;

        if !resp.status().is_success() {
            return Err(AuditError::Fetch(FetchError::Status {
                status: resp.status().as_u16(),
                url: url.to_string(),
            }));
        }

        // Links resolve against the URL the response actually came from, so
        // a redirected fetch does not produce links relative to the old URL.
        let final_url = resp.url().clone();
        let body = resp
            .text()
            .await
            .map_err(|e| AuditError::Fetch(FetchError::Network(e.to_string())))?;

        let extracted = extract_content(&body, &final_url);
        Ok(EnrichedContent {
            html: Some(body),
            text: extracted.text,
            title: extracted.title,
            links: extracted.links,
            metadata: extracted.metadata,
            provider: "http".to_string(),
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
    }
}

#[async_trait::async_trait]
impl HopFetcher for HttpFetcher {
    async fn fetch_hop(&self, url: &str) -> crate::error::Result<Hop> {
        let resp = self
            .hop_client
            .get(url)
            .send()
            .await
            .map_err(|e| AuditError::Resolve(ResolveError::Network(e.to_string())))?;
        let status = resp.status().as_u16();
        let location = resp
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Ok(Hop { status, location })
    }
}

struct Extracted {
    title: Option<String>,
    text: Option<String>,
    links: Vec<String>,
    metadata: HashMap<String, serde_json::Value>,
}

// Parsing is synchronous on purpose: scraper's DOM is not Send, so it must
// never live across an await point.
fn extract_content(html: &str, base_url: &Url) -> Extracted {
    let doc = Html::parse_document(html);
    let title_sel = Selector::parse("title").unwrap();
    let body_sel = Selector::parse("body").unwrap();
    let link_sel = Selector::parse("a[href]").unwrap();
    let meta_sel = Selector::parse("meta[name]").unwrap();

    let title = doc
        .select(&title_sel)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty());

    let text = doc
        .select(&body_sel)
        .next()
        .map(|body| collapse_whitespace(&body.text().collect::<Vec<_>>().join(" ")))
        .filter(|t| !t.is_empty());

    let mut links = Vec::new();
    let mut seen = HashSet::new();
    for el in doc.select(&link_sel) {
        if let Some(resolved) = el.value().attr("href").and_then(|h| resolve_link(base_url, h)) {
            if seen.insert(resolved.clone()) {
                links.push(resolved);
            }
        }
    }

    let mut metadata = HashMap::new();
    for el in doc.select(&meta_sel) {
        if let (Some(name), Some(content)) = (el.value().attr("name"), el.value().attr("content")) {
            metadata.insert(
                name.to_string(),
                serde_json::Value::String(content.to_string()),
            );
        }
    }

    Extracted {
        title,
        text,
        links,
        metadata,
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolves an href against the page URL. Non-navigational schemes and
/// same-page fragments yield `None`; fragments are stripped from the rest.
fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
    {
        return None;
    }
    let mut resolved = base.join(href).ok()?;
    resolved.set_fragment(None);
    Some(resolved.to_string())
}
