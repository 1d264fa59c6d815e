//! Redirect chain walker.
//!
//! Follows a URL hop by hop through an injected single-hop fetcher, recording
//! every visited URL, and reports loops, server errors, and overly long
//! chains. The walker never follows a redirect itself; the [`HopFetcher`]
//! implementation decides how a single request is made.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::config::RedirectsSection;
use crate::error::Result;

/// A single response observed while walking a chain: the HTTP status and the
/// raw `Location` header, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hop {
    pub status: u16,
    pub location: Option<String>,
}

/// Fetches exactly one hop without following redirects.
#[async_trait::async_trait]
pub trait HopFetcher: Send + Sync {
    async fn fetch_hop(&self, url: &str) -> Result<Hop>;
}

/// A problem found while walking a redirect chain. The serialized `kind` tag
/// doubles as the finding rule id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RedirectIssue {
    RedirectLoop { url: String },
    RedirectServerError { url: String, status: u16 },
    RedirectChainLong { hops: u32 },
}

impl RedirectIssue {
    pub fn rule_id(&self) -> &'static str {
        match self {
            Self::RedirectLoop { .. } => "redirect-loop",
            Self::RedirectServerError { .. } => "redirect-server-error",
            Self::RedirectChainLong { .. } => "redirect-chain-long",
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::RedirectLoop { url } => {
                format!("Redirect chain revisits {url}")
            }
            Self::RedirectServerError { url, status } => {
                format!("Server error {status} at {url} while following redirects")
            }
            Self::RedirectChainLong { hops } => {
                format!("Redirect chain takes {hops} hops to settle")
            }
        }
    }
}

/// Outcome of a redirect walk. `chain` holds every visited URL in order,
/// starting URL included; a looped URL appears twice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectReport {
    pub chain: Vec<String>,
    pub redirect_hops: u32,
    pub final_status: Option<u16>,
    pub issues: Vec<RedirectIssue>,
}

/// Walks the redirect chain starting at `url`, making at most
/// `config.max_hops` requests.
///
/// Stops on the first loop, the first `5xx` response, any non-redirect
/// status, or a redirect that carries no usable `Location`. A missing or
/// unresolvable `Location` ends the walk without raising an issue.
pub async fn check_redirects(
    fetcher: &dyn HopFetcher,
    url: &str,
    config: &RedirectsSection,
) -> Result<RedirectReport> {
    let mut chain = vec![url.to_string()];
    let mut visited: HashSet<String> = HashSet::from([url.to_string()]);
    let mut issues = Vec::new();
    let mut redirect_hops: u32 = 0;
    let mut final_status = None;
    let mut current = url.to_string();

    for _ in 0..config.max_hops {
        let hop = fetcher.fetch_hop(&current).await?;
        final_status = Some(hop.status);

        if hop.status >= 500 {
            issues.push(RedirectIssue::RedirectServerError {
                url: current.clone(),
                status: hop.status,
            });
            break;
        }
        if !(300..400).contains(&hop.status) {
            break;
        }
        let Some(location) = hop.location else {
            debug!(url = %current, status = hop.status, "redirect without location header, stopping");
            break;
        };
        let Some(next) = resolve_location(&current, &location) else {
            debug!(url = %current, location = %location, "unresolvable redirect target, stopping");
            break;
        };
        redirect_hops += 1;
        chain.push(next.clone());
        if !visited.insert(next.clone()) {
            issues.push(RedirectIssue::RedirectLoop { url: next });
            break;
        }
        current = next;
    }

    if redirect_hops > config.long_chain_hops {
        issues.push(RedirectIssue::RedirectChainLong {
            hops: redirect_hops,
        });
    }

    debug!(
        url,
        hops = redirect_hops,
        issues = issues.len(),
        "redirect walk finished"
    );
    Ok(RedirectReport {
        chain,
        redirect_hops,
        final_status,
        issues,
    })
}

fn resolve_location(current: &str, location: &str) -> Option<String> {
    let base = Url::parse(current).ok()?;
    Some(base.join(location).ok()?.to_string())
}
