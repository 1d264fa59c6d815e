// Site-wide composite score: link-count health, authority flow, and
// title n-gram consistency, weighted 40/40/20.
#![allow(clippy::cast_precision_loss)]

use std::collections::HashMap;

use tracing::info;

use crate::types::{
    DilutionLevel, LinkFlowAnalysis, PageNode, SiteWideAuditResult, ViolationKind, round2,
};

const LINK_WEIGHT: f64 = 0.4;
const FLOW_WEIGHT: f64 = 0.4;
const NGRAM_WEIGHT: f64 = 0.2;

/// How many of the most repeated title bigrams define the site's voice.
const TOP_BIGRAMS: usize = 3;

/// Compute the site-wide composite from an existing flow analysis.
pub fn site_wide_audit(pages: &[PageNode], flow: &LinkFlowAnalysis) -> SiteWideAuditResult {
    let link_score = link_count_score(pages, flow);
    let ngram_score = ngram_consistency_score(pages);
    let score = round2(
        link_score * LINK_WEIGHT + flow.flow_score * FLOW_WEIGHT + ngram_score * NGRAM_WEIGHT,
    );

    info!(
        score,
        link_score,
        flow_score = flow.flow_score,
        ngram_score,
        "Site-wide audit complete"
    );

    SiteWideAuditResult {
        score,
        link_score,
        flow_score: flow.flow_score,
        ngram_score,
    }
}

/// Share of pages with a healthy link profile: no High or Medium
/// dilution and no excessive-outbound flag.
fn link_count_score(pages: &[PageNode], flow: &LinkFlowAnalysis) -> f64 {
    if pages.is_empty() {
        return 100.0;
    }

    let mut unhealthy: std::collections::HashSet<_> = flow
        .dilution
        .iter()
        .filter(|d| matches!(d.level, DilutionLevel::High | DilutionLevel::Medium))
        .map(|d| d.page)
        .collect();
    for violation in &flow.violations {
        if violation.kind == ViolationKind::ExcessiveOutbound {
            unhealthy.insert(violation.source);
        }
    }

    let healthy = pages.len() - pages.iter().filter(|p| unhealthy.contains(&p.id)).count();
    round2(100.0 * healthy as f64 / pages.len() as f64)
}

/// Share of pages whose title carries one of the site's top recurring
/// bigrams. A site with one page, or with no repeated bigram at all,
/// has nothing to be inconsistent with and scores 100.
fn ngram_consistency_score(pages: &[PageNode]) -> f64 {
    if pages.len() <= 1 {
        return 100.0;
    }

    let mut bigram_counts: HashMap<String, usize> = HashMap::new();
    let titles: Vec<Vec<String>> = pages
        .iter()
        .map(|p| {
            p.title
                .to_lowercase()
                .split_whitespace()
                .map(ToString::to_string)
                .collect()
        })
        .collect();

    for words in &titles {
        for pair in words.windows(2) {
            *bigram_counts.entry(format!("{} {}", pair[0], pair[1])).or_default() += 1;
        }
    }

    let mut repeated: Vec<(&str, usize)> = bigram_counts
        .iter()
        .filter(|&(_, &count)| count >= 2)
        .map(|(bigram, &count)| (bigram.as_str(), count))
        .collect();
    if repeated.is_empty() {
        return 100.0;
    }
    repeated.sort_by(|(ba, ca), (bb, cb)| cb.cmp(ca).then(ba.cmp(bb)));
    let top: Vec<&str> = repeated.iter().take(TOP_BIGRAMS).map(|(b, _)| *b).collect();

    let consistent = titles
        .iter()
        .filter(|words| {
            words
                .windows(2)
                .any(|pair| top.contains(&format!("{} {}", pair[0], pair[1]).as_str()))
        })
        .count();
    round2(100.0 * consistent as f64 / pages.len() as f64)
}

// ── Tests ──────────────────────────────────────────────────────────
