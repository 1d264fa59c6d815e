// Internal link graph construction and authority-flow analysis.
#![allow(clippy::cast_precision_loss)]

use std::collections::{HashMap, HashSet};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use crate::types::{
    ClusterRole, DilutionLevel, DilutionRisk, FlowViolation, LinkEdge, LinkFlowAnalysis, LinkKind,
    PageBrief, PageId, PageNode, TopicalClass, ViolationKind, ViolationSeverity, normalize_url,
};

// ── Thresholds ─────────────────────────────────────────────────────

/// Tuning knobs for link-flow classification.
#[derive(Debug, Clone, Copy)]
pub struct FlowThresholds {
    /// Outbound edge count above which a page is flagged.
    pub excessive_outbound: usize,
    /// Outbound count above which dilution is High.
    pub dilution_high: usize,
    /// Outbound count above which dilution is at least Medium.
    pub dilution_medium: usize,
    /// Outbound count above which dilution is at least Low.
    pub dilution_low: usize,
    /// Share of outbound links to one target that promotes Low to Medium.
    pub top_target_share: f64,
}

impl Default for FlowThresholds {
    fn default() -> Self {
        Self {
            excessive_outbound: 20,
            dilution_high: 50,
            dilution_medium: 25,
            dilution_low: 10,
            top_target_share: 0.30,
        }
    }
}

// ── Graph construction ─────────────────────────────────────────────

/// The site's internal link graph: a petgraph `DiGraph` with
/// `PageId` ↔ `NodeIndex` mapping and anchor-carrying edges.
///
/// Edge weights index into `edges`, so every graph edge can be traced
/// back to its anchor text and kind.
#[derive(Debug)]
pub struct LinkGraph {
    pub graph: DiGraph<PageId, usize>,
    pub page_to_index: HashMap<PageId, NodeIndex>,
    pub index_to_page: HashMap<NodeIndex, PageId>,
    pub edges: Vec<LinkEdge>,
}

impl LinkGraph {
    /// Build the graph from pages and their content briefs.
    ///
    /// Contextual edges come from brief bridge links whose target URL
    /// matches a known page after normalization; targets that match
    /// nothing are external or unpublished and are skipped, not errors.
    /// Hierarchical edges are implied by each page's parent, anchored
    /// with the child's title.
    pub fn build(pages: &[PageNode], briefs: &[PageBrief]) -> Self {
        let mut graph = DiGraph::<PageId, usize>::with_capacity(pages.len(), briefs.len());
        let mut page_to_index = HashMap::with_capacity(pages.len());
        let mut index_to_page = HashMap::with_capacity(pages.len());

        for page in pages {
            let idx = graph.add_node(page.id);
            page_to_index.insert(page.id, idx);
            index_to_page.insert(idx, page.id);
        }

        let by_url: HashMap<String, PageId> = pages
            .iter()
            .map(|p| (normalize_url(&p.url), p.id))
            .collect();
        let title_of: HashMap<PageId, &str> =
            pages.iter().map(|p| (p.id, p.title.as_str())).collect();

        let mut edges: Vec<LinkEdge> = Vec::new();
        let mut add_edge = |graph: &mut DiGraph<PageId, usize>, edge: LinkEdge| {
            let (Some(&src), Some(&tgt)) = (
                page_to_index.get(&edge.source),
                page_to_index.get(&edge.target),
            ) else {
                return;
            };
            graph.add_edge(src, tgt, edges.len());
            edges.push(edge);
        };

        for brief in briefs {
            for section in &brief.bridge {
                for link in &section.links {
                    let Some(&target) = by_url.get(&normalize_url(&link.target_url)) else {
                        debug!(target = %link.target_url, "bridge link target unknown, skipping");
                        continue;
                    };
                    add_edge(
                        &mut graph,
                        LinkEdge {
                            source: brief.page,
                            target,
                            anchor: link.anchor.clone(),
                            kind: LinkKind::Contextual,
                        },
                    );
                }
            }
        }

        for page in pages {
            if let Some(parent) = page.parent {
                add_edge(
                    &mut graph,
                    LinkEdge {
                        source: parent,
                        target: page.id,
                        anchor: title_of.get(&page.id).map(|t| (*t).to_string()).unwrap_or_default(),
                        kind: LinkKind::Hierarchical,
                    },
                );
            }
        }

        Self {
            graph,
            page_to_index,
            index_to_page,
            edges,
        }
    }

    /// Number of edges pointing at the page (counts parallel edges).
    pub fn incoming(&self, page: PageId) -> usize {
        self.page_to_index
            .get(&page)
            .map_or(0, |&idx| self.graph.edges_directed(idx, Direction::Incoming).count())
    }

    /// Number of edges leaving the page (counts parallel edges).
    pub fn outgoing(&self, page: PageId) -> usize {
        self.page_to_index
            .get(&page)
            .map_or(0, |&idx| self.graph.edges_directed(idx, Direction::Outgoing).count())
    }

    /// Whether any edge runs source → target.
    pub fn links_to(&self, source: PageId, target: PageId) -> bool {
        match (self.page_to_index.get(&source), self.page_to_index.get(&target)) {
            (Some(&s), Some(&t)) => self.graph.find_edge(s, t).is_some(),
            _ => false,
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

// ── Flow analysis ──────────────────────────────────────────────────

/// Detect authority-flow violations and dilution risk across the site.
pub fn analyze_flow(
    pages: &[PageNode],
    graph: &LinkGraph,
    thresholds: &FlowThresholds,
) -> LinkFlowAnalysis {
    let by_id: HashMap<PageId, &PageNode> = pages.iter().map(|p| (p.id, p)).collect();
    let mut violations = Vec::new();

    // Monetization → informational links push authority the wrong way.
    let mut reverse_seen = HashSet::new();
    for edge in &graph.edges {
        let (Some(source), Some(target)) = (by_id.get(&edge.source), by_id.get(&edge.target))
        else {
            continue;
        };
        if source.class == TopicalClass::Monetization
            && target.class == TopicalClass::Informational
            && reverse_seen.insert((edge.source, edge.target))
        {
            violations.push(FlowViolation {
                kind: ViolationKind::ReverseFlow,
                source: edge.source,
                target: Some(edge.target),
                severity: ViolationSeverity::Critical,
                recommendation: format!(
                    "Authority should flow toward monetization pages; link from {} to {} instead",
                    target.url, source.url
                ),
            });
        }
    }

    // Non-pillar pages nobody links to are unreachable by authority.
    for page in pages {
        if page.role != ClusterRole::Pillar && graph.incoming(page.id) == 0 {
            violations.push(FlowViolation {
                kind: ViolationKind::Orphaned,
                source: page.id,
                target: None,
                severity: ViolationSeverity::Critical,
                recommendation: format!("Add at least one internal link pointing at {}", page.url),
            });
        }
    }

    // Pillars whose children never link back receive no cluster support.
    for pillar in pages.iter().filter(|p| p.role == ClusterRole::Pillar) {
        let children: Vec<&PageNode> = pages
            .iter()
            .filter(|p| p.parent == Some(pillar.id))
            .collect();
        if !children.is_empty() && !children.iter().any(|c| graph.links_to(c.id, pillar.id)) {
            violations.push(FlowViolation {
                kind: ViolationKind::NoClusterSupport,
                source: pillar.id,
                target: None,
                severity: ViolationSeverity::Warning,
                recommendation: format!(
                    "Child pages should link back to their pillar {}",
                    pillar.url
                ),
            });
        }
    }

    // Pages spraying links everywhere dilute every single one.
    for page in pages {
        let outbound = graph.outgoing(page.id);
        if outbound > thresholds.excessive_outbound {
            violations.push(FlowViolation {
                kind: ViolationKind::ExcessiveOutbound,
                source: page.id,
                target: None,
                severity: ViolationSeverity::Warning,
                recommendation: format!(
                    "Reduce outbound links on {} ({outbound} against a limit of {})",
                    page.url, thresholds.excessive_outbound
                ),
            });
        }
    }

    let critical = violations
        .iter()
        .filter(|v| v.severity == ViolationSeverity::Critical)
        .count();
    let warning = violations.len() - critical;
    let flow_score = (100.0 - 15.0 * critical as f64 - 5.0 * warning as f64).max(0.0);

    let dilution = pages
        .iter()
        .filter_map(|page| classify_dilution(page, graph, thresholds))
        .collect();

    LinkFlowAnalysis {
        violations,
        flow_score,
        dilution,
        pages_analyzed: pages.len(),
    }
}

/// Dilution classification for one page. Pages below every threshold
/// carry no risk and produce no entry.
fn classify_dilution(
    page: &PageNode,
    graph: &LinkGraph,
    thresholds: &FlowThresholds,
) -> Option<DilutionRisk> {
    let total = graph.outgoing(page.id);
    if total == 0 {
        return None;
    }

    let mut per_target: HashMap<PageId, usize> = HashMap::new();
    for edge in graph.edges.iter().filter(|e| e.source == page.id) {
        *per_target.entry(edge.target).or_default() += 1;
    }
    let top = per_target.values().copied().max().unwrap_or(0);
    let top_target_share = top as f64 / total as f64;

    let level = if total > thresholds.dilution_high {
        DilutionLevel::High
    } else if total > thresholds.dilution_medium {
        DilutionLevel::Medium
    } else if total > thresholds.dilution_low {
        // A dominant target promotes an otherwise-Low page to Medium.
        if top_target_share > thresholds.top_target_share {
            DilutionLevel::Medium
        } else {
            DilutionLevel::Low
        }
    } else {
        DilutionLevel::None
    };

    if level == DilutionLevel::None {
        return None;
    }
    Some(DilutionRisk {
        page: page.id,
        level,
        total_outbound: total,
        top_target_share,
    })
}

// ── Tests ──────────────────────────────────────────────────────────
