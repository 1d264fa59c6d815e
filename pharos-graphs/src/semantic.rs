// Semantic distance, topical clustering, and knowledge-base issue detection.
//
// Distance math intentionally casts int↔float.
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]

use std::collections::{HashMap, HashSet, VecDeque};

use rayon::prelude::*;
use tracing::info;

use crate::types::{
    ClusterId, EavTriple, EntityCluster, GraphIssue, KnowledgeGraphAnalysis, PageId, PageNode,
    SemanticDistanceEntry, round2,
};

/// Attribute categories a complete core-segment page is expected to cover.
const CORE_EXPECTED_ATTRIBUTES: [&str; 5] =
    ["definition", "types", "benefits", "process", "examples"];

/// Attributes that legitimately carry several values per entity.
const MULTI_VALUED_ATTRIBUTES: [&str; 2] = ["type", "category"];

// ── Thresholds ─────────────────────────────────────────────────────

/// Tuning knobs for the semantic engine. Callers layer their own
/// configuration on top of these defaults.
#[derive(Debug, Clone, Copy)]
pub struct SemanticThresholds {
    /// Pairs closer than this are clustered together.
    pub cluster_distance: f64,
    /// Lower bound of the productive linking band.
    pub link_min: f64,
    /// Upper bound of the productive linking band.
    pub link_max: f64,
    /// Clusters with cohesion below this are flagged weak.
    pub weak_cohesion: f64,
    /// Singletons extracted below this confidence count as orphans.
    pub orphan_confidence: f64,
}

impl Default for SemanticThresholds {
    fn default() -> Self {
        Self {
            cluster_distance: 0.5,
            link_min: 0.3,
            link_max: 0.7,
            weak_cohesion: 0.3,
            orphan_confidence: 0.5,
        }
    }
}

// ── Distance formula ───────────────────────────────────────────────

/// Jaccard similarity over two entity sets. Two empty sets are
/// identical (1.0); one empty set shares nothing (0.0).
fn jaccard_similarity(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let set_a: HashSet<&str> = a.iter().map(String::as_str).collect();
    let set_b: HashSet<&str> = b.iter().map(String::as_str).collect();
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    intersection as f64 / union as f64
}

/// Context multiplier: base 0.5, plus bonuses for shared segment and
/// matching site-level signals, capped at 1.0.
fn context_weight(a: &PageNode, b: &PageNode) -> f64 {
    let mut weight: f64 = 0.5;
    if a.segment.eq_ignore_ascii_case(&b.segment) {
        weight += 0.2;
    }
    if a.matches_central_entity && b.matches_central_entity {
        weight += 0.15;
    }
    if a.matches_source_context && b.matches_source_context {
        weight += 0.15;
    }
    weight.min(1.0)
}

/// Co-occurrence factor: how much of the smaller entity set the pair
/// shares. Exactly 0.5 when either set is empty.
fn co_occurrence(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.5;
    }

    let set_a: HashSet<&str> = a.iter().map(String::as_str).collect();
    let shared = b.iter().filter(|e| set_a.contains(e.as_str())).count();
    let min_len = a.len().min(b.len());
    0.5 + 0.5 * (shared as f64 / min_len as f64)
}

/// Semantic distance between two pages: 0.0 = same topic, 1.0 = unrelated.
/// Symmetric in its arguments.
pub fn semantic_distance(a: &PageNode, b: &PageNode) -> f64 {
    let similarity = jaccard_similarity(&a.entities, &b.entities)
        * context_weight(a, b)
        * co_occurrence(&a.entities, &b.entities);
    1.0 - similarity
}

/// Whether linking the pair is productive: close enough to be relevant,
/// far enough not to compete.
pub fn should_link(distance: f64, thresholds: &SemanticThresholds) -> bool {
    distance >= thresholds.link_min && distance <= thresholds.link_max
}

fn link_rationale(distance: f64, thresholds: &SemanticThresholds) -> String {
    if distance < thresholds.link_min {
        "too similar, cannibalization risk".to_string()
    } else if distance > thresholds.link_max {
        "too different, linking dilutes relevance".to_string()
    } else {
        "productive linking distance".to_string()
    }
}

// ── Distance matrix ────────────────────────────────────────────────

/// Pairwise distances for every unordered page pair, computed in
/// parallel. No self-pairs; each pair appears once.
pub fn distance_matrix(
    pages: &[PageNode],
    thresholds: &SemanticThresholds,
) -> Vec<SemanticDistanceEntry> {
    let mut pairs = Vec::with_capacity(pages.len() * pages.len().saturating_sub(1) / 2);
    for i in 0..pages.len() {
        for j in (i + 1)..pages.len() {
            pairs.push((i, j));
        }
    }

    pairs
        .into_par_iter()
        .map(|(i, j)| {
            let distance = semantic_distance(&pages[i], &pages[j]);
            SemanticDistanceEntry {
                a: pages[i].id,
                b: pages[j].id,
                distance,
                should_link: should_link(distance, thresholds),
                rationale: link_rationale(distance, thresholds),
            }
        })
        .collect()
}

// ── Clustering ─────────────────────────────────────────────────────

/// Group pages into topical clusters: adjacency below the cluster
/// distance, connected components by breadth-first traversal. Only
/// multi-member components are returned; everything else is an
/// implicit singleton.
pub fn cluster_pages(
    pages: &[PageNode],
    distances: &[SemanticDistanceEntry],
    thresholds: &SemanticThresholds,
) -> Vec<EntityCluster> {
    let index_of: HashMap<PageId, usize> =
        pages.iter().enumerate().map(|(i, p)| (p.id, i)).collect();

    // Undirected adjacency over close pairs
    let mut adj: HashMap<usize, Vec<usize>> = HashMap::new();
    let mut pair_distance: HashMap<(usize, usize), f64> = HashMap::new();
    for entry in distances {
        let (Some(&i), Some(&j)) = (index_of.get(&entry.a), index_of.get(&entry.b)) else {
            continue;
        };
        pair_distance.insert((i.min(j), i.max(j)), entry.distance);
        if entry.distance < thresholds.cluster_distance {
            adj.entry(i).or_default().push(j);
            adj.entry(j).or_default().push(i);
        }
    }

    let mut visited = vec![false; pages.len()];
    let mut clusters = Vec::new();

    for start in 0..pages.len() {
        if visited[start] {
            continue;
        }
        visited[start] = true;

        let mut component = vec![start];
        let mut queue = VecDeque::from([start]);
        while let Some(node) = queue.pop_front() {
            if let Some(neighbors) = adj.get(&node) {
                for &next in neighbors {
                    if !visited[next] {
                        visited[next] = true;
                        component.push(next);
                        queue.push_back(next);
                    }
                }
            }
        }

        if component.len() < 2 {
            continue;
        }
        component.sort_unstable();

        clusters.push(EntityCluster {
            id: ClusterId(clusters.len() as i64),
            central_entity: most_frequent_entity(pages, &component),
            members: component.iter().map(|&i| pages[i].id).collect(),
            cohesion: cluster_cohesion(&component, &pair_distance),
        });
    }

    clusters
}

/// Most frequent entity across the component's pages; ties break
/// lexicographically for determinism.
fn most_frequent_entity(pages: &[PageNode], component: &[usize]) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for &i in component {
        for entity in &pages[i].entities {
            *counts.entry(entity.as_str()).or_default() += 1;
        }
    }

    counts
        .into_iter()
        .max_by(|(ea, ca), (eb, cb)| ca.cmp(cb).then(eb.cmp(ea)))
        .map(|(entity, _)| entity.to_string())
        .unwrap_or_default()
}

/// 1 minus the mean pairwise distance inside the component. 1.0 for
/// singletons.
fn cluster_cohesion(component: &[usize], pair_distance: &HashMap<(usize, usize), f64>) -> f64 {
    if component.len() < 2 {
        return 1.0;
    }

    let mut total = 0.0;
    let mut count = 0u32;
    for (k, &i) in component.iter().enumerate() {
        for &j in &component[k + 1..] {
            if let Some(&d) = pair_distance.get(&(i.min(j), i.max(j))) {
                total += d;
                count += 1;
            }
        }
    }

    if count == 0 {
        return 1.0;
    }
    round2(1.0 - total / f64::from(count))
}

// ── Issue detection ────────────────────────────────────────────────

/// Pages outside every multi-member cluster that carry no usable
/// entity signal: an empty entity set, or extraction below the
/// confidence floor.
fn orphan_pages(
    pages: &[PageNode],
    clusters: &[EntityCluster],
    thresholds: &SemanticThresholds,
) -> Vec<PageId> {
    let clustered: HashSet<PageId> = clusters
        .iter()
        .flat_map(|c| c.members.iter().copied())
        .collect();

    pages
        .iter()
        .filter(|p| !clustered.contains(&p.id))
        .filter(|p| p.entities.is_empty() || p.extraction_confidence < thresholds.orphan_confidence)
        .map(|p| p.id)
        .collect()
}

fn detect_issues(
    pages: &[PageNode],
    triples: &[EavTriple],
    clusters: &[EntityCluster],
    thresholds: &SemanticThresholds,
) -> Vec<GraphIssue> {
    let mut issues = Vec::new();

    // Conflicting values for single-valued attributes
    let mut values_by_pair: HashMap<(&str, &str), HashSet<&str>> = HashMap::new();
    for triple in triples {
        values_by_pair
            .entry((triple.entity.as_str(), triple.attribute.as_str()))
            .or_default()
            .insert(triple.value.as_str());
    }
    let mut inconsistent: Vec<_> = values_by_pair
        .into_iter()
        .filter(|((_, attribute), values)| {
            values.len() > 1
                && !MULTI_VALUED_ATTRIBUTES
                    .iter()
                    .any(|m| attribute.eq_ignore_ascii_case(m))
        })
        .collect();
    inconsistent
        .sort_by_key(|((entity, attribute), _)| (entity.to_string(), attribute.to_string()));
    for ((entity, attribute), values) in inconsistent {
        let mut values: Vec<String> = values.into_iter().map(String::from).collect();
        values.sort_unstable();
        issues.push(GraphIssue::InconsistentAttribute {
            entity: entity.to_string(),
            attribute: attribute.to_string(),
            values,
        });
    }

    // Entities that appear on pages but have zero knowledge-base facts
    let known: HashSet<&str> = triples.iter().map(|t| t.entity.as_str()).collect();
    let mut isolated: Vec<&str> = pages
        .iter()
        .flat_map(|p| p.entities.iter().map(String::as_str))
        .filter(|e| !known.contains(e))
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    isolated.sort_unstable();
    for entity in isolated {
        issues.push(GraphIssue::IsolatedEntity {
            entity: entity.to_string(),
        });
    }

    // Clusters that barely hold together
    for cluster in clusters {
        if cluster.cohesion < thresholds.weak_cohesion {
            issues.push(GraphIssue::WeakCluster {
                cluster: cluster.id,
                cohesion: cluster.cohesion,
            });
        }
    }

    // Core pages missing most of the expected attribute coverage
    let mut attributes_by_entity: HashMap<&str, HashSet<String>> = HashMap::new();
    for triple in triples {
        attributes_by_entity
            .entry(triple.entity.as_str())
            .or_default()
            .insert(triple.attribute.to_lowercase());
    }
    for page in pages.iter().filter(|p| p.is_core()) {
        let covered: HashSet<&str> = page
            .entities
            .iter()
            .filter_map(|e| attributes_by_entity.get(e.as_str()))
            .flat_map(|attrs| attrs.iter().map(String::as_str))
            .collect();
        let missing: Vec<String> = CORE_EXPECTED_ATTRIBUTES
            .iter()
            .filter(|a| !covered.contains(**a))
            .map(|a| (*a).to_string())
            .collect();
        if missing.len() >= 3 {
            issues.push(GraphIssue::MissingCoreAttributes {
                page: page.id,
                missing,
            });
        }
    }

    issues
}

// ── Full analysis ──────────────────────────────────────────────────

/// Run the complete semantic pass: distance matrix, clustering, orphan
/// detection, and knowledge-base issues.
pub fn analyze(
    pages: &[PageNode],
    triples: &[EavTriple],
    thresholds: &SemanticThresholds,
) -> KnowledgeGraphAnalysis {
    let distances = distance_matrix(pages, thresholds);
    let clusters = cluster_pages(pages, &distances, thresholds);
    let orphans = orphan_pages(pages, &clusters, thresholds);
    let issues = detect_issues(pages, triples, clusters.as_slice(), thresholds);

    info!(
        pages = pages.len(),
        pairs = distances.len(),
        clusters = clusters.len(),
        orphans = orphans.len(),
        issues = issues.len(),
        "Semantic analysis complete"
    );

    KnowledgeGraphAnalysis {
        clusters,
        distances,
        orphan_pages: orphans,
        issues,
    }
}

// ── Tests ──────────────────────────────────────────────────────────
