//! Phase and rule abstractions.
//!
//! A [`Rule`] is a stateless check over fetched content. A [`RulePhase`]
//! groups rules under one category name and scores them as a unit. The
//! pipeline looks phases up by name in a [`PhaseRegistry`], so callers
//! register whatever battery of checks fits their site.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use pharos_graphs::types::PageNode;
use pharos_graphs::{GraphError, normalize_url, round2, semantic_distance};

use crate::config::AuditSection;
use crate::error::AuditError;
use crate::fetch::{ContentKey, EnrichedContent};
use crate::types::{AuditRequest, Finding, PhaseResult, Severity};

/// A single stateless check. Rules declare the content fields they need;
/// a rule whose requirements are unmet is skipped, not failed.
pub trait Rule: Send + Sync + std::fmt::Debug {
    /// Stable rule id, e.g. `"heading-hierarchy"`.
    fn id(&self) -> &str;

    /// Content fields this rule reads.
    fn requires(&self) -> &[ContentKey] {
        &[]
    }

    /// Runs the check. An empty vec means the check passed.
    fn check(&self, request: &AuditRequest, content: &EnrichedContent) -> Vec<Finding>;
}

/// One category of checks executed during an audit.
#[async_trait::async_trait]
pub trait AuditPhase: Send + Sync + std::fmt::Debug {
    /// Phase name as listed in an `AuditRequest`.
    fn name(&self) -> &str;

    /// Executes the phase. The returned result carries `weight: 0.0`; the
    /// pipeline resolves and attaches the real weight.
    async fn execute(
        &self,
        request: &AuditRequest,
        content: Option<&EnrichedContent>,
    ) -> crate::error::Result<PhaseResult>;
}

/// Groups [`Rule`]s under a phase name.
///
/// Scoring counts each clean rule as one passed check and each finding as
/// one failed check, so `passed_checks + findings.len() == total_checks`
/// holds for every result. Zero runnable checks score 100.
#[derive(Debug)]
pub struct RulePhase {
    name: String,
    rules: Vec<Box<dyn Rule>>,
}

impl RulePhase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_rule(mut self, rule: Box<dyn Rule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

#[async_trait::async_trait]
impl AuditPhase for RulePhase {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(
        &self,
        request: &AuditRequest,
        content: Option<&EnrichedContent>,
    ) -> crate::error::Result<PhaseResult> {
        let mut findings = Vec::new();
        let mut passed: u32 = 0;

        if let Some(content) = content {
            for rule in &self.rules {
                if !rule.requires().iter().all(|key| content.has(*key)) {
                    debug!(rule = rule.id(), phase = %self.name, "rule skipped, required content missing");
                    continue;
                }
                let mut found = rule.check(request, content);
                if found.is_empty() {
                    passed += 1;
                } else {
                    findings.append(&mut found);
                }
            }
        }

        let failed = u32::try_from(findings.len()).unwrap_or(u32::MAX);
        let total = passed + failed;
        let score = if total == 0 {
            100.0
        } else {
            round2(100.0 * f64::from(passed) / f64::from(total))
        };

        Ok(PhaseResult {
            phase: self.name.clone(),
            score,
            weight: 0.0,
            passed_checks: passed,
            total_checks: total,
            findings,
            summary: format!("{passed} of {total} checks passed"),
        })
    }
}

/// Compares the audited page against every other known page and reports
/// pairs close enough to compete for the same topic.
///
/// Findings carry the raw distance in a structured field and repeat it in
/// the description, so downstream consumers that only see finding text can
/// still recover it.
#[derive(Debug)]
pub struct SemanticDistancePhase {
    name: String,
    overlap_rule: String,
    merge_below: f64,
    report_below: f64,
    pages: Vec<PageNode>,
}

impl SemanticDistancePhase {
    pub fn new(pages: Vec<PageNode>, audit: &AuditSection) -> Self {
        Self {
            name: audit.semantic_phase.clone(),
            overlap_rule: audit.overlap_rule.clone(),
            merge_below: audit.merge_below,
            report_below: audit.differentiate_below,
            pages,
        }
    }
}

#[async_trait::async_trait]
impl AuditPhase for SemanticDistancePhase {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(
        &self,
        request: &AuditRequest,
        _content: Option<&EnrichedContent>,
    ) -> crate::error::Result<PhaseResult> {
        let url = request.url.as_deref().unwrap_or_default();
        let target = normalize_url(url);
        let page = self
            .pages
            .iter()
            .find(|p| normalize_url(&p.url) == target)
            .ok_or_else(|| AuditError::Graph(GraphError::UnknownPage(url.to_string())))?;

        let mut findings = Vec::new();
        let mut clean: u32 = 0;
        for other in &self.pages {
            if other.id == page.id {
                continue;
            }
            let distance = semantic_distance(page, other);
            if distance < self.report_below {
                let severity = if distance < self.merge_below {
                    Severity::Critical
                } else {
                    Severity::High
                };
                let mut finding = Finding::new(
                    &self.overlap_rule,
                    &self.name,
                    severity,
                    format!("Content overlap with {}", other.url),
                    format!(
                        "{} competes with {} for the same topic (distance: {distance:.2})",
                        page.url, other.url
                    ),
                );
                finding.affected_element = Some(other.url.clone());
                finding.distance = Some(round2(distance));
                findings.push(finding);
            } else {
                clean += 1;
            }
        }

        let failed = u32::try_from(findings.len()).unwrap_or(u32::MAX);
        let total = clean + failed;
        let score = if total == 0 {
            100.0
        } else {
            round2(100.0 * f64::from(clean) / f64::from(total))
        };

        Ok(PhaseResult {
            phase: self.name.clone(),
            score,
            weight: 0.0,
            passed_checks: clean,
            total_checks: total,
            findings,
            summary: format!("{total} page pairs compared, {failed} overlap"),
        })
    }
}

/// Name-keyed set of phases available to the pipeline.
#[derive(Debug, Default)]
pub struct PhaseRegistry {
    phases: HashMap<String, Arc<dyn AuditPhase>>,
}

impl PhaseRegistry {
    pub fn new() -> Self {
        Self {
            phases: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_phase(mut self, phase: Arc<dyn AuditPhase>) -> Self {
        self.register(phase);
        self
    }

    pub fn register(&mut self, phase: Arc<dyn AuditPhase>) {
        self.phases.insert(phase.name().to_string(), phase);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn AuditPhase>> {
        self.phases.get(name).cloned()
    }

    /// Registered phase names, sorted for stable output.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.phases.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }
}
