use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Typed ID wrappers ──────────────────────────────────────────────

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

typed_id!(ProjectId);

// ── Audit request ──────────────────────────────────────────────────

/// What kind of page a run targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditTarget {
    /// A page managed inside the project.
    Internal,
    /// An arbitrary external URL.
    External,
    /// A page already published on the live site.
    Published,
}

/// Immutable description of one audit run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRequest {
    pub project: ProjectId,
    pub target: AuditTarget,
    /// URL to fetch when content is not supplied by the caller.
    pub url: Option<String>,
    /// Phase names in execution order.
    pub phases: Vec<String>,
    /// Content provider to try first, by name.
    pub preferred_provider: Option<String>,
    /// Per-phase weight overrides; missing phases fall back to the
    /// configured defaults, then to 0.
    #[serde(default)]
    pub weight_overrides: HashMap<String, f64>,
}

impl AuditRequest {
    pub fn new(project: ProjectId, target: AuditTarget) -> Self {
        Self {
            project,
            target,
            url: None,
            phases: Vec::new(),
            preferred_provider: None,
            weight_overrides: HashMap::new(),
        }
    }
}

// ── Findings ───────────────────────────────────────────────────────

/// Finding severity, ordered most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One defect surfaced by a rule check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Unique id for this occurrence (UUID v4).
    pub id: String,
    /// Stable rule identifier, e.g. `"heading-hierarchy-skip"`.
    pub rule: String,
    /// Phase that produced the finding.
    pub phase: String,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    /// Selector, heading text, or URL the finding points at.
    pub affected_element: Option<String>,
    pub auto_fix_available: bool,
    /// Reporting category, usually the phase's display category.
    pub category: String,
    /// Structured semantic distance for overlap findings. Reports
    /// written before this field existed deserialize with `None`.
    #[serde(default)]
    pub distance: Option<f64>,
}

impl Finding {
    pub fn new(
        rule: impl Into<String>,
        phase: impl Into<String>,
        severity: Severity,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let phase = phase.into();
        Self {
            id: Uuid::new_v4().to_string(),
            rule: rule.into(),
            category: phase.clone(),
            phase,
            severity,
            title: title.into(),
            description: description.into(),
            affected_element: None,
            auto_fix_available: false,
            distance: None,
        }
    }
}

// ── Phase results & report ─────────────────────────────────────────

/// Outcome of a single phase for one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseResult {
    pub phase: String,
    /// 0-100.
    pub score: f64,
    /// Contribution to the overall score.
    pub weight: f64,
    pub passed_checks: u32,
    pub total_checks: u32,
    pub findings: Vec<Finding>,
    pub summary: String,
}

/// Two pages competing for the same topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CannibalizationRisk {
    /// The audited page.
    pub page: String,
    /// The page it competes with.
    pub competing: String,
    pub distance: f64,
    pub severity: Severity,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeSuggestion {
    pub page: String,
    pub merge_into: String,
    pub distance: f64,
    pub rationale: String,
}

/// A root or unique entity-attribute the content never mentions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingTopic {
    pub entity: String,
    pub attribute: String,
}

/// Resolution of one rule in the inventory ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleStatus {
    Passed,
    Failed,
    Skipped,
}

impl RuleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// One row of the rule inventory: every known rule appears exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleInventoryItem {
    pub rule: String,
    pub phase: String,
    pub status: RuleStatus,
    /// Severity of the worst finding, for failed rules.
    pub severity: Option<Severity>,
    /// Why the rule could not run, for skipped rules.
    pub skip_reason: Option<String>,
    /// How many checks this row accounts for; synthetic per-phase rows
    /// carry the remainder not attributable to a concrete rule.
    pub checks: u32,
}

/// The complete outcome of one audit run. Immutable after return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnifiedAuditReport {
    pub project: ProjectId,
    pub url: Option<String>,
    pub phases: Vec<PhaseResult>,
    /// Weighted mean of phase scores, rounded to 2 decimals; 0 when the
    /// total weight is 0.
    pub overall_score: f64,
    pub cannibalization_risks: Vec<CannibalizationRisk>,
    pub merge_suggestions: Vec<MergeSuggestion>,
    pub missing_topics: Vec<MissingTopic>,
    pub rule_inventory: Vec<RuleInventoryItem>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    /// True when content had to be fetched and every provider failed.
    pub content_fetch_failed: bool,
    /// Name of the provider that served the content, if any.
    pub provider: Option<String>,
}

// ── Batch progress ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    pub url: String,
    pub message: String,
}

/// Single-writer progress record for a batch run. Observers receive an
/// owned snapshot after every change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchAuditProgress {
    pub total: usize,
    pub completed: usize,
    pub current_url: Option<String>,
    pub current_phase: Option<String>,
    pub errors: Vec<BatchError>,
    /// Set once the cross-page reverse-link pass has run.
    pub cross_page_pass: bool,
}

// ── Page inventory ─────────────────────────────────────────────────

/// A page known to the batch coordinator and the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub project: ProjectId,
    pub url: String,
    pub title: Option<String>,
    pub last_audited: Option<DateTime<Utc>>,
    /// Inbound link count derived by the cross-page pass.
    pub inbound_links: u32,
    /// Outbound link targets recorded during the page's last audit.
    pub outbound: Vec<String>,
    pub cached_content: Option<String>,
    /// 100 minus the page's overall score, plus a fetch-failure penalty.
    pub retrieval_cost: Option<f64>,
    /// Batch ordering key; higher audits first.
    pub priority: Option<f64>,
}

impl PageRecord {
    pub fn new(project: ProjectId, url: impl Into<String>) -> Self {
        Self {
            project,
            url: url.into(),
            title: None,
            last_audited: None,
            inbound_links: 0,
            outbound: Vec::new(),
            cached_content: None,
            retrieval_cost: None,
            priority: None,
        }
    }
}

/// One applied auto-fix, as stored in the fix history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixRecord {
    pub url: String,
    pub rule: String,
    pub description: String,
    pub applied_at: DateTime<Utc>,
}

// ── Tests ──────────────────────────────────────────────────────────
