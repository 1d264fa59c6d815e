use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use pharos_graphs::{FlowThresholds, SemanticThresholds};

use crate::error::{ConfigError, Result};

/// Top-level Pharos configuration, matching `pharos.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PharosConfig {
    #[serde(default)]
    pub audit: AuditSection,
    #[serde(default)]
    pub batch: BatchSection,
    #[serde(default)]
    pub links: LinksSection,
    #[serde(default)]
    pub semantic: SemanticSection,
    #[serde(default)]
    pub redirects: RedirectsSection,
    #[serde(default)]
    pub fetch: FetchSection,
}

impl PharosConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::NotFound(path.display().to_string()))?;
        Self::from_toml_str(&text)
    }

    /// Resolve the weight a phase contributes to the overall score:
    /// request override first, then the configured default, then 0.
    pub fn phase_weight(&self, phase: &str, overrides: &HashMap<String, f64>) -> f64 {
        overrides
            .get(phase)
            .or_else(|| self.audit.default_weights.get(phase))
            .copied()
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSection {
    /// Default phase weights; phases absent here contribute 0 unless
    /// the request overrides them.
    pub default_weights: HashMap<String, f64>,
    /// Phase whose overlap findings feed cannibalization derivation.
    pub semantic_phase: String,
    /// Rule id that signals high content overlap between two pages.
    pub overlap_rule: String,
    /// Pairs closer than this get a merge suggestion.
    pub merge_below: f64,
    /// Pairs closer than this get a differentiation recommendation.
    pub differentiate_below: f64,
}

impl Default for AuditSection {
    fn default() -> Self {
        Self {
            default_weights: HashMap::from([
                ("central-entity".to_string(), 2.0),
                ("content-structure".to_string(), 1.5),
                ("semantic-depth".to_string(), 1.5),
                ("readability".to_string(), 1.0),
                ("ai-detection".to_string(), 1.0),
                ("semantic-distance".to_string(), 1.0),
            ]),
            semantic_phase: "semantic-distance".to_string(),
            overlap_rule: "semantic-overlap".to_string(),
            merge_below: 0.2,
            differentiate_below: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSection {
    /// Bounded worker count for batch audits.
    pub concurrency: usize,
    /// Hard cap on pages per batch run.
    pub max_pages: usize,
    /// Skip pages that already carry an audit timestamp.
    pub skip_audited: bool,
}

impl Default for BatchSection {
    fn default() -> Self {
        Self {
            concurrency: 2,
            max_pages: 500,
            skip_audited: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinksSection {
    pub excessive_outbound: usize,
    pub dilution_high: usize,
    pub dilution_medium: usize,
    pub dilution_low: usize,
    pub top_target_share: f64,
}

impl Default for LinksSection {
    fn default() -> Self {
        let defaults = FlowThresholds::default();
        Self {
            excessive_outbound: defaults.excessive_outbound,
            dilution_high: defaults.dilution_high,
            dilution_medium: defaults.dilution_medium,
            dilution_low: defaults.dilution_low,
            top_target_share: defaults.top_target_share,
        }
    }
}

impl LinksSection {
    pub fn thresholds(&self) -> FlowThresholds {
        FlowThresholds {
            excessive_outbound: self.excessive_outbound,
            dilution_high: self.dilution_high,
            dilution_medium: self.dilution_medium,
            dilution_low: self.dilution_low,
            top_target_share: self.top_target_share,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticSection {
    pub cluster_distance: f64,
    pub link_min: f64,
    pub link_max: f64,
    pub weak_cohesion: f64,
    pub orphan_confidence: f64,
}

impl Default for SemanticSection {
    fn default() -> Self {
        let defaults = SemanticThresholds::default();
        Self {
            cluster_distance: defaults.cluster_distance,
            link_min: defaults.link_min,
            link_max: defaults.link_max,
            weak_cohesion: defaults.weak_cohesion,
            orphan_confidence: defaults.orphan_confidence,
        }
    }
}

impl SemanticSection {
    pub fn thresholds(&self) -> SemanticThresholds {
        SemanticThresholds {
            cluster_distance: self.cluster_distance,
            link_min: self.link_min,
            link_max: self.link_max,
            weak_cohesion: self.weak_cohesion,
            orphan_confidence: self.orphan_confidence,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectsSection {
    /// Maximum hops walked before giving up on a chain.
    pub max_hops: u32,
    /// Redirect hop count above which a chain is flagged long.
    pub long_chain_hops: u32,
}

impl Default for RedirectsSection {
    fn default() -> Self {
        Self {
            max_hops: 10,
            long_chain_hops: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchSection {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Redirects the content client follows on its own.
    pub max_redirects: usize,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: "pharos-audit/0.3".to_string(),
            max_redirects: 5,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────
