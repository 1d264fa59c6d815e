//! Rule inventory reconciliation.
//!
//! Rules are not statically enumerated anywhere, so the ledger is rebuilt
//! after every run from three sources: rule ids that produced findings, a
//! static table of data dependencies for rules that may have been skipped,
//! and one synthetic per-phase row covering the passing checks that are
//! never individually listed.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::fetch::{ContentKey, EnrichedContent};
use crate::types::{PhaseResult, RuleInventoryItem, RuleStatus};

/// Ties a rule-id prefix to the content field it cannot run without.
#[derive(Debug, Clone, Copy)]
pub struct DataDependency {
    pub rule: &'static str,
    pub phase: &'static str,
    pub required: ContentKey,
    pub skip_reason: &'static str,
}

/// Rules known to decline when a content field is missing. Prefix matching
/// lets one entry cover a family of related rule ids.
pub const DATA_DEPENDENCIES: &[DataDependency] = &[
    DataDependency {
        rule: "central-entity-title",
        phase: "central-entity",
        required: ContentKey::Title,
        skip_reason: "no title extracted",
    },
    DataDependency {
        rule: "central-entity-coverage",
        phase: "central-entity",
        required: ContentKey::Text,
        skip_reason: "no visible text extracted",
    },
    DataDependency {
        rule: "central-entity-metadata",
        phase: "central-entity",
        required: ContentKey::Metadata,
        skip_reason: "no metadata extracted",
    },
    DataDependency {
        rule: "content-structure-headings",
        phase: "content-structure",
        required: ContentKey::Html,
        skip_reason: "page HTML was not captured",
    },
    DataDependency {
        rule: "content-structure-nesting",
        phase: "content-structure",
        required: ContentKey::Html,
        skip_reason: "page HTML was not captured",
    },
    DataDependency {
        rule: "content-structure-links",
        phase: "content-structure",
        required: ContentKey::Links,
        skip_reason: "no outbound links extracted",
    },
    DataDependency {
        rule: "semantic-depth-vocabulary",
        phase: "semantic-depth",
        required: ContentKey::Text,
        skip_reason: "no visible text extracted",
    },
    DataDependency {
        rule: "readability-sentences",
        phase: "readability",
        required: ContentKey::Text,
        skip_reason: "no visible text extracted",
    },
    DataDependency {
        rule: "ai-detection-burstiness",
        phase: "ai-detection",
        required: ContentKey::Text,
        skip_reason: "no visible text extracted",
    },
];

/// Builds the complete pass/fail/skip ledger for one run.
///
/// Every rule id introduced by a finding or by [`DATA_DEPENDENCIES`] appears
/// exactly once, and each phase gets a final `<phase>-passed` row whose
/// `checks` count is the phase's total minus its findings, so the ledger
/// reconciles against every `PhaseResult` without enumerating all rules.
pub fn build_inventory(
    results: &[PhaseResult],
    content: Option<&EnrichedContent>,
) -> Vec<RuleInventoryItem> {
    let mut items: Vec<RuleInventoryItem> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut seen: HashSet<String> = HashSet::new();

    // Findings become failed rows; the first occurrence fixes the severity,
    // later findings for the same rule only bump the check count.
    for result in results {
        for finding in &result.findings {
            if let Some(&i) = index.get(&finding.rule) {
                items[i].checks += 1;
            } else {
                index.insert(finding.rule.clone(), items.len());
                seen.insert(finding.rule.clone());
                items.push(RuleInventoryItem {
                    rule: finding.rule.clone(),
                    phase: result.phase.clone(),
                    status: RuleStatus::Failed,
                    severity: Some(finding.severity),
                    skip_reason: None,
                    checks: 1,
                });
            }
        }
    }

    // Dependency table fills in rules that produced no findings: passed if
    // their required content was present, skipped otherwise.
    for dep in DATA_DEPENDENCIES {
        if seen.iter().any(|id| id.starts_with(dep.rule)) {
            continue;
        }
        let available = content.is_some_and(|c| c.has(dep.required));
        items.push(RuleInventoryItem {
            rule: dep.rule.to_string(),
            phase: dep.phase.to_string(),
            status: if available {
                RuleStatus::Passed
            } else {
                RuleStatus::Skipped
            },
            severity: None,
            skip_reason: (!available).then(|| dep.skip_reason.to_string()),
            checks: 1,
        });
        seen.insert(dep.rule.to_string());
    }

    // One synthetic row per phase for the checks that passed silently.
    for result in results {
        let failed = u32::try_from(result.findings.len()).unwrap_or(u32::MAX);
        items.push(RuleInventoryItem {
            rule: format!("{}-passed", result.phase),
            phase: result.phase.clone(),
            status: RuleStatus::Passed,
            severity: None,
            skip_reason: None,
            checks: result.total_checks.saturating_sub(failed),
        });
    }

    debug!(items = items.len(), "rule inventory reconciled");
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Finding, Severity};

    fn result(phase: &str, total: u32, findings: Vec<Finding>) -> PhaseResult {
        let failed = u32::try_from(findings.len()).unwrap();
        PhaseResult {
            phase: phase.to_string(),
            score: 0.0,
            weight: 1.0,
            passed_checks: total - failed,
            total_checks: total,
            findings,
            summary: String::new(),
        }
    }

    fn finding(rule: &str, severity: Severity) -> Finding {
        Finding::new(rule, "structure", severity, "t", "d")
    }

    fn full_content() -> EnrichedContent {
        EnrichedContent {
            html: Some("<html></html>".to_string()),
            text: Some("body".to_string()),
            title: Some("title".to_string()),
            links: vec!["https://site.test/a".to_string()],
            metadata: std::iter::once((
                "description".to_string(),
                serde_json::Value::String("d".to_string()),
            ))
            .collect(),
            provider: "test".to_string(),
            duration_ms: 0,
        }
    }

    #[test]
    fn first_finding_fixes_severity_and_later_ones_count() {
        let results = vec![result(
            "structure",
            5,
            vec![
                finding("img-alt", Severity::Critical),
                finding("img-alt", Severity::Low),
            ],
        )];
        let items = build_inventory(&results, Some(&full_content()));
        let row = items.iter().find(|i| i.rule == "img-alt").unwrap();
        assert_eq!(row.status, RuleStatus::Failed);
        assert_eq!(row.severity, Some(Severity::Critical));
        assert_eq!(row.checks, 2);
    }

    #[test]
    fn missing_content_fields_mark_dependencies_skipped() {
        let content = EnrichedContent {
            html: Some("<html></html>".to_string()),
            ..EnrichedContent::default()
        };
        let items = build_inventory(&[], Some(&content));

        let links_row = items
            .iter()
            .find(|i| i.rule == "content-structure-links")
            .unwrap();
        assert_eq!(links_row.status, RuleStatus::Skipped);
        assert_eq!(
            links_row.skip_reason.as_deref(),
            Some("no outbound links extracted")
        );

        let html_row = items
            .iter()
            .find(|i| i.rule == "content-structure-headings")
            .unwrap();
        assert_eq!(html_row.status, RuleStatus::Passed);
        assert!(html_row.skip_reason.is_none());
    }

    #[test]
    fn no_content_skips_every_unseen_dependency() {
        let items = build_inventory(&[], None);
        assert_eq!(items.len(), DATA_DEPENDENCIES.len());
        assert!(items.iter().all(|i| i.status == RuleStatus::Skipped));
    }

    #[test]
    fn seen_prefix_suppresses_dependency_row() {
        let results = vec![result(
            "central-entity",
            3,
            vec![finding("central-entity-title-length", Severity::Medium)],
        )];
        let items = build_inventory(&results, None);
        // The finding's id starts with the table prefix, so no skipped row.
        assert_eq!(
            items
                .iter()
                .filter(|i| i.rule.starts_with("central-entity-title"))
                .count(),
            1
        );
    }

    #[test]
    fn synthetic_rows_carry_the_passing_remainder() {
        let results = vec![
            result("structure", 10, vec![finding("img-alt", Severity::Low)]),
            result("readability", 4, Vec::new()),
        ];
        let items = build_inventory(&results, Some(&full_content()));

        let structure = items.iter().find(|i| i.rule == "structure-passed").unwrap();
        assert_eq!(structure.status, RuleStatus::Passed);
        assert_eq!(structure.checks, 9);

        let readability = items
            .iter()
            .find(|i| i.rule == "readability-passed")
            .unwrap();
        assert_eq!(readability.checks, 4);
    }

    #[test]
    fn ledger_reconciles_against_each_phase() {
        let results = vec![result(
            "structure",
            7,
            vec![
                finding("img-alt", Severity::Low),
                finding("canonical", Severity::High),
                finding("canonical", Severity::High),
            ],
        )];
        let items = build_inventory(&results, Some(&full_content()));

        let failed: u32 = items
            .iter()
            .filter(|i| i.phase == "structure" && i.status == RuleStatus::Failed)
            .map(|i| i.checks)
            .sum();
        let synthetic = items
            .iter()
            .find(|i| i.rule == "structure-passed")
            .unwrap()
            .checks;
        assert_eq!(failed + synthetic, 7);
    }

    #[test]
    fn every_rule_id_appears_exactly_once() {
        let results = vec![result(
            "structure",
            5,
            vec![
                finding("img-alt", Severity::Low),
                finding("img-alt", Severity::Low),
                finding("canonical", Severity::High),
            ],
        )];
        let items = build_inventory(&results, None);
        let mut ids: Vec<&str> = items.iter().map(|i| i.rule.as_str()).collect();
        let before = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), before);
    }

    // ── Property-based tests ──────────────────────────────────────

    mod proptests {
        use proptest::prelude::*;

        use super::*;

        /// Phase with `failed` findings spread over up to three rule ids
        /// namespaced by the phase, plus `extra` silently passing checks.
        fn arb_phase(index: usize) -> impl Strategy<Value = PhaseResult> {
            (0u32..5, 0u32..10).prop_map(move |(failed, extra)| {
                let phase = format!("p{index}");
                let findings = (0..failed)
                    .map(|i| {
                        Finding::new(
                            format!("p{index}-r{}", i % 3),
                            phase.clone(),
                            Severity::Medium,
                            "t",
                            "d",
                        )
                    })
                    .collect();
                PhaseResult {
                    phase,
                    score: 0.0,
                    weight: 1.0,
                    passed_checks: extra,
                    total_checks: failed + extra,
                    findings,
                    summary: String::new(),
                }
            })
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(100))]

            #[test]
            fn ledger_is_total_and_duplicate_free(a in arb_phase(0), b in arb_phase(1)) {
                let results = vec![a, b];
                let items = build_inventory(&results, None);

                let mut ids: Vec<&str> = items.iter().map(|i| i.rule.as_str()).collect();
                let before = ids.len();
                ids.sort_unstable();
                ids.dedup();
                prop_assert_eq!(ids.len(), before, "duplicate rule id in the ledger");

                // Failed checks plus the synthetic remainder cover each
                // phase's total exactly.
                for result in &results {
                    let failed: u32 = items
                        .iter()
                        .filter(|i| i.phase == result.phase && i.status == RuleStatus::Failed)
                        .map(|i| i.checks)
                        .sum();
                    let synthetic = items
                        .iter()
                        .find(|i| i.rule == format!("{}-passed", result.phase))
                        .map_or(0, |i| i.checks);
                    prop_assert_eq!(failed + synthetic, result.total_checks);
                }
            }
        }
    }
}
