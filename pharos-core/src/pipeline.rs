//! Phase pipeline orchestrator.
//!
//! Runs the phases named by an [`AuditRequest`] in order against fetched
//! content, merges their scores into one weighted overall score, and folds
//! findings, semantic risks, missing topics, and the rule inventory into a
//! single [`UnifiedAuditReport`].
//!
//! The run itself is infallible: a phase that errors is isolated into a
//! zero-score, zero-weight result, content that cannot be fetched only sets
//! a flag, and a failing report snapshot is logged and ignored. Callers
//! always get a complete report back.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use pharos_graphs::round2;
use pharos_graphs::types::{AttributeCategory, EavTriple};

use crate::config::PharosConfig;
use crate::fetch::{EnrichedContent, FallbackFetcher};
use crate::inventory::build_inventory;
use crate::phase::PhaseRegistry;
use crate::progress::{AuditEvent, AuditEventFn};
use crate::store::AuditStore;
use crate::types::{
    AuditRequest, CannibalizationRisk, Finding, MergeSuggestion, MissingTopic, PhaseResult,
    Severity, UnifiedAuditReport,
};

/// Sequences phases for one page and assembles the unified report.
#[derive(Debug)]
pub struct AuditPipeline {
    config: PharosConfig,
    registry: PhaseRegistry,
    fetcher: FallbackFetcher,
    store: Option<Arc<dyn AuditStore>>,
    reference_triples: Vec<EavTriple>,
}

impl AuditPipeline {
    pub fn new(config: PharosConfig, registry: PhaseRegistry, fetcher: FallbackFetcher) -> Self {
        Self {
            config,
            registry,
            fetcher,
            store: None,
            reference_triples: Vec::new(),
        }
    }

    /// Attach a best-effort snapshot store. Save failures are logged, never
    /// surfaced.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn AuditStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Attach the entity-attribute reference set used to derive missing
    /// knowledge-graph topics.
    #[must_use]
    pub fn with_reference_triples(mut self, triples: Vec<EavTriple>) -> Self {
        self.reference_triples = triples;
        self
    }

    pub fn config(&self) -> &PharosConfig {
        &self.config
    }

    /// Runs one audit. `content` short-circuits fetching when the caller
    /// already has the page; otherwise the request URL is fetched through
    /// the provider chain.
    #[instrument(skip_all, name = "audit_run")]
    pub async fn run(
        &self,
        request: &AuditRequest,
        content: Option<EnrichedContent>,
        on_event: Option<&AuditEventFn<'_>>,
    ) -> UnifiedAuditReport {
        let started = Instant::now();
        let started_at = Utc::now();
        log_start(request);

        let (content, fetch_failed) = match content {
            Some(content) => (Some(content), false),
            None => self.acquire(request).await,
        };
        self.run_inner(request, content, fetch_failed, started, started_at, on_event)
            .await
    }

    /// Like [`Self::run`], but hands the fetched content back alongside the
    /// report so callers can record outbound links or cache the page. The
    /// batch coordinator drives audits through this entry point.
    #[instrument(skip_all, name = "audit_page")]
    pub async fn audit_page(
        &self,
        request: &AuditRequest,
        on_event: Option<&AuditEventFn<'_>>,
    ) -> (UnifiedAuditReport, Option<EnrichedContent>) {
        let started = Instant::now();
        let started_at = Utc::now();
        log_start(request);

        let (content, fetch_failed) = self.acquire(request).await;
        let report = self
            .run_inner(
                request,
                content.clone(),
                fetch_failed,
                started,
                started_at,
                on_event,
            )
            .await;
        (report, content)
    }

    /// Fetch the request URL through the provider chain. Failure is reported
    /// as a flag, never an error.
    async fn acquire(&self, request: &AuditRequest) -> (Option<EnrichedContent>, bool) {
        match &request.url {
            Some(url) if !self.fetcher.is_empty() => {
                match self
                    .fetcher
                    .fetch(url, request.preferred_provider.as_deref())
                    .await
                {
                    Ok(content) => (Some(content), false),
                    Err(e) => {
                        warn!(url = %url, error = %e, "content fetch failed, auditing without content");
                        (None, true)
                    }
                }
            }
            _ => (None, false),
        }
    }

    async fn run_inner(
        &self,
        request: &AuditRequest,
        content: Option<EnrichedContent>,
        content_fetch_failed: bool,
        started: Instant,
        started_at: chrono::DateTime<Utc>,
        on_event: Option<&AuditEventFn<'_>>,
    ) -> UnifiedAuditReport {
        let total = request.phases.len();
        let mut phases: Vec<PhaseResult> = Vec::with_capacity(total);
        for (index, name) in request.phases.iter().enumerate() {
            emit(
                on_event,
                &AuditEvent::PhaseStarted {
                    phase: name.clone(),
                    index,
                    total,
                },
            );

            let result = match self.registry.get(name) {
                Some(phase) => match phase.execute(request, content.as_ref()).await {
                    Ok(mut result) => {
                        result.weight = self
                            .config
                            .phase_weight(name, &request.weight_overrides);
                        result
                    }
                    Err(e) => {
                        warn!(phase = %name, error = %e, "phase failed, isolating");
                        failed_phase_result(name, &e.to_string())
                    }
                },
                None => {
                    warn!(phase = %name, "requested phase is not registered");
                    failed_phase_result(name, "phase is not registered")
                }
            };

            emit(
                on_event,
                &AuditEvent::PhaseFinished {
                    phase: name.clone(),
                    score: result.score,
                },
            );
            phases.push(result);
        }

        let total_weight: f64 = phases.iter().map(|p| p.weight).sum();
        let overall_score = if total_weight > 0.0 {
            round2(
                phases.iter().map(|p| p.score * p.weight).sum::<f64>() / total_weight,
            )
        } else {
            0.0
        };

        let (cannibalization_risks, merge_suggestions) =
            self.derive_semantic_risks(request, &phases);
        let missing_topics = self.derive_missing_topics(content.as_ref());
        let rule_inventory = build_inventory(&phases, content.as_ref());

        let provider = content
            .as_ref()
            .map(|c| c.provider.clone())
            .filter(|p| !p.is_empty());

        let finished_at = Utc::now();
        let report = UnifiedAuditReport {
            project: request.project,
            url: request.url.clone(),
            phases,
            overall_score,
            cannibalization_risks,
            merge_suggestions,
            missing_topics,
            rule_inventory,
            started_at,
            finished_at,
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            content_fetch_failed,
            provider,
        };

        if let Some(store) = &self.store {
            if let Err(e) = store.save_report(&report).await {
                warn!(error = %e, "report snapshot failed");
            }
        }

        emit(
            on_event,
            &AuditEvent::Completed {
                overall_score: report.overall_score,
            },
        );
        info!(
            overall = report.overall_score,
            duration_ms = report.duration_ms,
            fetch_failed = report.content_fetch_failed,
            "audit complete"
        );
        report
    }

    /// Cannibalization risks and merge suggestions come only from the
    /// designated semantic phase's overlap findings. The structured distance
    /// field is preferred; older finding text is parsed as a fallback.
    fn derive_semantic_risks(
        &self,
        request: &AuditRequest,
        phases: &[PhaseResult],
    ) -> (Vec<CannibalizationRisk>, Vec<MergeSuggestion>) {
        let audit = &self.config.audit;
        let Some(semantic) = phases.iter().find(|p| p.phase == audit.semantic_phase) else {
            return (Vec::new(), Vec::new());
        };

        let page = request.url.clone().unwrap_or_default();
        let mut risks = Vec::new();
        let mut merges = Vec::new();
        for finding in &semantic.findings {
            if finding.rule != audit.overlap_rule {
                continue;
            }
            let Some(distance) = finding
                .distance
                .or_else(|| parse_distance(&finding.description))
            else {
                debug!(finding = %finding.id, "overlap finding carries no distance");
                continue;
            };
            if distance >= audit.differentiate_below {
                continue;
            }
            let competing = finding.affected_element.clone().unwrap_or_default();
            let merge = distance < audit.merge_below;
            risks.push(CannibalizationRisk {
                page: page.clone(),
                competing: competing.clone(),
                distance,
                severity: if merge {
                    Severity::Critical
                } else {
                    Severity::High
                },
                recommendation: if merge {
                    "Merge these pages or consolidate them under one canonical URL".to_string()
                } else {
                    "Differentiate intent and vocabulary so each page targets its own query"
                        .to_string()
                },
            });
            if merge {
                merges.push(MergeSuggestion {
                    page: page.clone(),
                    merge_into: competing,
                    distance,
                    rationale: format!(
                        "Semantic distance {distance:.2} is below the merge threshold {:.2}",
                        audit.merge_below
                    ),
                });
            }
        }
        (risks, merges)
    }

    /// Root and unique entity-attributes whose text never appears in the
    /// fetched content. Without content there is nothing to search, so no
    /// topics are reported.
    fn derive_missing_topics(&self, content: Option<&EnrichedContent>) -> Vec<MissingTopic> {
        let Some(content) = content else {
            return Vec::new();
        };
        let mut haystack = String::new();
        if let Some(html) = &content.html {
            haystack.push_str(&html.to_lowercase());
        }
        haystack.push(' ');
        if let Some(text) = &content.text {
            haystack.push_str(&text.to_lowercase());
        }

        let mut missing = Vec::new();
        for triple in &self.reference_triples {
            if !matches!(
                triple.category,
                AttributeCategory::Root | AttributeCategory::Unique
            ) {
                continue;
            }
            let needle = triple.attribute.to_lowercase();
            if needle.is_empty() || haystack.contains(&needle) {
                continue;
            }
            let topic = MissingTopic {
                entity: triple.entity.clone(),
                attribute: triple.attribute.clone(),
            };
            if !missing.contains(&topic) {
                missing.push(topic);
            }
        }
        missing
    }
}

fn emit(on_event: Option<&AuditEventFn<'_>>, event: &AuditEvent) {
    if let Some(callback) = on_event {
        callback(event);
    }
}

fn log_start(request: &AuditRequest) {
    info!(
        project = %request.project,
        url = request.url.as_deref().unwrap_or("<none>"),
        phases = request.phases.len(),
        "audit starting"
    );
}

/// Zero-score, zero-weight result standing in for a phase that errored or
/// was never registered. The single finding keeps the failure visible in
/// the inventory.
fn failed_phase_result(phase: &str, message: &str) -> PhaseResult {
    PhaseResult {
        phase: phase.to_string(),
        score: 0.0,
        weight: 0.0,
        passed_checks: 0,
        total_checks: 0,
        findings: vec![Finding::new(
            format!("{phase}-error"),
            phase,
            Severity::High,
            "Phase did not complete",
            message,
        )],
        summary: format!("phase failed: {message}"),
    }
}

/// Pulls `distance: <float>` out of finding text.
fn parse_distance(description: &str) -> Option<f64> {
    let idx = description.find("distance:")?;
    let rest = description[idx + "distance:".len()..].trim_start();
    let token: String = rest
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    token.parse().ok()
}
