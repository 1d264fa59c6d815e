//! Bounded-concurrency batch audits over a page roster.
//!
//! `BatchCoordinator` drains a shared work queue with a small worker
//! pool, drives every item through [`AuditPipeline::audit_page`], and
//! finishes with a cross-page pass that turns the collected outbound
//! link lists into persisted inbound counts. Progress is the only
//! output channel: observers receive an owned [`BatchAuditProgress`]
//! snapshot after every mutation, and `run_batch` itself returns
//! nothing.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use chrono::Utc;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, instrument, warn};

use pharos_graphs::{normalize_url, round2};

use crate::config::BatchSection;
use crate::pipeline::AuditPipeline;
use crate::progress::{AuditEvent, BatchProgressFn};
use crate::store::AuditStore;
use crate::types::{AuditRequest, BatchAuditProgress, BatchError, PageRecord, ProjectId};

// ── Cancellation ───────────────────────────────────────────────────

/// Cooperative abort signal shared between the caller and the workers.
///
/// Workers poll the flag before claiming the next queue item, so an
/// item already in flight runs to completion but no new item starts.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

// ── Options ────────────────────────────────────────────────────────

/// Per-run overrides for the configured batch settings. Unset fields
/// fall back to the `[batch]` configuration section.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub concurrency: Option<usize>,
    pub max_pages: Option<usize>,
    pub skip_audited: Option<bool>,
}

// ── Coordinator ────────────────────────────────────────────────────

/// Runs audits for many pages under bounded concurrency.
#[derive(Debug)]
pub struct BatchCoordinator {
    pipeline: Arc<AuditPipeline>,
    store: Arc<dyn AuditStore>,
    config: BatchSection,
}

impl BatchCoordinator {
    pub fn new(pipeline: Arc<AuditPipeline>, store: Arc<dyn AuditStore>) -> Self {
        let config = pipeline.config().batch.clone();
        Self {
            pipeline,
            store,
            config,
        }
    }

    /// Audits every eligible item from `items`, then runs the
    /// cross-page reverse-link pass.
    ///
    /// The roster is filtered (when skipping already-audited pages),
    /// sorted by priority and capped before any worker starts, so
    /// `total` in the first progress snapshot is final. Per-item fetch
    /// failures land in `progress.errors` keyed by URL; they never
    /// stop sibling workers or the cross-page pass. Item completion
    /// order across workers is not guaranteed.
    #[instrument(skip_all, name = "batch_run")]
    pub async fn run_batch(
        &self,
        items: Vec<PageRecord>,
        template: &AuditRequest,
        options: BatchOptions,
        on_progress: Option<Arc<BatchProgressFn>>,
        cancel: Option<CancelFlag>,
    ) {
        let concurrency = options.concurrency.unwrap_or(self.config.concurrency).max(1);
        let max_pages = options.max_pages.unwrap_or(self.config.max_pages);
        let skip_audited = options.skip_audited.unwrap_or(self.config.skip_audited);

        let mut items = items;
        if skip_audited {
            items.retain(|item| item.last_audited.is_none());
        }
        sort_by_priority(&mut items);
        items.truncate(max_pages);

        let total = items.len();
        // (project, url) pairs survive the queue being drained; the
        // cross-page pass works from this roster.
        let roster: Vec<(ProjectId, String)> = items
            .iter()
            .map(|item| (item.project, item.url.clone()))
            .collect();

        info!(total, concurrency, "batch audit starting");

        let progress = Arc::new(StdMutex::new(BatchAuditProgress::default()));
        update_progress(&progress, on_progress.as_deref(), |p| p.total = total);

        let queue = Arc::new(AsyncMutex::new(items.into_iter().collect::<VecDeque<_>>()));
        let link_map: Arc<StdMutex<HashMap<String, Vec<String>>>> =
            Arc::new(StdMutex::new(HashMap::new()));

        let mut handles = Vec::with_capacity(concurrency);
        for worker in 0..concurrency {
            let pipeline = Arc::clone(&self.pipeline);
            let store = Arc::clone(&self.store);
            let queue = Arc::clone(&queue);
            let link_map = Arc::clone(&link_map);
            let progress = Arc::clone(&progress);
            let notify = on_progress.clone();
            let cancel = cancel.clone();
            let template = template.clone();

            handles.push(tokio::spawn(async move {
                loop {
                    if cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
                        debug!(worker, "batch cancelled, worker stopping");
                        break;
                    }
                    // Atomic get-and-remove; the guard must not outlive
                    // the pop.
                    let item = { queue.lock().await.pop_front() };
                    let Some(item) = item else {
                        break;
                    };

                    debug!(worker, url = %item.url, "auditing page");
                    update_progress(&progress, notify.as_deref(), |p| {
                        p.current_url = Some(item.url.clone());
                        p.current_phase = None;
                    });

                    let bridge_progress = Arc::clone(&progress);
                    let bridge_notify = notify.clone();
                    let bridge = move |event: &AuditEvent| {
                        if let AuditEvent::PhaseStarted { phase, .. } = event {
                            update_progress(&bridge_progress, bridge_notify.as_deref(), |p| {
                                p.current_phase = Some(phase.clone());
                            });
                        }
                    };

                    let mut request = template.clone();
                    request.project = item.project;
                    request.url = Some(item.url.clone());
                    let (report, content) = pipeline.audit_page(&request, Some(&bridge)).await;

                    if report.content_fetch_failed {
                        update_progress(&progress, notify.as_deref(), |p| {
                            p.errors.push(BatchError {
                                url: item.url.clone(),
                                message: "all content providers failed".to_string(),
                            });
                        });
                    } else if let Some(content) = content {
                        link_map
                            .lock()
                            .expect("batch link map mutex poisoned")
                            .insert(item.url.clone(), content.links.clone());

                        let mut updated = item.clone();
                        if let Some(title) = &content.title {
                            updated.title = Some(title.clone());
                        }
                        if let Some(html) = &content.html {
                            updated.cached_content = Some(html.clone());
                        }
                        updated.outbound = content.links.clone();
                        updated.retrieval_cost =
                            Some(retrieval_cost(report.overall_score, false));
                        updated.last_audited = Some(Utc::now());
                        if let Err(e) = store.upsert_page(&updated).await {
                            warn!(url = %item.url, error = %e, "failed to persist audited page");
                        }
                    }

                    update_progress(&progress, notify.as_deref(), |p| {
                        p.completed += 1;
                        p.current_phase = None;
                    });
                }
            }));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "batch worker panicked");
            }
        }

        let cancelled = cancel.as_ref().is_some_and(CancelFlag::is_cancelled);
        let links_by_page = {
            let mut guard = link_map.lock().expect("batch link map mutex poisoned");
            std::mem::take(&mut *guard)
        };
        if !cancelled && links_by_page.values().any(|links| !links.is_empty()) {
            update_progress(&progress, on_progress.as_deref(), |p| {
                p.cross_page_pass = true;
                p.current_url = None;
            });
            self.cross_page_pass(&roster, &links_by_page).await;
        }

        update_progress(&progress, on_progress.as_deref(), |p| {
            p.current_url = None;
            p.current_phase = None;
        });
        let snapshot = progress
            .lock()
            .expect("batch progress mutex poisoned")
            .clone();
        info!(
            total = snapshot.total,
            completed = snapshot.completed,
            errors = snapshot.errors.len(),
            cancelled,
            "batch audit finished"
        );
    }

    /// Builds a reverse "who links to me" index over the collected
    /// link lists and persists each audited item's inbound count and
    /// outbound targets. Targets outside the roster are external or
    /// unknown pages and are silently excluded; self-links never
    /// count.
    #[instrument(skip_all, name = "cross_page_pass")]
    async fn cross_page_pass(
        &self,
        roster: &[(ProjectId, String)],
        links_by_page: &HashMap<String, Vec<String>>,
    ) {
        let known: HashSet<String> = roster
            .iter()
            .map(|(_, url)| normalize_url(url))
            .collect();

        let mut inbound: HashMap<String, u32> = HashMap::new();
        for (source, targets) in links_by_page {
            let source_norm = normalize_url(source);
            for target in targets {
                let norm = normalize_url(target);
                if norm == source_norm || !known.contains(&norm) {
                    continue;
                }
                *inbound.entry(norm).or_insert(0) += 1;
            }
        }

        let mut persisted = 0usize;
        for (project, url) in roster {
            // Items without a recorded link list failed their fetch;
            // their stored counts stay as they were.
            let Some(outbound) = links_by_page.get(url) else {
                continue;
            };
            let count = inbound.get(&normalize_url(url)).copied().unwrap_or(0);
            match self
                .store
                .update_link_counts(*project, url, count, outbound)
                .await
            {
                Ok(()) => persisted += 1,
                Err(e) => warn!(url = %url, error = %e, "failed to persist link counts"),
            }
        }
        debug!(persisted, "cross-page link pass finished");
    }

    /// Recomputes and persists the retrieval cost for pages that have
    /// a stored report snapshot but no cost yet. Returns how many
    /// pages were updated; per-item failures are skipped with a
    /// warning.
    pub async fn backfill_retrieval_cost(
        &self,
        project: ProjectId,
    ) -> crate::error::Result<u32> {
        let pages = self.store.list_pages(project).await?;
        let mut updated = 0u32;
        for page in pages {
            if page.retrieval_cost.is_some() {
                continue;
            }
            let report = match self.store.latest_report(project, &page.url).await {
                Ok(Some(report)) => report,
                Ok(None) => continue,
                Err(e) => {
                    warn!(url = %page.url, error = %e, "failed to load stored report");
                    continue;
                }
            };
            let cost = retrieval_cost(report.overall_score, report.content_fetch_failed);
            match self
                .store
                .update_retrieval_cost(project, &page.url, cost)
                .await
            {
                Ok(()) => updated += 1,
                Err(e) => warn!(url = %page.url, error = %e, "failed to persist retrieval cost"),
            }
        }
        info!(project = %project, updated, "retrieval cost backfill finished");
        Ok(updated)
    }
}

// ── Helpers ────────────────────────────────────────────────────────

/// Higher priority audits first; pages without a priority sort after
/// every prioritised page, lexicographically by URL.
fn sort_by_priority(items: &mut [PageRecord]) {
    items.sort_by(|a, b| {
        match (a.priority, b.priority) {
            (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(std::cmp::Ordering::Equal),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }
        .then_with(|| a.url.cmp(&b.url))
    });
}

/// 100 minus the page's overall score, plus a flat penalty when the
/// content fetch failed, clamped to 0-100.
#[must_use]
pub fn retrieval_cost(overall_score: f64, fetch_failed: bool) -> f64 {
    let penalty = if fetch_failed { 10.0 } else { 0.0 };
    round2((100.0 - overall_score + penalty).clamp(0.0, 100.0))
}

/// Mutates the shared progress record and hands every observer an
/// owned snapshot. The callback runs outside the lock.
fn update_progress(
    progress: &StdMutex<BatchAuditProgress>,
    notify: Option<&BatchProgressFn>,
    mutate: impl FnOnce(&mut BatchAuditProgress),
) {
    let snapshot = {
        let mut guard = progress.lock().expect("batch progress mutex poisoned");
        mutate(&mut guard);
        guard.clone()
    };
    if let Some(notify) = notify {
        notify(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PharosConfig;
    use crate::error::{AuditError, FetchError};
    use crate::fetch::{ContentFetcher, EnrichedContent, FallbackFetcher};
    use crate::phase::{AuditPhase, PhaseRegistry};
    use crate::store::SqliteStore;
    use crate::types::{AuditTarget, PhaseResult, UnifiedAuditReport};

    /// Serves canned content for known URLs, errors for the rest, and
    /// logs every fetch in order.
    #[derive(Debug)]
    struct RosterFetcher {
        pages: HashMap<String, EnrichedContent>,
        log: StdMutex<Vec<String>>,
    }

    impl RosterFetcher {
        fn new(pages: Vec<(&str, Vec<&str>)>) -> Self {
            let pages = pages
                .into_iter()
                .map(|(url, links)| {
                    let content = EnrichedContent {
                        html: Some(format!("<html><title>{url}</title></html>")),
                        title: Some(format!("Title for {url}")),
                        links: links.into_iter().map(str::to_string).collect(),
                        provider: "roster".to_string(),
                        ..EnrichedContent::default()
                    };
                    (url.to_string(), content)
                })
                .collect();
            Self {
                pages,
                log: StdMutex::new(Vec::new()),
            }
        }

        fn fetched(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl ContentFetcher for RosterFetcher {
        fn name(&self) -> &str {
            "roster"
        }

        async fn fetch(&self, url: &str) -> crate::error::Result<EnrichedContent> {
            self.log.lock().unwrap().push(url.to_string());
            self.pages.get(url).cloned().ok_or_else(|| {
                AuditError::Fetch(FetchError::Network(format!("no route to {url}")))
            })
        }
    }

    #[derive(Debug)]
    struct FixedPhase;

    #[async_trait::async_trait]
    impl AuditPhase for FixedPhase {
        fn name(&self) -> &str {
            "content"
        }

        async fn execute(
            &self,
            _request: &AuditRequest,
            _content: Option<&EnrichedContent>,
        ) -> crate::error::Result<PhaseResult> {
            Ok(PhaseResult {
                phase: "content".to_string(),
                score: 80.0,
                weight: 0.0,
                passed_checks: 4,
                total_checks: 5,
                findings: Vec::new(),
                summary: String::new(),
            })
        }
    }

    fn template() -> AuditRequest {
        let mut request = AuditRequest::new(ProjectId(1), AuditTarget::Internal);
        request.phases = vec!["content".to_string()];
        request.weight_overrides.insert("content".to_string(), 1.0);
        request
    }

    fn coordinator(
        fetcher: Arc<RosterFetcher>,
        store: Arc<SqliteStore>,
    ) -> BatchCoordinator {
        let mut registry = PhaseRegistry::new();
        registry.register(Arc::new(FixedPhase));
        let pipeline = AuditPipeline::new(
            PharosConfig::default(),
            registry,
            FallbackFetcher::new().with_provider(fetcher),
        );
        BatchCoordinator::new(Arc::new(pipeline), store)
    }

    fn capture() -> (Arc<BatchProgressFn>, Arc<StdMutex<Vec<BatchAuditProgress>>>) {
        let snapshots: Arc<StdMutex<Vec<BatchAuditProgress>>> =
            Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&snapshots);
        let callback: Arc<BatchProgressFn> =
            Arc::new(move |snapshot| sink.lock().unwrap().push(snapshot));
        (callback, snapshots)
    }

    async fn seeded_store(urls: &[&str]) -> Arc<SqliteStore> {
        let store = SqliteStore::in_memory().expect("in-memory store");
        for url in urls {
            store
                .upsert_page(&PageRecord::new(ProjectId(1), *url))
                .await
                .expect("seed page");
        }
        Arc::new(store)
    }

    #[tokio::test]
    async fn one_failed_fetch_does_not_stop_the_batch() {
        let a = "https://site.test/a";
        let b = "https://site.test/b";
        let c = "https://site.test/c";
        let d = "https://site.test/d";
        let e = "https://site.test/e";

        // e is not routable; b links to itself, c links off-site.
        let fetcher = Arc::new(RosterFetcher::new(vec![
            (a, vec![b, c]),
            (b, vec![a, b]),
            (c, vec![a, "https://elsewhere.test/x"]),
            (d, vec![]),
        ]));
        let store = seeded_store(&[a, b, c, d, e]).await;
        let coordinator = coordinator(Arc::clone(&fetcher), Arc::clone(&store));

        let items: Vec<PageRecord> = [a, b, c, d, e]
            .iter()
            .map(|url| PageRecord::new(ProjectId(1), *url))
            .collect();
        let (callback, snapshots) = capture();
        let options = BatchOptions {
            concurrency: Some(2),
            ..BatchOptions::default()
        };
        coordinator
            .run_batch(items, &template(), options, Some(callback), None)
            .await;

        let snapshots = snapshots.lock().unwrap();
        let last = snapshots.last().expect("at least one snapshot");
        assert_eq!(last.total, 5);
        assert_eq!(last.completed, 5);
        assert_eq!(last.errors.len(), 1);
        assert_eq!(last.errors[0].url, e);
        assert!(last.cross_page_pass);

        // a is linked from b and c; b's self-link and c's external
        // link count for nothing.
        let page_a = store.get_page(ProjectId(1), a).await.unwrap().unwrap();
        assert_eq!(page_a.inbound_links, 2);
        assert_eq!(page_a.outbound, vec![b.to_string(), c.to_string()]);
        assert!(page_a.last_audited.is_some());
        assert_eq!(page_a.retrieval_cost, Some(20.0));
        assert_eq!(page_a.title.as_deref(), Some("Title for https://site.test/a"));

        let page_b = store.get_page(ProjectId(1), b).await.unwrap().unwrap();
        assert_eq!(page_b.inbound_links, 1);

        let page_d = store.get_page(ProjectId(1), d).await.unwrap().unwrap();
        assert_eq!(page_d.inbound_links, 0);
        assert!(page_d.outbound.is_empty());

        // The failed item keeps its untouched record.
        let page_e = store.get_page(ProjectId(1), e).await.unwrap().unwrap();
        assert!(page_e.last_audited.is_none());
        assert!(page_e.retrieval_cost.is_none());
    }

    #[tokio::test]
    async fn cancellation_before_start_claims_no_items() {
        let a = "https://site.test/a";
        let fetcher = Arc::new(RosterFetcher::new(vec![(a, vec![])]));
        let store = seeded_store(&[a]).await;
        let coordinator = coordinator(Arc::clone(&fetcher), Arc::clone(&store));

        let cancel = CancelFlag::new();
        cancel.cancel();
        let (callback, snapshots) = capture();
        coordinator
            .run_batch(
                vec![PageRecord::new(ProjectId(1), a)],
                &template(),
                BatchOptions::default(),
                Some(callback),
                Some(cancel),
            )
            .await;

        let snapshots = snapshots.lock().unwrap();
        let last = snapshots.last().expect("at least one snapshot");
        assert_eq!(last.total, 1);
        assert_eq!(last.completed, 0);
        assert!(!last.cross_page_pass);
        assert!(fetcher.fetched().is_empty());

        let page = store.get_page(ProjectId(1), a).await.unwrap().unwrap();
        assert!(page.last_audited.is_none());
    }

    #[tokio::test]
    async fn skip_audited_drops_timestamped_pages() {
        let fresh = "https://site.test/fresh";
        let stale = "https://site.test/stale";
        let fetcher = Arc::new(RosterFetcher::new(vec![(fresh, vec![]), (stale, vec![])]));
        let store = seeded_store(&[fresh, stale]).await;
        let coordinator = coordinator(Arc::clone(&fetcher), Arc::clone(&store));

        let mut audited = PageRecord::new(ProjectId(1), stale);
        audited.last_audited = Some(Utc::now());
        let items = vec![PageRecord::new(ProjectId(1), fresh), audited];
        let (callback, snapshots) = capture();
        let options = BatchOptions {
            skip_audited: Some(true),
            ..BatchOptions::default()
        };
        coordinator
            .run_batch(items, &template(), options, Some(callback), None)
            .await;

        assert_eq!(fetcher.fetched(), vec![fresh.to_string()]);
        let last = snapshots.lock().unwrap().last().cloned().unwrap();
        assert_eq!(last.total, 1);
        assert_eq!(last.completed, 1);
    }

    #[tokio::test]
    async fn priority_orders_the_roster_and_max_pages_caps_it() {
        let x = "https://site.test/x";
        let y = "https://site.test/y";
        let z = "https://site.test/z";
        let fetcher = Arc::new(RosterFetcher::new(vec![
            (x, vec![]),
            (y, vec![]),
            (z, vec![]),
        ]));
        let store = seeded_store(&[x, y, z]).await;
        let coordinator = coordinator(Arc::clone(&fetcher), Arc::clone(&store));

        let mut low = PageRecord::new(ProjectId(1), y);
        low.priority = Some(2.0);
        let mut high = PageRecord::new(ProjectId(1), z);
        high.priority = Some(5.0);
        let unranked = PageRecord::new(ProjectId(1), x);

        let options = BatchOptions {
            concurrency: Some(1),
            max_pages: Some(2),
            ..BatchOptions::default()
        };
        coordinator
            .run_batch(
                vec![unranked, low, high],
                &template(),
                options,
                None,
                None,
            )
            .await;

        // Highest priority first; the unranked page falls past the cap.
        assert_eq!(fetcher.fetched(), vec![z.to_string(), y.to_string()]);
    }

    #[tokio::test]
    async fn backfill_fills_only_costless_pages_with_reports() {
        let priced = "https://site.test/priced";
        let scored = "https://site.test/scored";
        let silent = "https://site.test/silent";
        let store = Arc::new(SqliteStore::in_memory().expect("in-memory store"));

        let mut page = PageRecord::new(ProjectId(1), priced);
        page.retrieval_cost = Some(5.0);
        store.upsert_page(&page).await.unwrap();
        store
            .upsert_page(&PageRecord::new(ProjectId(1), scored))
            .await
            .unwrap();
        store
            .upsert_page(&PageRecord::new(ProjectId(1), silent))
            .await
            .unwrap();

        let now = Utc::now();
        let report = UnifiedAuditReport {
            project: ProjectId(1),
            url: Some(scored.to_string()),
            phases: Vec::new(),
            overall_score: 80.0,
            cannibalization_risks: Vec::new(),
            merge_suggestions: Vec::new(),
            missing_topics: Vec::new(),
            rule_inventory: Vec::new(),
            started_at: now,
            finished_at: now,
            duration_ms: 1,
            content_fetch_failed: false,
            provider: Some("roster".to_string()),
        };
        store.save_report(&report).await.unwrap();

        let fetcher = Arc::new(RosterFetcher::new(vec![]));
        let coordinator = coordinator(fetcher, Arc::clone(&store));
        let updated = coordinator
            .backfill_retrieval_cost(ProjectId(1))
            .await
            .unwrap();
        assert_eq!(updated, 1);

        let scored_page = store.get_page(ProjectId(1), scored).await.unwrap().unwrap();
        assert_eq!(scored_page.retrieval_cost, Some(20.0));
        let priced_page = store.get_page(ProjectId(1), priced).await.unwrap().unwrap();
        assert_eq!(priced_page.retrieval_cost, Some(5.0));
        let silent_page = store.get_page(ProjectId(1), silent).await.unwrap().unwrap();
        assert!(silent_page.retrieval_cost.is_none());
    }

    #[test]
    fn retrieval_cost_adds_a_fetch_penalty_and_clamps() {
        assert!((retrieval_cost(80.0, false) - 20.0).abs() < f64::EPSILON);
        assert!((retrieval_cost(95.5, true) - 14.5).abs() < f64::EPSILON);
        assert!((retrieval_cost(0.0, true) - 100.0).abs() < f64::EPSILON);
        assert!((retrieval_cost(100.0, false)).abs() < f64::EPSILON);
    }

    #[test]
    fn priority_sort_is_stable_and_url_tied() {
        let mut items = vec![
            PageRecord::new(ProjectId(1), "https://site.test/b"),
            PageRecord::new(ProjectId(1), "https://site.test/a"),
        ];
        items[0].priority = Some(1.0);
        let mut ranked = PageRecord::new(ProjectId(1), "https://site.test/c");
        ranked.priority = Some(1.0);
        items.push(ranked);

        sort_by_priority(&mut items);
        let urls: Vec<&str> = items.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://site.test/b",
                "https://site.test/c",
                "https://site.test/a"
            ]
        );
    }
}
