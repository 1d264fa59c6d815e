use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use pharos_core::batch::{BatchCoordinator, BatchOptions};
use pharos_core::config::PharosConfig;
use pharos_core::error::{AuditError, FetchError};
use pharos_core::fetch::{ContentFetcher, EnrichedContent, FallbackFetcher};
use pharos_core::phase::{PhaseRegistry, SemanticDistancePhase};
use pharos_core::pipeline::AuditPipeline;
use pharos_core::store::{AuditStore, SqliteStore};
use pharos_core::types::{AuditRequest, AuditTarget, PageRecord, ProjectId};
use pharos_graphs::types::{ClusterRole, PageId, PageNode, TopicalClass};

const PROJECT: ProjectId = ProjectId(9);

fn threshold_ms(var: &str, default_ms: u64) -> Duration {
    let ms = std::env::var(var)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default_ms);
    Duration::from_millis(ms)
}

/// Serves generated pages from memory; every roster URL resolves.
#[derive(Debug)]
struct SyntheticFetcher {
    served: HashMap<String, EnrichedContent>,
}

#[async_trait::async_trait]
impl ContentFetcher for SyntheticFetcher {
    fn name(&self) -> &str {
        "synthetic"
    }

    async fn fetch(&self, url: &str) -> pharos_core::error::Result<EnrichedContent> {
        self.served
            .get(url)
            .cloned()
            .ok_or_else(|| AuditError::Fetch(FetchError::Network(format!("no route to {url}"))))
    }
}

/// Synthetic site sized for timing runs: pages 2k and 2k+1 share an entity
/// pair so every audit finds exactly one overlapping twin, and each page
/// links to the next in a cycle so the cross-page pass touches every row.
fn synthetic_site(page_count: usize) -> (Vec<PageRecord>, Vec<PageNode>, FallbackFetcher) {
    let mut records = Vec::with_capacity(page_count);
    let mut nodes = Vec::with_capacity(page_count);
    let mut served = HashMap::with_capacity(page_count);

    for i in 0..page_count {
        let url = format!("https://perf.test/page-{i}");
        let next = format!("https://perf.test/page-{}", (i + 1) % page_count);
        let title = format!("Guide {i}");

        records.push(PageRecord::new(PROJECT, url.as_str()));
        nodes.push(PageNode {
            id: PageId(i64::try_from(i).unwrap()),
            url: url.clone(),
            title: title.clone(),
            segment: "core".to_string(),
            class: TopicalClass::Informational,
            role: ClusterRole::Spoke,
            parent: None,
            entities: vec![format!("topic-{}", i / 2), "brewing".to_string()],
            extraction_confidence: 0.9,
            matches_central_entity: true,
            matches_source_context: false,
        });
        served.insert(
            url,
            EnrichedContent {
                html: Some(format!(
                    "<html><head><title>{title}</title></head>\
                     <body><p>Guide body {i}</p><a href=\"{next}\">next</a></body></html>"
                )),
                text: Some(format!("Guide body {i}")),
                title: Some(title),
                links: vec![next],
                metadata: HashMap::new(),
                provider: "synthetic".to_string(),
                duration_ms: 0,
            },
        );
    }

    let fetcher = FallbackFetcher::new().with_provider(Arc::new(SyntheticFetcher { served }));
    (records, nodes, fetcher)
}

fn perf_pipeline(
    nodes: Vec<PageNode>,
    fetcher: FallbackFetcher,
    store: Arc<dyn AuditStore>,
) -> AuditPipeline {
    let config = PharosConfig::default();
    let mut registry = PhaseRegistry::new();
    registry.register(Arc::new(SemanticDistancePhase::new(nodes, &config.audit)));
    AuditPipeline::new(config, registry, fetcher).with_store(store)
}

fn perf_request() -> AuditRequest {
    let mut request = AuditRequest::new(PROJECT, AuditTarget::Internal);
    request.phases = vec!["semantic-distance".to_string()];
    request
}

#[tokio::test]
#[ignore = "performance gate; run explicitly in CI/dev workflows"]
async fn perf_single_audit_under_threshold() {
    let (_, nodes, fetcher) = synthetic_site(400);
    let store: Arc<dyn AuditStore> = Arc::new(SqliteStore::in_memory().unwrap());
    let pipeline = perf_pipeline(nodes, fetcher, Arc::clone(&store));

    let mut request = perf_request();
    request.url = Some("https://perf.test/page-0".to_string());

    let t0 = Instant::now();
    let report = pipeline.run(&request, None, None).await;
    let elapsed = t0.elapsed();

    assert!(!report.content_fetch_failed);
    assert_eq!(report.phases.len(), 1);
    assert!(
        elapsed <= threshold_ms("PHAROS_PERF_SINGLE_MS", 5000),
        "single audit exceeded threshold: {elapsed:?}"
    );
}

#[tokio::test]
#[ignore = "performance gate; run explicitly in CI/dev workflows"]
async fn perf_batch_under_threshold() {
    let (records, nodes, fetcher) = synthetic_site(300);
    let store: Arc<dyn AuditStore> = Arc::new(SqliteStore::in_memory().unwrap());
    for record in &records {
        store.upsert_page(record).await.unwrap();
    }
    let pipeline = Arc::new(perf_pipeline(nodes, fetcher, Arc::clone(&store)));
    let coordinator = BatchCoordinator::new(pipeline, Arc::clone(&store));

    let options = BatchOptions {
        concurrency: Some(4),
        ..BatchOptions::default()
    };

    let t0 = Instant::now();
    coordinator
        .run_batch(records, &perf_request(), options, None, None)
        .await;
    let elapsed = t0.elapsed();

    let pages = store.list_pages(PROJECT).await.unwrap();
    assert_eq!(pages.len(), 300);
    assert!(pages.iter().all(|p| p.last_audited.is_some()));
    assert!(
        elapsed <= threshold_ms("PHAROS_PERF_BATCH_MS", 10_000),
        "batch run exceeded threshold: {elapsed:?}"
    );
}

#[tokio::test]
#[ignore = "performance gate; run explicitly in CI/dev workflows"]
async fn perf_skip_audited_rerun_under_threshold() {
    let (records, nodes, fetcher) = synthetic_site(200);
    let store: Arc<dyn AuditStore> = Arc::new(SqliteStore::in_memory().unwrap());
    for record in &records {
        store.upsert_page(record).await.unwrap();
    }
    let pipeline = Arc::new(perf_pipeline(nodes, fetcher, Arc::clone(&store)));
    let coordinator = BatchCoordinator::new(pipeline, Arc::clone(&store));

    coordinator
        .run_batch(records, &perf_request(), BatchOptions::default(), None, None)
        .await;
    let stamped: Vec<_> = store
        .list_pages(PROJECT)
        .await
        .unwrap()
        .into_iter()
        .map(|p| (p.url, p.last_audited))
        .collect();

    let roster = store.list_pages(PROJECT).await.unwrap();
    let options = BatchOptions {
        skip_audited: Some(true),
        ..BatchOptions::default()
    };
    let t0 = Instant::now();
    coordinator
        .run_batch(roster, &perf_request(), options, None, None)
        .await;
    let elapsed = t0.elapsed();

    let after: Vec<_> = store
        .list_pages(PROJECT)
        .await
        .unwrap()
        .into_iter()
        .map(|p| (p.url, p.last_audited))
        .collect();
    assert_eq!(stamped, after, "skip-audited rerun should touch nothing");
    assert!(
        elapsed <= threshold_ms("PHAROS_PERF_RERUN_MS", 6000),
        "skip-audited rerun exceeded threshold: {elapsed:?}"
    );
}
