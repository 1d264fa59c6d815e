// Integration test utilities and fixture management for Pharos.

use std::collections::HashMap;
use std::sync::{Arc, Once};

use pharos_core::config::PharosConfig;
use pharos_core::error::{AuditError, FetchError};
use pharos_core::fetch::{ContentFetcher, EnrichedContent, FallbackFetcher};
use pharos_core::phase::{AuditPhase, PhaseRegistry, SemanticDistancePhase};
use pharos_core::pipeline::AuditPipeline;
use pharos_core::store::AuditStore;
use pharos_core::types::{
    AuditRequest, AuditTarget, PageRecord, PhaseResult, ProjectId, UnifiedAuditReport,
};
use pharos_graphs::types::{
    AttributeCategory, BridgeLink, BridgeSection, ClusterRole, EavTriple, PageBrief, PageId,
    PageNode, TopicalClass,
};

pub const HUB_URL: &str = "https://brew.test/guides";
pub const FRENCH_PRESS_URL: &str = "https://brew.test/french-press";
pub const ESPRESSO_URL: &str = "https://brew.test/espresso";
pub const GRINDER_URL: &str = "https://brew.test/grinder";
pub const TWIN_URL: &str = "https://brew.test/espresso-basics";
pub const GHOST_URL: &str = "https://brew.test/ghost";

static TRACING: Once = Once::new();

/// Install a test subscriber once per binary. `RUST_LOG` overrides the
/// default warn-only filter.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .init();
    });
}

// ── Site fixture ───────────────────────────────────────────────────

/// One page of an in-memory site.
#[derive(Debug, Clone)]
pub struct SitePage {
    pub url: String,
    pub title: String,
    pub text: String,
    pub links: Vec<String>,
    pub entities: Vec<String>,
    /// Whether the page matches the site's central entity.
    pub central: bool,
}

impl SitePage {
    pub fn new(url: &str, title: &str, text: &str, links: &[&str], entities: &[&str]) -> Self {
        Self {
            url: url.to_string(),
            title: title.to_string(),
            text: text.to_string(),
            links: links.iter().map(|l| (*l).to_string()).collect(),
            entities: entities.iter().map(|e| (*e).to_string()).collect(),
            central: false,
        }
    }
}

/// A small in-memory site: pages with synthesized HTML, ready to serve
/// through [`StaticFetcher`] and to project into graph-analysis inputs.
#[derive(Debug, Clone)]
pub struct TestSite {
    pub project: ProjectId,
    pub pages: Vec<SitePage>,
    /// URLs in the roster that no fetcher can serve.
    pub ghosts: Vec<String>,
}

impl TestSite {
    /// Four-page coffee site: a hub linking three guides, every guide
    /// linking back to the hub.
    pub fn brew_guides() -> Self {
        let pages = vec![
            SitePage::new(
                HUB_URL,
                "Brewing Guides",
                "Every brewing method we cover, from immersion to espresso.",
                &[FRENCH_PRESS_URL, ESPRESSO_URL, GRINDER_URL],
                &["brewing", "methods"],
            ),
            SitePage::new(
                FRENCH_PRESS_URL,
                "French Press Brewing",
                "Coarse grounds, four minutes, a slow plunge.",
                &[HUB_URL],
                &["french press", "immersion"],
            ),
            SitePage::new(
                ESPRESSO_URL,
                "Espresso Fundamentals",
                "The definition of espresso: fine grind, nine bars of pressure, \
                 25 to 30 seconds.",
                &[HUB_URL],
                &["espresso", "pressure"],
            ),
            SitePage::new(
                GRINDER_URL,
                "Choosing a Grinder",
                "Burr grinders beat blades for grind consistency.",
                &[HUB_URL, ESPRESSO_URL],
                &["grinder", "burr"],
            ),
        ];
        Self {
            project: ProjectId(1),
            pages,
            ghosts: Vec::new(),
        }
    }

    /// [`Self::brew_guides`] plus a page that duplicates the espresso
    /// guide's entity set, so the pair competes for the same topic.
    pub fn with_competing_twin() -> Self {
        let mut site = Self::brew_guides();
        let mut twin = SitePage::new(
            TWIN_URL,
            "Espresso Basics",
            "Fine grind, nine bars, half a minute.",
            &[HUB_URL],
            &["espresso", "pressure"],
        );
        twin.central = true;
        site.pages.push(twin);
        for page in &mut site.pages {
            if page.url == ESPRESSO_URL {
                page.central = true;
            }
        }
        site
    }

    /// [`Self::brew_guides`] plus a roster entry no fetcher can serve.
    pub fn with_ghost_page() -> Self {
        let mut site = Self::brew_guides();
        site.ghosts.push(GHOST_URL.to_string());
        site
    }

    /// The batch roster: every page plus every ghost.
    pub fn records(&self) -> Vec<PageRecord> {
        self.pages
            .iter()
            .map(|p| p.url.as_str())
            .chain(self.ghosts.iter().map(String::as_str))
            .map(|url| PageRecord::new(self.project, url))
            .collect()
    }

    /// Graph-analysis projection: the first page is the pillar, the rest
    /// are spokes under it, all in one "core" segment.
    pub fn page_nodes(&self) -> Vec<PageNode> {
        self.pages
            .iter()
            .zip(1_i64..)
            .map(|(page, id)| PageNode {
                id: PageId(id),
                url: page.url.clone(),
                title: page.title.clone(),
                segment: "core".to_string(),
                class: TopicalClass::Informational,
                role: if id == 1 {
                    ClusterRole::Pillar
                } else {
                    ClusterRole::Spoke
                },
                parent: (id > 1).then_some(PageId(1)),
                entities: page.entities.clone(),
                extraction_confidence: 0.9,
                matches_central_entity: page.central,
                matches_source_context: false,
            })
            .collect()
    }

    /// Per-page briefs whose bridge links mirror each page's outbound
    /// links, for feeding [`pharos_graphs::LinkGraph::build`].
    pub fn briefs(&self) -> Vec<PageBrief> {
        self.page_nodes()
            .iter()
            .zip(&self.pages)
            .map(|(node, page)| PageBrief {
                page: node.id,
                bridge: vec![BridgeSection {
                    heading: "Related".to_string(),
                    links: page
                        .links
                        .iter()
                        .map(|url| BridgeLink {
                            target_url: url.clone(),
                            anchor: "related reading".to_string(),
                        })
                        .collect(),
                }],
            })
            .collect()
    }

    /// Reference entity-attribute triples for the missing-topic check.
    /// The espresso guide covers "definition" but not "crema formation".
    pub fn reference_triples() -> Vec<EavTriple> {
        vec![
            EavTriple {
                entity: "espresso".to_string(),
                attribute: "definition".to_string(),
                value: "concentrated coffee brewed under pressure".to_string(),
                category: AttributeCategory::Root,
            },
            EavTriple {
                entity: "espresso".to_string(),
                attribute: "crema formation".to_string(),
                value: "emulsified oils on top of the shot".to_string(),
                category: AttributeCategory::Unique,
            },
        ]
    }

    pub fn fallback_fetcher(&self) -> FallbackFetcher {
        FallbackFetcher::new().with_provider(Arc::new(StaticFetcher::for_site(self)))
    }
}

// ── Fetcher stubs ──────────────────────────────────────────────────

/// Serves [`TestSite`] pages from memory; unknown URLs fail like a
/// network error.
#[derive(Debug)]
pub struct StaticFetcher {
    pages: HashMap<String, EnrichedContent>,
}

impl StaticFetcher {
    pub fn for_site(site: &TestSite) -> Self {
        let pages = site
            .pages
            .iter()
            .map(|page| {
                let anchors: String = page
                    .links
                    .iter()
                    .map(|l| format!("<a href=\"{l}\">{l}</a>"))
                    .collect();
                let content = EnrichedContent {
                    html: Some(format!(
                        "<html><head><title>{}</title></head>\
                         <body><p>{}</p><nav>{anchors}</nav></body></html>",
                        page.title, page.text
                    )),
                    text: Some(page.text.clone()),
                    title: Some(page.title.clone()),
                    links: page.links.clone(),
                    metadata: HashMap::new(),
                    provider: "static".to_string(),
                    duration_ms: 3,
                };
                (page.url.clone(), content)
            })
            .collect();
        Self { pages }
    }
}

#[async_trait::async_trait]
impl ContentFetcher for StaticFetcher {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch(&self, url: &str) -> pharos_core::error::Result<EnrichedContent> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| AuditError::Fetch(FetchError::Network(format!("no route to {url}"))))
    }
}

/// Fetcher that refuses every URL.
#[derive(Debug)]
pub struct FailingFetcher;

#[async_trait::async_trait]
impl ContentFetcher for FailingFetcher {
    fn name(&self) -> &str {
        "failing"
    }

    async fn fetch(&self, url: &str) -> pharos_core::error::Result<EnrichedContent> {
        Err(AuditError::Fetch(FetchError::Network(format!(
            "connection refused: {url}"
        ))))
    }
}

// ── Phase stubs ────────────────────────────────────────────────────

/// Phase stub returning a fixed score, for wiring tests that don't need
/// real rules.
#[derive(Debug)]
pub struct ScoringPhase {
    name: String,
    score: f64,
}

impl ScoringPhase {
    pub fn new(name: &str, score: f64) -> Self {
        Self {
            name: name.to_string(),
            score,
        }
    }
}

#[async_trait::async_trait]
impl AuditPhase for ScoringPhase {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(
        &self,
        _request: &AuditRequest,
        _content: Option<&EnrichedContent>,
    ) -> pharos_core::error::Result<PhaseResult> {
        Ok(PhaseResult {
            phase: self.name.clone(),
            score: self.score,
            weight: 0.0,
            passed_checks: 4,
            total_checks: 5,
            findings: Vec::new(),
            summary: "4/5 checks passed".to_string(),
        })
    }
}

/// Phase stub that always fails, for failure-isolation tests.
#[derive(Debug)]
pub struct ExplodingPhase {
    name: String,
}

impl ExplodingPhase {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl AuditPhase for ExplodingPhase {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(
        &self,
        _request: &AuditRequest,
        _content: Option<&EnrichedContent>,
    ) -> pharos_core::error::Result<PhaseResult> {
        Err(AuditError::Phase {
            phase: self.name.clone(),
            message: "synthetic failure".to_string(),
        })
    }
}

// ── Runners ────────────────────────────────────────────────────────

/// Pipeline over the site's static fetcher with the standard phases: a
/// fixed-score content-structure phase plus the semantic-distance phase
/// over the site's page nodes.
pub fn site_pipeline(site: &TestSite) -> AuditPipeline {
    let config = PharosConfig::default();
    let mut registry = PhaseRegistry::new();
    registry.register(Arc::new(ScoringPhase::new("content-structure", 80.0)));
    registry.register(Arc::new(SemanticDistancePhase::new(
        site.page_nodes(),
        &config.audit,
    )));
    AuditPipeline::new(config, registry, site.fallback_fetcher())
}

/// Request for one page of the site running both standard phases, with
/// the configured default weights.
pub fn site_request(site: &TestSite, url: &str) -> AuditRequest {
    let mut request = AuditRequest::new(site.project, AuditTarget::Internal);
    request.url = Some(url.to_string());
    request.phases = vec![
        "content-structure".to_string(),
        "semantic-distance".to_string(),
    ];
    request
}

/// The latest stored report for a URL, or an error naming the URL.
pub async fn stored_report(
    store: &dyn AuditStore,
    project: ProjectId,
    url: &str,
) -> anyhow::Result<UnifiedAuditReport> {
    store
        .latest_report(project, url)
        .await?
        .ok_or_else(|| anyhow::anyhow!("no stored report for {url}"))
}
