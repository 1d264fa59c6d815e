use serde::{Deserialize, Serialize};

// ── Typed ID wrappers ──────────────────────────────────────────────

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
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

typed_id!(PageId);
typed_id!(ClusterId);

// ── Page nodes ─────────────────────────────────────────────────────

/// Commercial intent of a page within the site's topical map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TopicalClass {
    /// Pages that convert: product, service, comparison pages.
    Monetization,
    /// Pages that inform: guides, definitions, reference material.
    Informational,
}

impl TopicalClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monetization => "Monetization",
            Self::Informational => "Informational",
        }
    }
}

impl std::fmt::Display for TopicalClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural role of a page inside its topic cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClusterRole {
    /// Hub page that child pages support.
    Pillar,
    /// Supporting page under a pillar.
    Spoke,
    /// Page with no cluster affiliation.
    Standalone,
}

impl ClusterRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pillar => "Pillar",
            Self::Spoke => "Spoke",
            Self::Standalone => "Standalone",
        }
    }
}

impl std::fmt::Display for ClusterRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A page in the site graph — the fundamental unit of site-wide analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageNode {
    pub id: PageId,
    pub url: String,
    pub title: String,
    /// Content segment label (e.g. "core", "outer").
    pub segment: String,
    pub class: TopicalClass,
    pub role: ClusterRole,
    /// Parent page in the topical hierarchy, if any.
    pub parent: Option<PageId>,
    /// Named entities the page covers, as extracted from its content.
    pub entities: Vec<String>,
    /// Confidence of the entity extraction (0.0 - 1.0).
    pub extraction_confidence: f64,
    /// Whether the page's topic matches the site's central entity.
    pub matches_central_entity: bool,
    /// Whether the page's angle matches the site's source context.
    pub matches_source_context: bool,
}

impl PageNode {
    /// Whether this page sits in the core content segment.
    pub fn is_core(&self) -> bool {
        self.segment.eq_ignore_ascii_case("core")
    }
}

// ── Link edges ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkKind {
    /// In-body link declared in a content brief.
    Contextual,
    /// Implicit parent → child link from the topical hierarchy.
    Hierarchical,
}

impl LinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contextual => "Contextual",
            Self::Hierarchical => "Hierarchical",
        }
    }
}

/// A directed internal link between two known pages.
///
/// Parallel edges between the same pair are legal as long as their
/// anchors differ.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkEdge {
    pub source: PageId,
    pub target: PageId,
    pub anchor: String,
    pub kind: LinkKind,
}

// ── Content briefs ─────────────────────────────────────────────────

/// A planned in-body link inside a brief section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeLink {
    pub target_url: String,
    pub anchor: String,
}

/// One contextual-bridge section of a content brief.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeSection {
    pub heading: String,
    #[serde(default)]
    pub links: Vec<BridgeLink>,
}

/// Boundary shape for bridge data: briefs in the wild carry either a
/// single section object or a list of them. Deserialized once and
/// normalized into `Vec<BridgeSection>` — nothing downstream ever
/// sniffs the shape again.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BridgeInput {
    Sections(Vec<BridgeSection>),
    Single(BridgeSection),
}

impl BridgeInput {
    pub fn into_sections(self) -> Vec<BridgeSection> {
        match self {
            Self::Sections(sections) => sections,
            Self::Single(section) => vec![section],
        }
    }
}

/// A content brief attached to a page: the planned link structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageBrief {
    pub page: PageId,
    pub bridge: Vec<BridgeSection>,
}

impl PageBrief {
    pub fn new(page: PageId, bridge: BridgeInput) -> Self {
        Self {
            page,
            bridge: bridge.into_sections(),
        }
    }

    /// Parse a brief's bridge payload from raw JSON, accepting either a
    /// single section object or a list of sections.
    pub fn from_json(page: PageId, payload: &serde_json::Value) -> crate::Result<Self> {
        let input: BridgeInput =
            serde_json::from_value(payload.clone()).map_err(|e| crate::GraphError::Brief {
                page: page.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self::new(page, input))
    }
}

// ── Entity-attribute-value triples ─────────────────────────────────

/// How strongly an attribute characterizes its entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeCategory {
    /// Defining attribute every treatment of the entity must cover.
    Root,
    /// Attribute that differentiates this site's treatment.
    Unique,
    /// Attribute covered by few competitors.
    Rare,
    /// Attribute covered by most competitors.
    Common,
}

impl AttributeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Root => "Root",
            Self::Unique => "Unique",
            Self::Rare => "Rare",
            Self::Common => "Common",
        }
    }
}

/// One entity-attribute-value fact from the site's knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EavTriple {
    pub entity: String,
    pub attribute: String,
    pub value: String,
    pub category: AttributeCategory,
}

// ── Link flow analysis ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationKind {
    /// Monetization page links out to an informational page.
    ReverseFlow,
    /// Non-pillar page no other page links to.
    Orphaned,
    /// Pillar whose children never link back to it.
    NoClusterSupport,
    /// Page whose outbound count exceeds the configured threshold.
    ExcessiveOutbound,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReverseFlow => "ReverseFlow",
            Self::Orphaned => "Orphaned",
            Self::NoClusterSupport => "NoClusterSupport",
            Self::ExcessiveOutbound => "ExcessiveOutbound",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationSeverity {
    Critical,
    Warning,
}

/// A structural problem found in the internal link graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowViolation {
    pub kind: ViolationKind,
    pub source: PageId,
    /// The page on the receiving end, where one exists.
    pub target: Option<PageId>,
    pub severity: ViolationSeverity,
    pub recommendation: String,
}

/// How concentrated a page's outbound authority is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DilutionLevel {
    High,
    Medium,
    Low,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DilutionRisk {
    pub page: PageId,
    pub level: DilutionLevel,
    pub total_outbound: usize,
    /// Share of outbound links pointing at the single most-linked target.
    pub top_target_share: f64,
}

/// Output of the link flow analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkFlowAnalysis {
    pub violations: Vec<FlowViolation>,
    /// 100 minus weighted deductions, floored at zero.
    pub flow_score: f64,
    pub dilution: Vec<DilutionRisk>,
    pub pages_analyzed: usize,
}

// ── Semantic analysis ──────────────────────────────────────────────

/// A multi-member group of semantically close pages.
///
/// Pages that cluster with nobody are implicit singletons and are not
/// listed here; every page belongs to exactly one cluster or to its own
/// singleton, never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityCluster {
    pub id: ClusterId,
    /// Most frequent entity across the member pages.
    pub central_entity: String,
    pub members: Vec<PageId>,
    /// 1 minus the mean intra-cluster distance (1.0 for singletons).
    pub cohesion: f64,
}

/// Pairwise semantic distance between two pages, with the linking verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticDistanceEntry {
    pub a: PageId,
    pub b: PageId,
    /// 0.0 = identical topics, 1.0 = unrelated.
    pub distance: f64,
    /// True iff distance sits in the productive linking band.
    pub should_link: bool,
    pub rationale: String,
}

/// A defect in the site's entity coverage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GraphIssue {
    /// The same single-valued attribute carries conflicting values.
    InconsistentAttribute {
        entity: String,
        attribute: String,
        values: Vec<String>,
    },
    /// An entity appears on pages but in no knowledge-base triple.
    IsolatedEntity { entity: String },
    /// A cluster whose cohesion falls below the configured floor.
    WeakCluster { cluster: ClusterId, cohesion: f64 },
    /// A core-segment page missing most of the expected root attributes.
    MissingCoreAttributes { page: PageId, missing: Vec<String> },
}

/// Output of the semantic clustering engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeGraphAnalysis {
    pub clusters: Vec<EntityCluster>,
    pub distances: Vec<SemanticDistanceEntry>,
    pub orphan_pages: Vec<PageId>,
    pub issues: Vec<GraphIssue>,
}

// ── Site-wide composite ────────────────────────────────────────────

/// Weighted composite of the site-level structural scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteWideAuditResult {
    pub score: f64,
    pub link_score: f64,
    pub flow_score: f64,
    pub ngram_score: f64,
}

// ── URL normalization ──────────────────────────────────────────────

/// Canonicalize a URL for identity comparison: drop the fragment, drop
/// the trailing slash, lowercase. Idempotent.
pub fn normalize_url(url: &str) -> String {
    let without_fragment = url.split('#').next().unwrap_or(url);
    let trimmed = without_fragment.trim().trim_end_matches('/');
    trimmed.to_lowercase()
}

/// Round to two decimal places, the precision every reported score uses.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topical_class_serde_round_trip() {
        for class in [TopicalClass::Monetization, TopicalClass::Informational] {
            let json = serde_json::to_string(&class).unwrap();
            let back: TopicalClass = serde_json::from_str(&json).unwrap();
            assert_eq!(class, back);
        }
    }

    #[test]
    fn cluster_role_serde_round_trip() {
        for role in [
            ClusterRole::Pillar,
            ClusterRole::Spoke,
            ClusterRole::Standalone,
        ] {
            let json = serde_json::to_string(&role).unwrap();
            let back: ClusterRole = serde_json::from_str(&json).unwrap();
            assert_eq!(role, back);
        }
    }

    #[test]
    fn attribute_category_serde_round_trip() {
        for cat in [
            AttributeCategory::Root,
            AttributeCategory::Unique,
            AttributeCategory::Rare,
            AttributeCategory::Common,
        ] {
            let json = serde_json::to_string(&cat).unwrap();
            let back: AttributeCategory = serde_json::from_str(&json).unwrap();
            assert_eq!(cat, back);
        }
    }

    #[test]
    fn typed_id_display() {
        assert_eq!(PageId(42).to_string(), "42");
        assert_eq!(ClusterId(7).to_string(), "7");
    }

    #[test]
    fn bridge_input_single_object() {
        let json = r#"{"heading": "Related reading", "links": [{"target_url": "https://example.com/a", "anchor": "guide"}]}"#;
        let input: BridgeInput = serde_json::from_str(json).unwrap();
        let sections = input.into_sections();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].heading, "Related reading");
        assert_eq!(sections[0].links.len(), 1);
    }

    #[test]
    fn bridge_input_section_list() {
        let json = r#"[
            {"heading": "Intro", "links": []},
            {"heading": "Deep dive", "links": [{"target_url": "/b", "anchor": "next"}]}
        ]"#;
        let input: BridgeInput = serde_json::from_str(json).unwrap();
        let sections = input.into_sections();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].links[0].anchor, "next");
    }

    #[test]
    fn bridge_section_missing_links_defaults_empty() {
        let json = r#"{"heading": "No links here"}"#;
        let section: BridgeSection = serde_json::from_str(json).unwrap();
        assert!(section.links.is_empty());
    }

    #[test]
    fn brief_from_json_rejects_foreign_shapes() {
        let payload = serde_json::json!({"unexpected": true});
        let err = PageBrief::from_json(PageId(3), &payload).unwrap_err();
        assert!(err.to_string().contains("page 3"), "got: {err}");

        let ok = PageBrief::from_json(
            PageId(3),
            &serde_json::json!({"heading": "Links", "links": []}),
        )
        .unwrap();
        assert_eq!(ok.bridge.len(), 1);
    }

    #[test]
    fn normalize_url_strips_fragment_slash_and_case() {
        assert_eq!(
            normalize_url("https://Example.com/Page/#section"),
            "https://example.com/page"
        );
        assert_eq!(normalize_url("https://example.com"), "https://example.com");
    }

    #[test]
    fn page_node_core_segment_check() {
        let page = PageNode {
            id: PageId(1),
            url: "https://example.com/a".into(),
            title: "A".into(),
            segment: "Core".into(),
            class: TopicalClass::Informational,
            role: ClusterRole::Spoke,
            parent: None,
            entities: vec![],
            extraction_confidence: 1.0,
            matches_central_entity: false,
            matches_source_context: false,
        };
        assert!(page.is_core());
    }

    // ── Property-based tests ──────────────────────────────────────

    mod proptests {
        use proptest::prelude::*;

        use super::*;

        fn arb_violation_kind() -> impl Strategy<Value = ViolationKind> {
            prop_oneof![
                Just(ViolationKind::ReverseFlow),
                Just(ViolationKind::Orphaned),
                Just(ViolationKind::NoClusterSupport),
                Just(ViolationKind::ExcessiveOutbound),
            ]
        }

        fn arb_dilution() -> impl Strategy<Value = DilutionLevel> {
            prop_oneof![
                Just(DilutionLevel::High),
                Just(DilutionLevel::Medium),
                Just(DilutionLevel::Low),
                Just(DilutionLevel::None),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(100))]

            #[test]
            fn normalize_url_idempotent(url in "[a-zA-Z0-9:/#._-]{0,60}") {
                let once = normalize_url(&url);
                let twice = normalize_url(&once);
                prop_assert_eq!(once, twice);
            }

            #[test]
            fn normalize_url_drops_fragment(base in "[a-z0-9:/._-]{1,40}", frag in "[a-z0-9]{0,10}") {
                let with_fragment = format!("{base}#{frag}");
                prop_assert_eq!(normalize_url(&with_fragment), normalize_url(&base));
            }

            #[test]
            fn violation_kind_serde_roundtrip(kind in arb_violation_kind()) {
                let json = serde_json::to_string(&kind).unwrap();
                let back: ViolationKind = serde_json::from_str(&json).unwrap();
                prop_assert_eq!(back, kind);
            }

            #[test]
            fn dilution_serde_roundtrip(level in arb_dilution()) {
                let json = serde_json::to_string(&level).unwrap();
                let back: DilutionLevel = serde_json::from_str(&json).unwrap();
                prop_assert_eq!(back, level);
            }

            #[test]
            fn typed_id_roundtrip(id in any::<i64>()) {
                let page_id = PageId(id);
                let json = serde_json::to_string(&page_id).unwrap();
                let back: PageId = serde_json::from_str(&json).unwrap();
                prop_assert_eq!(back, page_id);
            }

            #[test]
            fn round2_is_idempotent(v in -1000.0f64..1000.0) {
                let once = round2(v);
                prop_assert_eq!(round2(once), once);
            }
        }
    }
}
