use chrono::{DateTime, Utc};

use crate::types::{FixRecord, PageRecord, ProjectId, UnifiedAuditReport};

/// The persistence boundary for audit runs. The pipeline and batch
/// coordinator treat every write as best-effort: failures are logged and
/// the in-memory result is still returned.
#[async_trait::async_trait]
pub trait AuditStore: Send + Sync + std::fmt::Debug {
    // ── Page inventory ─────────────────────────────────────────────

    /// Insert or update a page row, keyed by `(project, url)`.
    async fn upsert_page(&self, page: &PageRecord) -> crate::error::Result<()>;

    /// Get a page by its URL.
    async fn get_page(
        &self,
        project: ProjectId,
        url: &str,
    ) -> crate::error::Result<Option<PageRecord>>;

    /// All pages for a project, ordered by URL.
    async fn list_pages(&self, project: ProjectId) -> crate::error::Result<Vec<PageRecord>>;

    /// Stamp a page as audited.
    async fn mark_audited(
        &self,
        project: ProjectId,
        url: &str,
        at: DateTime<Utc>,
    ) -> crate::error::Result<()>;

    /// Write the derived inbound count and outbound target list produced by
    /// a cross-page pass.
    async fn update_link_counts(
        &self,
        project: ProjectId,
        url: &str,
        inbound: u32,
        outbound: &[String],
    ) -> crate::error::Result<()>;

    /// Write a page's derived retrieval-cost score.
    async fn update_retrieval_cost(
        &self,
        project: ProjectId,
        url: &str,
        cost: f64,
    ) -> crate::error::Result<()>;

    // ── Report snapshots ───────────────────────────────────────────

    /// Persist a finished report snapshot.
    async fn save_report(&self, report: &UnifiedAuditReport) -> crate::error::Result<()>;

    /// Most recent report snapshot for a URL, if any.
    async fn latest_report(
        &self,
        project: ProjectId,
        url: &str,
    ) -> crate::error::Result<Option<UnifiedAuditReport>>;

    // ── Fix history ────────────────────────────────────────────────

    /// Record an applied auto-fix.
    async fn record_fix(
        &self,
        project: ProjectId,
        url: &str,
        rule: &str,
        description: &str,
    ) -> crate::error::Result<()>;

    /// Fixes applied to a page, oldest first.
    async fn fix_history(
        &self,
        project: ProjectId,
        url: &str,
    ) -> crate::error::Result<Vec<FixRecord>>;
}
