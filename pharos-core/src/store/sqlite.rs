use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::StoreError;
use crate::types::{FixRecord, PageRecord, ProjectId, UnifiedAuditReport};

use super::schema;
use super::traits::AuditStore;

/// `SQLite`-backed implementation of [`AuditStore`].
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open (or create) a store at the given path.
    pub fn open(path: &Path) -> crate::error::Result<Self> {
        let conn = Connection::open(path).map_err(StoreError::Sqlite)?;
        let store = Self {
            conn: Mutex::new(conn),
            db_path: Some(path.to_path_buf()),
        };
        store.initialize()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> crate::error::Result<Self> {
        let conn = Connection::open_in_memory().map_err(StoreError::Sqlite)?;
        let store = Self {
            conn: Mutex::new(conn),
            db_path: None,
        };
        store.initialize()?;
        Ok(store)
    }

    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn initialize(&self) -> crate::error::Result<()> {
        let conn = self.conn.lock().expect("pharos store mutex poisoned");

        // Performance pragmas (WAL is silently ignored for in-memory)
        conn.execute_batch(
            "PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -64000;
             PRAGMA foreign_keys = ON;",
        )
        .map_err(StoreError::Sqlite)?;
        let _ = conn.execute_batch("PRAGMA journal_mode = WAL;");

        conn.execute_batch(schema::SCHEMA_SQL)
            .map_err(StoreError::Sqlite)?;

        conn.execute(
            "INSERT OR IGNORE INTO pharos_meta (key, value) VALUES ('schema_version', ?1)",
            params![schema::SCHEMA_VERSION],
        )
        .map_err(StoreError::Sqlite)?;

        let version: String = conn
            .query_row(
                "SELECT value FROM pharos_meta WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .map_err(StoreError::Sqlite)?;
        if version != schema::SCHEMA_VERSION {
            return Err(StoreError::Migration(format!(
                "store has schema version {version}, expected {}",
                schema::SCHEMA_VERSION
            ))
            .into());
        }

        Ok(())
    }

    fn row_to_page(row: &rusqlite::Row<'_>) -> rusqlite::Result<PageRecord> {
        let project: i64 = row.get("project")?;
        let last_audited: Option<String> = row.get("last_audited")?;
        let inbound: i64 = row.get("inbound_links")?;
        let outbound_json: String = row.get("outbound")?;
        Ok(PageRecord {
            project: ProjectId(project),
            url: row.get("url")?,
            title: row.get("title")?,
            // Unparseable timestamps read back as "never audited".
            last_audited: last_audited
                .as_deref()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            inbound_links: u32::try_from(inbound).unwrap_or(0),
            outbound: serde_json::from_str(&outbound_json).unwrap_or_default(),
            cached_content: row.get("cached_content")?,
            retrieval_cost: row.get("retrieval_cost")?,
            priority: row.get("priority")?,
        })
    }
}

#[async_trait::async_trait]
impl AuditStore for SqliteStore {
    async fn upsert_page(&self, page: &PageRecord) -> crate::error::Result<()> {
        let conn = self.conn.lock().expect("pharos store mutex poisoned");
        let outbound = serde_json::to_string(&page.outbound).map_err(StoreError::Serialization)?;
        let last_audited = page.last_audited.map(|at| at.to_rfc3339());
        conn.execute(
            "INSERT INTO pages (project, url, title, last_audited, inbound_links, outbound,
                                cached_content, retrieval_cost, priority)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(project, url) DO UPDATE SET
                title = excluded.title,
                last_audited = excluded.last_audited,
                inbound_links = excluded.inbound_links,
                outbound = excluded.outbound,
                cached_content = excluded.cached_content,
                retrieval_cost = excluded.retrieval_cost,
                priority = excluded.priority",
            params![
                page.project.0,
                page.url,
                page.title,
                last_audited,
                page.inbound_links,
                outbound,
                page.cached_content,
                page.retrieval_cost,
                page.priority
            ],
        )
        .map_err(StoreError::Sqlite)?;
        Ok(())
    }

    async fn get_page(
        &self,
        project: ProjectId,
        url: &str,
    ) -> crate::error::Result<Option<PageRecord>> {
        let conn = self.conn.lock().expect("pharos store mutex poisoned");
        let page = conn
            .query_row(
                "SELECT project, url, title, last_audited, inbound_links, outbound,
                        cached_content, retrieval_cost, priority
                 FROM pages WHERE project = ?1 AND url = ?2",
                params![project.0, url],
                Self::row_to_page,
            )
            .optional()
            .map_err(StoreError::Sqlite)?;
        Ok(page)
    }

    async fn list_pages(&self, project: ProjectId) -> crate::error::Result<Vec<PageRecord>> {
        let conn = self.conn.lock().expect("pharos store mutex poisoned");
        let mut stmt = conn
            .prepare(
                "SELECT project, url, title, last_audited, inbound_links, outbound,
                        cached_content, retrieval_cost, priority
                 FROM pages WHERE project = ?1 ORDER BY url",
            )
            .map_err(StoreError::Sqlite)?;
        let pages = stmt
            .query_map(params![project.0], Self::row_to_page)
            .map_err(StoreError::Sqlite)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::Sqlite)?;
        Ok(pages)
    }

    async fn mark_audited(
        &self,
        project: ProjectId,
        url: &str,
        at: DateTime<Utc>,
    ) -> crate::error::Result<()> {
        let conn = self.conn.lock().expect("pharos store mutex poisoned");
        let changed = conn
            .execute(
                "UPDATE pages SET last_audited = ?3 WHERE project = ?1 AND url = ?2",
                params![project.0, url, at.to_rfc3339()],
            )
            .map_err(StoreError::Sqlite)?;
        if changed == 0 {
            return Err(StoreError::PageNotFound(url.to_string()).into());
        }
        Ok(())
    }

    async fn update_link_counts(
        &self,
        project: ProjectId,
        url: &str,
        inbound: u32,
        outbound: &[String],
    ) -> crate::error::Result<()> {
        let conn = self.conn.lock().expect("pharos store mutex poisoned");
        let outbound_json = serde_json::to_string(outbound).map_err(StoreError::Serialization)?;
        let changed = conn
            .execute(
                "UPDATE pages SET inbound_links = ?3, outbound = ?4
                 WHERE project = ?1 AND url = ?2",
                params![project.0, url, inbound, outbound_json],
            )
            .map_err(StoreError::Sqlite)?;
        if changed == 0 {
            return Err(StoreError::PageNotFound(url.to_string()).into());
        }
        Ok(())
    }

    async fn update_retrieval_cost(
        &self,
        project: ProjectId,
        url: &str,
        cost: f64,
    ) -> crate::error::Result<()> {
        let conn = self.conn.lock().expect("pharos store mutex poisoned");
        let changed = conn
            .execute(
                "UPDATE pages SET retrieval_cost = ?3 WHERE project = ?1 AND url = ?2",
                params![project.0, url, cost],
            )
            .map_err(StoreError::Sqlite)?;
        if changed == 0 {
            return Err(StoreError::PageNotFound(url.to_string()).into());
        }
        Ok(())
    }

    async fn save_report(&self, report: &UnifiedAuditReport) -> crate::error::Result<()> {
        let conn = self.conn.lock().expect("pharos store mutex poisoned");
        let data = serde_json::to_string(report).map_err(StoreError::Serialization)?;
        conn.execute(
            "INSERT INTO reports (project, url, overall_score, data, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                report.project.0,
                report.url,
                report.overall_score,
                data,
                report.finished_at.to_rfc3339()
            ],
        )
        .map_err(StoreError::Sqlite)?;
        Ok(())
    }

    async fn latest_report(
        &self,
        project: ProjectId,
        url: &str,
    ) -> crate::error::Result<Option<UnifiedAuditReport>> {
        let conn = self.conn.lock().expect("pharos store mutex poisoned");
        let data: Option<String> = conn
            .query_row(
                "SELECT data FROM reports WHERE project = ?1 AND url = ?2
                 ORDER BY id DESC LIMIT 1",
                params![project.0, url],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::Sqlite)?;
        match data {
            Some(json) => Ok(Some(
                serde_json::from_str(&json).map_err(StoreError::Serialization)?,
            )),
            None => Ok(None),
        }
    }

    async fn record_fix(
        &self,
        project: ProjectId,
        url: &str,
        rule: &str,
        description: &str,
    ) -> crate::error::Result<()> {
        let conn = self.conn.lock().expect("pharos store mutex poisoned");
        conn.execute(
            "INSERT INTO fix_history (project, url, rule, description, applied_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![project.0, url, rule, description, Utc::now().to_rfc3339()],
        )
        .map_err(StoreError::Sqlite)?;
        Ok(())
    }

    async fn fix_history(
        &self,
        project: ProjectId,
        url: &str,
    ) -> crate::error::Result<Vec<FixRecord>> {
        let conn = self.conn.lock().expect("pharos store mutex poisoned");
        let mut stmt = conn
            .prepare(
                "SELECT url, rule, description, applied_at FROM fix_history
                 WHERE project = ?1 AND url = ?2 ORDER BY id",
            )
            .map_err(StoreError::Sqlite)?;
        let fixes = stmt
            .query_map(params![project.0, url], |row| {
                let applied_at: String = row.get("applied_at")?;
                Ok(FixRecord {
                    url: row.get("url")?,
                    rule: row.get("rule")?,
                    description: row.get("description")?,
                    applied_at: DateTime::parse_from_rfc3339(&applied_at)
                        .map(|dt| dt.with_timezone(&Utc))
                        .unwrap_or_default(),
                })
            })
            .map_err(StoreError::Sqlite)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::Sqlite)?;
        Ok(fixes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuditError;

    fn project() -> ProjectId {
        ProjectId(7)
    }

    fn page(url: &str) -> PageRecord {
        let mut page = PageRecord::new(project(), url);
        page.title = Some("A Page".to_string());
        page.outbound = vec!["https://site.test/other".to_string()];
        page.priority = Some(3.5);
        page
    }

    fn report(url: &str, score: f64) -> UnifiedAuditReport {
        UnifiedAuditReport {
            project: project(),
            url: Some(url.to_string()),
            phases: Vec::new(),
            overall_score: score,
            cannibalization_risks: Vec::new(),
            merge_suggestions: Vec::new(),
            missing_topics: Vec::new(),
            rule_inventory: Vec::new(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            duration_ms: 12,
            content_fetch_failed: false,
            provider: Some("http".to_string()),
        }
    }

    #[tokio::test]
    async fn upsert_then_get_round_trips() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .upsert_page(&page("https://site.test/a"))
            .await
            .unwrap();

        let loaded = store
            .get_page(project(), "https://site.test/a")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.title.as_deref(), Some("A Page"));
        assert_eq!(loaded.outbound, vec!["https://site.test/other".to_string()]);
        assert_eq!(loaded.priority, Some(3.5));
        assert!(loaded.last_audited.is_none());
    }

    #[tokio::test]
    async fn upsert_overwrites_on_conflict() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .upsert_page(&page("https://site.test/a"))
            .await
            .unwrap();

        let mut updated = page("https://site.test/a");
        updated.title = Some("Renamed".to_string());
        store.upsert_page(&updated).await.unwrap();

        let pages = store.list_pages(project()).await.unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].title.as_deref(), Some("Renamed"));
    }

    #[tokio::test]
    async fn list_pages_is_sorted_and_project_scoped() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .upsert_page(&page("https://site.test/b"))
            .await
            .unwrap();
        store
            .upsert_page(&page("https://site.test/a"))
            .await
            .unwrap();
        store
            .upsert_page(&PageRecord::new(ProjectId(99), "https://elsewhere.test/"))
            .await
            .unwrap();

        let pages = store.list_pages(project()).await.unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].url, "https://site.test/a");
        assert_eq!(pages[1].url, "https://site.test/b");
    }

    #[tokio::test]
    async fn mark_audited_stamps_the_page() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .upsert_page(&page("https://site.test/a"))
            .await
            .unwrap();

        let at = Utc::now();
        store
            .mark_audited(project(), "https://site.test/a", at)
            .await
            .unwrap();
        let loaded = store
            .get_page(project(), "https://site.test/a")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.last_audited.unwrap().timestamp(), at.timestamp());
    }

    #[tokio::test]
    async fn updates_on_unknown_pages_fail_with_page_not_found() {
        let store = SqliteStore::in_memory().unwrap();
        let err = store
            .mark_audited(project(), "https://site.test/none", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuditError::Store(StoreError::PageNotFound(_))
        ));
    }

    #[tokio::test]
    async fn link_counts_and_cost_are_updatable() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .upsert_page(&page("https://site.test/a"))
            .await
            .unwrap();

        let outbound = vec![
            "https://site.test/b".to_string(),
            "https://site.test/c".to_string(),
        ];
        store
            .update_link_counts(project(), "https://site.test/a", 4, &outbound)
            .await
            .unwrap();
        store
            .update_retrieval_cost(project(), "https://site.test/a", 37.5)
            .await
            .unwrap();

        let loaded = store
            .get_page(project(), "https://site.test/a")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.inbound_links, 4);
        assert_eq!(loaded.outbound, outbound);
        assert_eq!(loaded.retrieval_cost, Some(37.5));
    }

    #[tokio::test]
    async fn latest_report_returns_the_newest_snapshot() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store
            .latest_report(project(), "https://site.test/a")
            .await
            .unwrap()
            .is_none());

        store
            .save_report(&report("https://site.test/a", 70.0))
            .await
            .unwrap();
        store
            .save_report(&report("https://site.test/a", 85.5))
            .await
            .unwrap();

        let latest = store
            .latest_report(project(), "https://site.test/a")
            .await
            .unwrap()
            .unwrap();
        assert!((latest.overall_score - 85.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn fix_history_appends_in_order() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .record_fix(project(), "https://site.test/a", "img-alt", "added alt text")
            .await
            .unwrap();
        store
            .record_fix(project(), "https://site.test/a", "canonical", "set canonical")
            .await
            .unwrap();

        let fixes = store
            .fix_history(project(), "https://site.test/a")
            .await
            .unwrap();
        assert_eq!(fixes.len(), 2);
        assert_eq!(fixes[0].rule, "img-alt");
        assert_eq!(fixes[1].rule, "canonical");
    }

    #[tokio::test]
    async fn open_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            assert_eq!(store.path(), Some(path.as_path()));
            store
                .upsert_page(&page("https://site.test/a"))
                .await
                .unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let loaded = store
            .get_page(project(), "https://site.test/a")
            .await
            .unwrap();
        assert!(loaded.is_some());
    }
}
