/// Current schema version.
pub const SCHEMA_VERSION: &str = "1";

/// Full SQL schema for the audit `SQLite` database.
pub const SCHEMA_SQL: &str = r"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS pharos_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Page inventory, one row per (project, url)
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project INTEGER NOT NULL,
    url TEXT NOT NULL,
    title TEXT,
    last_audited TEXT,
    inbound_links INTEGER NOT NULL DEFAULT 0,
    outbound TEXT NOT NULL DEFAULT '[]',
    cached_content TEXT,
    retrieval_cost REAL,
    priority REAL,
    UNIQUE(project, url)
);
CREATE INDEX IF NOT EXISTS idx_pages_project ON pages(project);

-- Report snapshots; the full report is stored as JSON
CREATE TABLE IF NOT EXISTS reports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project INTEGER NOT NULL,
    url TEXT,
    overall_score REAL NOT NULL,
    data TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_reports_project_url ON reports(project, url);

-- Applied auto-fixes
CREATE TABLE IF NOT EXISTS fix_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project INTEGER NOT NULL,
    url TEXT NOT NULL,
    rule TEXT NOT NULL,
    description TEXT NOT NULL,
    applied_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_fix_history_url ON fix_history(project, url);
";
