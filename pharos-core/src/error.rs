/// Top-level Pharos error type.
///
/// All fallible operations in `pharos-core` return [`Result<T, AuditError>`](Result).
/// Each variant wraps a domain-specific error enum, allowing callers to
/// match on the error source without losing type information.
#[derive(thiserror::Error, Debug)]
pub enum AuditError {
    /// Error fetching or enriching page content.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Error from the page/report store layer (`SQLite` operations).
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Error from the site-graph engine (briefs, link flow, clustering).
    #[error("Graph engine error: {0}")]
    Graph(#[from] pharos_graphs::GraphError),

    /// Error raised by an audit phase. The pipeline converts these into
    /// zero-score phase results instead of propagating them.
    #[error("Phase '{phase}' failed: {message}")]
    Phase {
        /// Name of the phase that failed.
        phase: String,
        /// Description of the failure.
        message: String,
    },

    /// Error resolving redirects or robots directives.
    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// Error in configuration parsing or validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors while fetching page content from a provider.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    /// Network-level failure reaching the page.
    #[error("Network error: {0}")]
    Network(String),

    /// Provider returned a non-success HTTP status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// URL that produced it.
        url: String,
    },

    /// The URL could not be parsed.
    #[error("Invalid URL {url}: {message}")]
    InvalidUrl {
        /// The offending URL text.
        url: String,
        /// Description of the parse failure.
        message: String,
    },

    /// Every registered provider failed for the URL.
    #[error("All content providers failed for {0}")]
    AllProvidersFailed(String),
}

/// Errors from the SQLite-backed audit store.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Underlying `SQLite` operation failed.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Schema migration failed (version mismatch or DDL error).
    #[error("Migration failed: {0}")]
    Migration(String),

    /// A referenced page was not found in the store.
    #[error("Page not found: {0}")]
    PageNotFound(String),

    /// JSON serialization/deserialization of a stored report failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from the redirect and robots resolvers.
#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
    /// A redirect Location header was missing or unparseable.
    #[error("Bad redirect from {url}: {message}")]
    BadRedirect {
        /// URL whose response was malformed.
        url: String,
        /// Description of the problem.
        message: String,
    },

    /// Network-level failure while walking a chain.
    #[error("Network error: {0}")]
    Network(String),
}

/// Errors in Pharos configuration parsing and validation.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist at the expected path.
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// Configuration values are present but semantically invalid.
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// Configuration file syntax could not be parsed (TOML error).
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Convenience alias for `Result<T, AuditError>`.
pub type Result<T> = std::result::Result<T, AuditError>;
