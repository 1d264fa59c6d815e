pub mod link_flow;
pub mod semantic;
pub mod sitewide;
pub mod types;

pub use link_flow::{FlowThresholds, LinkGraph, analyze_flow};
pub use semantic::{SemanticThresholds, distance_matrix, semantic_distance, should_link};
pub use sitewide::site_wide_audit;
pub use types::{normalize_url, round2};

/// Error type for the site-graph engine.
#[derive(thiserror::Error, Debug)]
pub enum GraphError {
    #[error("Malformed brief for page {page}: {message}")]
    Brief { page: String, message: String },

    #[error("Page not in the site graph: {0}")]
    UnknownPage(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;
