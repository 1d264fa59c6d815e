//! Pharos core library — audit pipeline, batch coordinator, fetchers, and store.
//!
//! The main entry point is [`pipeline::AuditPipeline`], which runs an
//! [`types::AuditRequest`] through its registered phases and assembles a
//! [`types::UnifiedAuditReport`]. [`batch::BatchCoordinator`] drives the
//! pipeline over a page roster under bounded concurrency.

pub mod batch;
pub mod config;
pub mod error;
pub mod fetch;
pub mod inventory;
pub mod phase;
pub mod pipeline;
pub mod progress;
pub mod resolve;
pub mod store;
pub mod types;
