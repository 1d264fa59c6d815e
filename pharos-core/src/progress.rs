//! Progress reporting for audit runs and batch jobs.
//!
//! Interactive frontends use `IndicatifReporter` for user-visible bars.
//! Library callers can use `NoopReporter` or provide their own
//! implementation, and subscribe to per-run events through the
//! callback aliases.

use std::sync::atomic::{AtomicU64, Ordering};

use indicatif::{ProgressBar, ProgressStyle};

use crate::types::BatchAuditProgress;

// ── Audit run events ───────────────────────────────────────────────

/// Lifecycle events emitted while one page's audit runs.
#[derive(Debug, Clone, PartialEq)]
pub enum AuditEvent {
    /// A phase is about to execute.
    PhaseStarted {
        phase: String,
        /// Zero-based position in the request's phase list.
        index: usize,
        total: usize,
    },
    /// A phase finished (successfully or synthesized after a failure).
    PhaseFinished { phase: String, score: f64 },
    /// The run is complete and the report is about to be returned.
    Completed { overall_score: f64 },
}

/// Callback for per-run audit events.
pub type AuditEventFn<'a> = dyn Fn(&AuditEvent) + Send + Sync + 'a;

/// Callback receiving owned batch progress snapshots.
pub type BatchProgressFn = dyn Fn(BatchAuditProgress) + Send + Sync;

// ── Reporters ──────────────────────────────────────────────────────

/// Trait for reporting progress of long-running operations.
pub trait ProgressReporter: Send + Sync {
    /// Begin a new task with an optional total count.
    fn start(&self, task: &str, total: Option<u64>);

    /// Advance progress by the given amount.
    fn advance(&self, amount: u64);

    /// Mark the current task as finished.
    fn finish(&self);

    /// Display an informational message.
    fn message(&self, msg: &str);
}

/// No-op reporter for library callers that don't need progress output.
#[derive(Debug, Default)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn start(&self, _task: &str, _total: Option<u64>) {}
    fn advance(&self, _amount: u64) {}
    fn finish(&self) {}
    fn message(&self, _msg: &str) {}
}

/// Reporter backed by `indicatif` progress bars.
#[derive(Debug)]
pub struct IndicatifReporter {
    bar: ProgressBar,
    completed: AtomicU64,
}

impl Default for IndicatifReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl IndicatifReporter {
    pub fn new() -> Self {
        Self {
            bar: ProgressBar::hidden(),
            completed: AtomicU64::new(0),
        }
    }

    /// Mirror a batch progress snapshot onto the bar: position, current
    /// URL, and an error tally in the message.
    pub fn observe_batch(&self, progress: &BatchAuditProgress) {
        self.bar.set_length(progress.total as u64);
        self.bar.set_position(progress.completed as u64);
        let mut msg = progress.current_url.clone().unwrap_or_default();
        if !progress.errors.is_empty() {
            msg.push_str(&format!(" ({} failed)", progress.errors.len()));
        }
        self.bar.set_message(msg);
    }
}

impl ProgressReporter for IndicatifReporter {
    fn start(&self, task: &str, total: Option<u64>) {
        self.completed.store(0, Ordering::Relaxed);
        if let Some(total) = total {
            self.bar.set_length(total);
            self.bar.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} {msg} [{bar:30.cyan/blue}] {pos}/{len} ({eta})",
                )
                .unwrap()
                .progress_chars("=> "),
            );
        } else {
            self.bar.set_length(0);
            self.bar.set_style(
                ProgressStyle::with_template("{spinner:.green} {msg} {pos} items").unwrap(),
            );
        }
        self.bar.set_message(task.to_string());
        self.bar.reset();
    }

    fn advance(&self, amount: u64) {
        self.completed.fetch_add(amount, Ordering::Relaxed);
        self.bar.inc(amount);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }

    fn message(&self, msg: &str) {
        self.bar.println(msg);
    }
}
