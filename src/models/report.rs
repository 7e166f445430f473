//! Cycle state and per-cycle reports.

use std::fmt;

use chrono::{DateTime, Utc};

/// Where a cycle currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CycleState {
    #[default]
    Idle,
    FetchingSnapshot,
    Diffing,
    Processing,
    Done,
    Failed,
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CycleState::Idle => "idle",
            CycleState::FetchingSnapshot => "fetching-snapshot",
            CycleState::Diffing => "diffing",
            CycleState::Processing => "processing",
            CycleState::Done => "done",
            CycleState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Counts produced by the batch processor. Logged, never used for retries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessingReport {
    pub attempted: usize,
    pub enrichment_failures: usize,
    pub notify_failures: usize,
    pub notified: usize,
    pub recorded: usize,
    /// Record calls the ledger answered with "already exists"
    pub already_known: usize,
}

/// Summary of one completed cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub snapshot_size: usize,
    pub known_size: usize,
    pub new_count: usize,
    pub processing: ProcessingReport,
}

impl CycleReport {
    /// Key/value rows for the summary log.
    pub fn summary_items(&self) -> Vec<(&'static str, String)> {
        let elapsed = self.finished_at - self.started_at;
        vec![
            ("Snapshot", self.snapshot_size.to_string()),
            ("Known", self.known_size.to_string()),
            ("New", self.new_count.to_string()),
            ("Notified", self.processing.notified.to_string()),
            ("Recorded", self.processing.recorded.to_string()),
            (
                "Enrichment failures",
                self.processing.enrichment_failures.to_string(),
            ),
            ("Notify failures", self.processing.notify_failures.to_string()),
            ("Elapsed", format!("{}ms", elapsed.num_milliseconds())),
        ]
    }
}
