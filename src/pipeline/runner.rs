// src/pipeline/runner.rs

//! One watch cycle: snapshot, diff against the ledger, process what is new.
//!
//! ```text
//! Idle → FetchingSnapshot → Diffing → Processing → Done
//!              │               │           │
//!              └───────────────┴───────────┴──→ Failed
//! ```
//!
//! A failed cycle leaves no partial work behind other than ledger entries of
//! listings that were fully processed; the next scheduled cycle starts over.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::{
    BatchConfig, Config, CycleReport, CycleState, ProcessingReport, SearchQuery,
};
use crate::pipeline::batch::{BatchContext, BatchProcessor};
use crate::pipeline::diff::calculate_diff;
use crate::pipeline::retry::RetryPolicy;
use crate::services::{
    DetailSource, HttpDetailSource, HttpSnapshotSource, NotificationSink, SnapshotSource,
    TelegramSink,
};
use crate::storage::{FileLedger, Ledger};
use crate::utils::http;
use crate::utils::log::{header, separator, summary};

/// Owns the four collaborators and drives cycles over them.
pub struct PipelineRunner {
    snapshot: Arc<dyn SnapshotSource>,
    details: Arc<dyn DetailSource>,
    sink: Arc<dyn NotificationSink>,
    ledger: Arc<dyn Ledger>,
    query: SearchQuery,
    partition: String,
    batch: BatchConfig,
    retry: RetryPolicy,
    state: CycleState,
}

impl PipelineRunner {
    pub fn new(
        config: &Config,
        snapshot: Arc<dyn SnapshotSource>,
        details: Arc<dyn DetailSource>,
        sink: Arc<dyn NotificationSink>,
        ledger: Arc<dyn Ledger>,
    ) -> Self {
        Self {
            snapshot,
            details,
            sink,
            ledger,
            query: config.query.clone(),
            partition: config.ledger.partition.clone(),
            batch: config.batch.clone(),
            retry: RetryPolicy::new(config.retry),
            state: CycleState::Idle,
        }
    }

    /// Wire the HTTP adapters and the file ledger under `storage_dir`.
    ///
    /// One HTTP client is shared by all adapters for the process lifetime.
    pub fn from_config(config: &Config, storage_dir: &Path) -> Result<Self> {
        let client = http::create_async_client(&config.http)?;
        let snapshot = HttpSnapshotSource::new(client.clone(), &config.selectors)?;
        let details = HttpDetailSource::new(client.clone(), &config.selectors)?;
        let sink = TelegramSink::new(client, &config.notify);
        let ledger = FileLedger::new(config.ledger.resolve_path(storage_dir));

        Ok(Self::new(
            config,
            Arc::new(snapshot),
            Arc::new(details),
            Arc::new(sink),
            Arc::new(ledger),
        ))
    }

    /// State reached by the most recent cycle.
    pub fn last_state(&self) -> CycleState {
        self.state
    }

    /// Run one cycle to `Done` or `Failed`.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        let started_at = Utc::now();
        self.transition(CycleState::Idle);
        header(&format!(
            "Watch cycle {}",
            started_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        match self.execute(started_at).await {
            Ok(report) => {
                self.transition(CycleState::Done);
                summary("Cycle complete", &report.summary_items());
                separator();
                Ok(report)
            }
            Err(e) => {
                self.transition(CycleState::Failed);
                match &e {
                    AppError::Snapshot(_) => log::warn!("Cycle failed: {}", e),
                    _ => log::error!("Cycle failed: {}", e),
                }
                separator();
                Err(e)
            }
        }
    }

    /// An empty overview fails the cycle instead of counting as "nothing new":
    /// a broken page cannot be told apart from a genuinely empty result.
    async fn execute(&mut self, started_at: DateTime<Utc>) -> Result<CycleReport> {
        self.transition(CycleState::FetchingSnapshot);
        let fresh = self
            .snapshot
            .fetch_listings(&self.query)
            .await
            .map_err(|e| match e {
                AppError::Snapshot(_) => e,
                other => AppError::snapshot(other),
            })?;
        if fresh.is_empty() {
            return Err(AppError::snapshot(format!(
                "no listings found at {}",
                self.query.to_url()
            )));
        }

        self.transition(CycleState::Diffing);
        let known = self
            .ledger
            .query_known(&self.partition)
            .await
            .map_err(|e| match e {
                AppError::LedgerUnavailable(_) => e,
                other => AppError::ledger(other),
            })?;
        let diff = calculate_diff(&fresh, &known);
        log::info!(
            "{} listings on overview, {} already known, {} new",
            fresh.len(),
            diff.already_known,
            diff.added.len()
        );
        if diff.duplicates > 0 {
            log::debug!("{} repeated links in snapshot", diff.duplicates);
        }

        self.transition(CycleState::Processing);
        let processing = if diff.has_changes() {
            let processor = BatchProcessor::new(
                self.details.as_ref(),
                self.sink.as_ref(),
                self.ledger.as_ref(),
                self.batch.clone(),
                self.retry,
            );
            let context = BatchContext {
                partition: &self.partition,
                timestamp: started_at,
            };
            processor.process(&diff.added, &context).await?
        } else {
            log::info!("No new listings");
            ProcessingReport::default()
        };

        Ok(CycleReport {
            started_at,
            finished_at: Utc::now(),
            snapshot_size: fresh.len(),
            known_size: known.len(),
            new_count: diff.added.len(),
            processing,
        })
    }

    fn transition(&mut self, next: CycleState) {
        if self.state != next {
            log::debug!("Cycle state {} → {}", self.state, next);
        }
        self.state = next;
    }
}
