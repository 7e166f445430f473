// src/pipeline/batch.rs

//! Per-item processing of new listings.
//!
//! Each listing goes through enrich → notify → record, strictly in order,
//! with a fixed pause between listings. Enrichment and notification
//! failures stay contained to their listing; only a ledger that cannot be
//! written aborts the batch.

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::{
    BatchConfig, EnrichmentFailurePolicy, KnownEntry, ListingIdentity, ProcessingReport,
};
use crate::pipeline::enrich::Enricher;
use crate::pipeline::message::build_message;
use crate::pipeline::retry::RetryPolicy;
use crate::services::{DetailSource, NotificationSink};
use crate::storage::{Ledger, RecordOutcome};

/// Per-cycle values shared by every item.
#[derive(Debug, Clone, Copy)]
pub struct BatchContext<'a> {
    /// Ledger namespace to record into
    pub partition: &'a str,
    /// Cycle start, used as `first_seen_at` for every entry
    pub timestamp: DateTime<Utc>,
}

/// Drives new listings to completion with per-item fault isolation.
pub struct BatchProcessor<'a> {
    details: &'a dyn DetailSource,
    sink: &'a dyn NotificationSink,
    ledger: &'a dyn Ledger,
    config: BatchConfig,
    retry: RetryPolicy,
}

impl<'a> BatchProcessor<'a> {
    pub fn new(
        details: &'a dyn DetailSource,
        sink: &'a dyn NotificationSink,
        ledger: &'a dyn Ledger,
        config: BatchConfig,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            details,
            sink,
            ledger,
            config,
            retry,
        }
    }

    /// Process `identities` in order.
    ///
    /// Returns `Err` only when the ledger cannot record an item; items
    /// already handled keep their ledger entries.
    pub async fn process(
        &self,
        identities: &[ListingIdentity],
        context: &BatchContext<'_>,
    ) -> Result<ProcessingReport> {
        let enricher = Enricher::new(self.details, self.retry);
        let batch_size = self.config.batch_size.max(1);
        let batch_total = identities.len().div_ceil(batch_size);
        let mut report = ProcessingReport::default();

        for (batch_index, chunk) in identities.chunks(batch_size).enumerate() {
            log::debug!(
                "Batch {}/{}: {} listings",
                batch_index + 1,
                batch_total,
                chunk.len()
            );

            for identity in chunk {
                if report.attempted > 0 && !self.config.item_delay().is_zero() {
                    tokio::time::sleep(self.config.item_delay()).await;
                }
                report.attempted += 1;

                if let Err(e) = self
                    .process_item(&enricher, identity, context, &mut report)
                    .await
                {
                    log::error!(
                        "Batch aborted at listing {} of {}: {}",
                        report.attempted,
                        identities.len(),
                        e
                    );
                    log::error!("Partial report: {:?}", report);
                    return Err(e);
                }
            }
        }

        Ok(report)
    }

    async fn process_item(
        &self,
        enricher: &Enricher<'_>,
        identity: &ListingIdentity,
        context: &BatchContext<'_>,
        report: &mut ProcessingReport,
    ) -> Result<()> {
        // 1. Enrich
        let message = match enricher.fetch(identity).await {
            Ok(details) => build_message(identity, Some(&details)),
            Err(e) => {
                report.enrichment_failures += 1;
                match self.config.on_enrichment_failure {
                    EnrichmentFailurePolicy::Skip => {
                        log::warn!("Skipping {}: {}", identity, e);
                        return Ok(());
                    }
                    EnrichmentFailurePolicy::NotifyLinkOnly => {
                        log::warn!("Notifying {} without details: {}", identity, e);
                        build_message(identity, None)
                    }
                }
            }
        };

        // 2. Notify
        let sink = self.sink;
        let text = message.as_str();
        match self.retry.run("Notification", move || sink.deliver(text)).await {
            Ok(()) => {
                report.notified += 1;
                log::info!("Notified {}", identity);
            }
            Err(e) => {
                report.notify_failures += 1;
                log::warn!("Notification for {} failed: {}", identity, e);
            }
        }

        // 3. Record, whether or not the notification went out. Called once
        // per item; a failure here is a ledger outage and ends the cycle.
        let entry = KnownEntry::new(identity.clone(), context.timestamp, context.partition);
        let outcome = self.ledger.record(&entry).await.map_err(|e| match e {
            AppError::LedgerUnavailable(_) => e,
            other => AppError::ledger(other),
        })?;

        report.recorded += 1;
        if outcome == RecordOutcome::AlreadyExists {
            report.already_known += 1;
            log::debug!("{} was already in the ledger", identity);
        }
        Ok(())
    }
}
