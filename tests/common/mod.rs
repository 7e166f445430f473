//! In-memory doubles of the four pipeline collaborators.
//!
//! Every double appends to a shared event log (`"enrich:A"`, `"notify:A"`,
//! `"record:A"`, ...) so tests can assert the exact call order.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use watcher::error::{AppError, Result};
use watcher::models::{
    Config, DetailField, KnownEntry, ListingIdentity, RawDetails, SearchQuery,
};
use watcher::pipeline::PipelineRunner;
use watcher::services::{DetailSource, NotificationSink, SnapshotSource};
use watcher::storage::{Ledger, RecordOutcome};

pub type Events = Arc<Mutex<Vec<String>>>;

pub fn events() -> Events {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn ids(values: &[&str]) -> Vec<ListingIdentity> {
    values.iter().map(|v| ListingIdentity::new(*v)).collect()
}

/// Config with no inter-item delay and near-instant retries.
pub fn fast_config() -> Config {
    let mut config = Config::default();
    config.batch.item_delay_ms = 0;
    config.retry.max_attempts = 3;
    config.retry.backoff_base_ms = 1;
    config.retry.backoff_max_ms = 2;
    config
}

fn log_event(events: &Events, kind: &str, subject: &str) {
    events.lock().unwrap().push(format!("{kind}:{subject}"));
}

/// Last path segment of a listing link, or the link itself.
fn short(identity: &str) -> &str {
    identity.rsplit('/').next().unwrap_or(identity)
}

// ----------------------------------------------------------------------
// Snapshot
// ----------------------------------------------------------------------

pub enum SnapshotScript {
    Listings(Vec<ListingIdentity>),
    Fail,
}

pub struct ScriptedSnapshot {
    script: Mutex<SnapshotScript>,
    delay: Mutex<Option<Duration>>,
    pub calls: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl ScriptedSnapshot {
    pub fn new(listings: Vec<ListingIdentity>) -> Self {
        Self {
            script: Mutex::new(SnapshotScript::Listings(listings)),
            delay: Mutex::new(None),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        let snapshot = Self::new(Vec::new());
        snapshot.set(SnapshotScript::Fail);
        snapshot
    }

    pub fn set(&self, script: SnapshotScript) {
        *self.script.lock().unwrap() = script;
    }

    /// Make every call take `delay` (tokio time).
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotSource for ScriptedSnapshot {
    async fn fetch_listings(&self, _query: &SearchQuery) -> Result<Vec<ListingIdentity>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match &*self.script.lock().unwrap() {
            SnapshotScript::Listings(listings) => Ok(listings.clone()),
            SnapshotScript::Fail => Err(AppError::snapshot("overview returned HTTP 503")),
        }
    }
}

// ----------------------------------------------------------------------
// Details
// ----------------------------------------------------------------------

/// Returns the same attributes for every listing unless told otherwise.
pub struct MapDetails {
    events: Events,
    failing: Mutex<HashSet<String>>,
    /// Remaining transient failures per identity
    flaky: Mutex<HashMap<String, usize>>,
}

impl MapDetails {
    pub fn new(events: Events) -> Self {
        Self {
            events,
            failing: Mutex::new(HashSet::new()),
            flaky: Mutex::new(HashMap::new()),
        }
    }

    pub fn fail_for(self, identity: &str) -> Self {
        self.failing.lock().unwrap().insert(identity.to_string());
        self
    }

    pub fn flaky_for(self, identity: &str, failures: usize) -> Self {
        self.flaky
            .lock()
            .unwrap()
            .insert(identity.to_string(), failures);
        self
    }

    pub fn raw() -> RawDetails {
        let mut raw = RawDetails::new();
        raw.insert(DetailField::Price, "€1,500".into());
        raw.insert(DetailField::Bedrooms, "2".into());
        raw.insert(DetailField::ServiceCosts, "€50".into());
        raw.insert(DetailField::SurfaceArea, "75 m²".into());
        raw
    }
}

#[async_trait]
impl DetailSource for MapDetails {
    async fn fetch_raw(&self, identity: &ListingIdentity) -> Result<RawDetails> {
        log_event(&self.events, "enrich", short(identity.as_str()));

        if self.failing.lock().unwrap().contains(identity.as_str()) {
            return Err(AppError::validation("listing page has no details"));
        }
        if let Some(left) = self.flaky.lock().unwrap().get_mut(identity.as_str()) {
            if *left > 0 {
                *left -= 1;
                return Err(AppError::from(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "detail page timed out",
                )));
            }
        }
        Ok(Self::raw())
    }
}

// ----------------------------------------------------------------------
// Sink
// ----------------------------------------------------------------------

pub struct RecordingSink {
    events: Events,
    /// Messages whose link ends with one of these segments are rejected
    failing: Mutex<HashSet<String>>,
    pub messages: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new(events: Events) -> Self {
        Self {
            events,
            failing: Mutex::new(HashSet::new()),
            messages: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_for(self, segment: &str) -> Self {
        self.failing.lock().unwrap().insert(segment.to_string());
        self
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn deliver(&self, message: &str) -> Result<()> {
        let link = message.lines().last().unwrap_or_default();
        let segment = short(link).to_string();
        log_event(&self.events, "notify", &segment);

        if self.failing.lock().unwrap().contains(&segment) {
            return Err(AppError::notify("HTTP 400: chat not found", false));
        }
        self.messages.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

// ----------------------------------------------------------------------
// Ledger
// ----------------------------------------------------------------------

pub struct MemoryLedger {
    events: Events,
    rows: Mutex<HashMap<String, HashSet<ListingIdentity>>>,
    query_fails: Mutex<bool>,
    /// Record calls that succeed before every further one fails
    record_budget: Mutex<Option<usize>>,
}

impl MemoryLedger {
    pub fn new(events: Events) -> Self {
        Self {
            events,
            rows: Mutex::new(HashMap::new()),
            query_fails: Mutex::new(false),
            record_budget: Mutex::new(None),
        }
    }

    pub fn with_known(self, partition: &str, identities: &[&str]) -> Self {
        self.rows
            .lock()
            .unwrap()
            .entry(partition.to_string())
            .or_default()
            .extend(ids(identities));
        self
    }

    pub fn failing_query(self) -> Self {
        *self.query_fails.lock().unwrap() = true;
        self
    }

    pub fn failing_record_after(self, successes: usize) -> Self {
        *self.record_budget.lock().unwrap() = Some(successes);
        self
    }

    pub fn known(&self, partition: &str) -> HashSet<ListingIdentity> {
        self.rows
            .lock()
            .unwrap()
            .get(partition)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn query_known(&self, partition: &str) -> Result<HashSet<ListingIdentity>> {
        if *self.query_fails.lock().unwrap() {
            return Err(AppError::ledger("table service unreachable"));
        }
        Ok(self.known(partition))
    }

    async fn record(&self, entry: &KnownEntry) -> Result<RecordOutcome> {
        log_event(&self.events, "record", short(entry.identity.as_str()));

        if let Some(budget) = self.record_budget.lock().unwrap().as_mut() {
            if *budget == 0 {
                return Err(AppError::ledger("connection dropped"));
            }
            *budget -= 1;
        }

        let inserted = self
            .rows
            .lock()
            .unwrap()
            .entry(entry.partition.clone())
            .or_default()
            .insert(entry.identity.clone());
        Ok(if inserted {
            RecordOutcome::Inserted
        } else {
            RecordOutcome::AlreadyExists
        })
    }
}

// ----------------------------------------------------------------------
// Wiring
// ----------------------------------------------------------------------

pub struct Harness {
    pub events: Events,
    pub snapshot: Arc<ScriptedSnapshot>,
    pub details: Arc<MapDetails>,
    pub sink: Arc<RecordingSink>,
    pub ledger: Arc<MemoryLedger>,
}

impl Harness {
    pub fn new(
        events: Events,
        snapshot: ScriptedSnapshot,
        details: MapDetails,
        sink: RecordingSink,
        ledger: MemoryLedger,
    ) -> Self {
        Self {
            events,
            snapshot: Arc::new(snapshot),
            details: Arc::new(details),
            sink: Arc::new(sink),
            ledger: Arc::new(ledger),
        }
    }

    /// Doubles with default behavior over the given snapshot.
    pub fn with_listings(listings: &[&str]) -> Self {
        let events = events();
        Self::new(
            events.clone(),
            ScriptedSnapshot::new(ids(listings)),
            MapDetails::new(events.clone()),
            RecordingSink::new(events.clone()),
            MemoryLedger::new(events),
        )
    }

    pub fn runner(&self, config: &Config) -> PipelineRunner {
        PipelineRunner::new(
            config,
            self.snapshot.clone(),
            self.details.clone(),
            self.sink.clone(),
            self.ledger.clone(),
        )
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|e| e.as_str() == event).count()
    }
}
