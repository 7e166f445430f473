//! Watch pipeline.
//!
//! - `diff`: which snapshot entries are new
//! - `enrich`: detail parsing and derived metrics
//! - `batch`: per-item enrich → notify → record
//! - `runner`: one full cycle as a state machine
//! - `scheduler`: periodic, single-flight driver

pub mod batch;
pub mod diff;
pub mod enrich;
pub mod message;
pub mod retry;
pub mod runner;
pub mod scheduler;

pub use batch::{BatchContext, BatchProcessor};
pub use diff::{DiffResult, calculate_diff, diff};
pub use enrich::{Enricher, enrich_details, parse_details};
pub use message::build_message;
pub use retry::RetryPolicy;
pub use runner::PipelineRunner;
pub use scheduler::{Scheduler, SchedulerHandle};
