//! Crawl throughput reports for scrapyd.
//!
//! Fetches the finished jobs of one project from a scrapyd `listjobs.json`
//! endpoint, derives duration statistics and per-hour/day/week throughput
//! projections, and writes them to a dated CSV file.

pub mod cli;
pub mod client;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod orchestrator;
pub mod storage;
pub mod text_summary;
pub mod timestamp;

pub use error::{FetchError, OverwatchError, Result};
pub use metrics::MetricsCalculator;
pub use model::{JobBatch, JobRecord, MetricsReport, RunConfig};
