//! Run lifecycle: fetch the job listing, compute the report, write it out.
//!
//! Every step is fallible and the first error ends the run. Nothing is
//! written to disk unless the fetch and the calculation both succeed.

use std::path::{Path, PathBuf};

use crate::client::ScrapydClient;
use crate::error::Result;
use crate::metrics::MetricsCalculator;
use crate::model::{JobBatch, MetricsReport, RunConfig};
use crate::storage::{self, ReportExport};

/// Fetch finished jobs from the server and compute their report.
pub async fn collect_report(cfg: &RunConfig) -> Result<MetricsReport> {
    let client = ScrapydClient::new(cfg)?;
    let listing = client.list_jobs().await?;
    let batch = JobBatch::from_response(&listing)?;
    tracing::info!(
        project = %cfg.project,
        finished = batch.len(),
        "computing crawl metrics"
    );
    MetricsCalculator::new(cfg).compute(&batch)
}

/// Files written for a completed report.
#[derive(Debug, Clone)]
pub struct ProcessedRun {
    pub report: MetricsReport,
    pub csv_path: PathBuf,
    pub json_path: Option<PathBuf>,
}

/// Persist a report: the dated CSV always, the JSON export when asked for.
pub fn process_report(
    cfg: &RunConfig,
    report: MetricsReport,
    export_json: Option<&Path>,
) -> Result<ProcessedRun> {
    let csv_path = storage::save_report(cfg, &report)?;
    let json_path = match export_json {
        Some(path) => {
            storage::export_json(path, &ReportExport::new(cfg, &report))?;
            Some(path.to_path_buf())
        }
        None => None,
    };
    Ok(ProcessedRun {
        report,
        csv_path,
        json_path,
    })
}

/// Full run: fetch, compute, write.
pub async fn run_once(cfg: &RunConfig, export_json: Option<&Path>) -> Result<ProcessedRun> {
    let report = collect_report(cfg).await?;
    process_report(cfg, report, export_json)
}
