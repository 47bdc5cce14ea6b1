//! Report files: the dated CSV written on every run and the optional JSON export.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::error::{OverwatchError, Result};
use crate::model::{MetricsReport, RunConfig};

const REPORT_SUBDIR: &str = "crawl_times";

/// Fallback when neither `--output-dir` nor `DATA_EXPORT_DIR` is set.
pub fn default_output_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("crawl-overwatch")
}

/// Today's date in local time, falling back to UTC when the offset is unknown.
pub fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

/// `{output_dir}/crawl_times/{DD-MM-YYYY}_{project}.csv`
pub fn report_path(output_dir: &Path, project: &str, date: Date) -> PathBuf {
    let day = date
        .format(format_description!("[day]-[month]-[year]"))
        .unwrap_or_else(|_| date.to_string());
    output_dir
        .join(REPORT_SUBDIR)
        .join(format!("{day}_{project}.csv"))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    let wrap = |source| OverwatchError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(wrap)?;
    }
    fs::write(path, contents).map_err(wrap)
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// One header row of metric names and one row of values.
pub fn render_csv(report: &MetricsReport) -> String {
    let entries = report.entries();
    let header: Vec<String> = entries.iter().map(|(name, _)| csv_field(name)).collect();
    let row: Vec<String> = entries.iter().map(|(_, v)| csv_field(&v.render())).collect();
    format!("{}\r\n{}\r\n", header.join(","), row.join(","))
}

pub fn export_csv(path: &Path, report: &MetricsReport) -> Result<()> {
    write_file(path, &render_csv(report))?;
    tracing::info!(path = %path.display(), "wrote csv report");
    Ok(())
}

/// Write today's CSV report under `cfg.output_dir` and return its path.
pub fn save_report(cfg: &RunConfig, report: &MetricsReport) -> Result<PathBuf> {
    let path = report_path(&cfg.output_dir, &cfg.project, today());
    export_csv(&path, report)?;
    Ok(path)
}

#[derive(Debug, Serialize)]
pub struct ReportExport<'a> {
    pub generated_at: String,
    pub config: &'a RunConfig,
    pub report: &'a MetricsReport,
}

impl<'a> ReportExport<'a> {
    pub fn new(config: &'a RunConfig, report: &'a MetricsReport) -> Self {
        Self {
            generated_at: OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_else(|_| "now".into()),
            config,
            report,
        }
    }
}

pub fn export_json(path: &Path, export: &ReportExport<'_>) -> Result<()> {
    let out = serde_json::to_string_pretty(export)?;
    write_file(path, &out)?;
    tracing::info!(path = %path.display(), "wrote json export");
    Ok(())
}
