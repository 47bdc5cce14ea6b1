//! Text summary builder for CLI output.

use crate::model::{MetricsReport, RunConfig};

/// Pre-formatted lines for text output.
pub struct TextSummary {
    pub lines: Vec<String>,
}

pub fn build_text_summary(cfg: &RunConfig, report: &MetricsReport) -> TextSummary {
    let mut lines = Vec::new();

    lines.push(format!(
        "Project: {} ({} finished crawls, {} spiders)",
        cfg.project, report.completed_count, cfg.concurrency
    ));
    lines.push(format!(
        "Crawl duration: avg {:.2}s  shortest {:.2}s  longest {:.2}s",
        report.average_duration, report.shortest_duration, report.longest_duration
    ));
    lines.push(format!(
        "Batch span: {:.2}s ({})",
        report.total_duration,
        humantime::format_duration(std::time::Duration::from_secs(
            report.total_duration.max(0.0).round() as u64
        ))
    ));
    lines.push(format!(
        "Crawls per hour: single {:.2}  all spiders {:.2}",
        report.single_per_hour, report.fleet_per_hour
    ));
    lines.push(format!(
        "Crawls per day:  single {:.2}  all spiders {:.2}",
        report.single_per_day, report.fleet_per_day
    ));
    lines.push(format!(
        "Crawls per week: single {:.2}  all spiders {:.2}",
        report.single_per_week, report.fleet_per_week
    ));

    TextSummary { lines }
}
