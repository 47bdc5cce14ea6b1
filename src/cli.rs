use crate::model::RunConfig;
use crate::orchestrator::{self, ProcessedRun};
use crate::storage::ReportExport;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "overwatch",
    version,
    about = "Summarize scrapyd crawl throughput into a dated CSV report"
)]
pub struct Cli {
    /// Name of the scrapy project to report on
    #[arg(short = 'p', long, alias = "project-name")]
    pub project: String,

    /// Address of the scrapyd server, e.g. http://192.168.124.30
    #[arg(short = 'd', long, alias = "domain-name")]
    pub host: String,

    /// Port of the scrapyd server
    #[arg(short = 'P', long)]
    pub port: Option<u16>,

    /// Number of spiders the server runs concurrently
    #[arg(short = 's', long, alias = "concurrent-spiders", default_value_t = 50)]
    pub concurrency: usize,

    /// Timeout for the job listing request
    #[arg(long, default_value = "30s")]
    pub timeout: humantime::Duration,

    /// Root directory for reports; the CSV lands in <dir>/crawl_times
    #[arg(long, env = "DATA_EXPORT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long, conflicts_with = "text")]
    pub json: bool,

    /// Print a text summary (default)
    #[arg(long)]
    pub text: bool,

    /// Run silently: suppress all output except errors (for cron usage)
    #[arg(long)]
    pub silent: bool,

    /// Also export the report and run settings as JSON
    #[arg(long)]
    pub export_json: Option<PathBuf>,

    /// Log progress to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// Build a `RunConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> RunConfig {
    RunConfig {
        project: args.project.clone(),
        host: args.host.clone(),
        port: args.port,
        concurrency: args.concurrency,
        timeout: Duration::from(args.timeout),
        output_dir: args
            .output_dir
            .clone()
            .unwrap_or_else(crate::storage::default_output_dir),
    }
}

pub async fn run(args: Cli) -> Result<()> {
    let cfg = build_config(&args);
    tracing::debug!(?cfg, "starting run");

    let processed = orchestrator::run_once(&cfg, args.export_json.as_deref())
        .await
        .with_context(|| format!("crawl report for project {:?} failed", cfg.project))?;

    if args.silent {
        return Ok(());
    }
    print_report(&args, &cfg, &processed)
}

fn print_report(args: &Cli, cfg: &RunConfig, processed: &ProcessedRun) -> Result<()> {
    if args.json {
        let out = serde_json::to_string_pretty(&ReportExport::new(cfg, &processed.report))?;
        println!("{out}");
    } else {
        let summary = crate::text_summary::build_text_summary(cfg, &processed.report);
        for line in summary.lines {
            println!("{line}");
        }
    }

    eprintln!("Saved: {}", processed.csv_path.display());
    if let Some(p) = processed.json_path.as_deref() {
        eprintln!("Exported JSON: {}", p.display());
    }
    Ok(())
}
