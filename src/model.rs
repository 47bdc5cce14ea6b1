use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use time::PrimitiveDateTime;

use crate::error::{OverwatchError, Result};
use crate::timestamp;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub project: String,
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    /// Number of spiders the server runs in parallel. Only used as a
    /// multiplier for the fleet-wide projections.
    pub concurrency: usize,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    pub output_dir: PathBuf,
}

/// `listjobs.json` response body as served by scrapyd.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListJobsResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub node_name: Option<String>,
    #[serde(default)]
    pub pending: Vec<serde_json::Value>,
    #[serde(default)]
    pub running: Vec<serde_json::Value>,
    #[serde(default)]
    pub finished: Vec<RawJob>,
}

/// A finished job exactly as it appears on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawJob {
    pub id: String,
    #[serde(default)]
    pub spider: Option<String>,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub id: String,
    pub spider: Option<String>,
    pub start: PrimitiveDateTime,
    pub end: PrimitiveDateTime,
}

impl JobRecord {
    pub fn from_raw(raw: &RawJob) -> Result<Self> {
        Ok(Self {
            id: raw.id.clone(),
            spider: raw.spider.clone(),
            start: timestamp::parse_timestamp(&raw.start_time)?,
            end: timestamp::parse_timestamp(&raw.end_time)?,
        })
    }

    /// Run time of the job in seconds. A job that ends before it starts is an error.
    pub fn duration_secs(&self) -> Result<f64> {
        if self.end < self.start {
            return Err(OverwatchError::NegativeDuration {
                id: self.id.clone(),
            });
        }
        Ok(timestamp::duration_secs(self.start, self.end))
    }
}

/// The finished jobs returned by one status query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobBatch {
    pub jobs: Vec<JobRecord>,
}

impl JobBatch {
    pub fn new(jobs: Vec<JobRecord>) -> Self {
        Self { jobs }
    }

    /// Parse every finished job. The first malformed timestamp aborts the whole batch.
    pub fn from_response(response: &ListJobsResponse) -> Result<Self> {
        let jobs = response
            .finished
            .iter()
            .map(JobRecord::from_raw)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { jobs })
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// Crawl statistics derived from one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub average_duration: f64,
    pub longest_duration: f64,
    pub shortest_duration: f64,
    pub total_duration: f64,
    pub single_per_hour: f64,
    pub fleet_per_hour: f64,
    pub single_per_day: f64,
    pub fleet_per_day: f64,
    pub single_per_week: f64,
    pub fleet_per_week: f64,
    pub completed_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Float(f64),
    Count(usize),
}

impl MetricValue {
    /// Render the value for the CSV report. Floats use the shortest
    /// round-trip form and keep a trailing `.0` when integral.
    pub fn render(self) -> String {
        match self {
            MetricValue::Count(n) => n.to_string(),
            MetricValue::Float(v) if v.is_finite() && v.fract() == 0.0 => format!("{v:.1}"),
            MetricValue::Float(v) => v.to_string(),
        }
    }
}

impl MetricsReport {
    /// Report columns in output order, labelled the way the CSV header names them.
    pub fn entries(&self) -> [(&'static str, MetricValue); 11] {
        use MetricValue::{Count, Float};
        [
            ("Av CR (S)", Float(self.average_duration)),
            ("Longest CR (S)", Float(self.longest_duration)),
            ("Shortest CR (S)", Float(self.shortest_duration)),
            ("Total Duration", Float(self.total_duration)),
            ("Single CR p/h", Float(self.single_per_hour)),
            ("Max CR p/h", Float(self.fleet_per_hour)),
            ("Single CR p/d", Float(self.single_per_day)),
            ("Max CR p/d", Float(self.fleet_per_day)),
            ("Single CR p/7d", Float(self.single_per_week)),
            ("Max CR p/7d", Float(self.fleet_per_week)),
            ("Completed crawls", Count(self.completed_count)),
        ]
    }
}
