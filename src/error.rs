use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = OverwatchError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum OverwatchError {
    #[error("invalid server address {0:?}")]
    InvalidHost(String),
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("invalid timestamp {value:?}: {source}")]
    Parse {
        value: String,
        #[source]
        source: time::error::Parse,
    },
    #[error("job {id} ends before it starts")]
    NegativeDuration { id: String },
    #[error("no finished jobs to summarize")]
    EmptyBatch,
    #[error("average job duration is zero, throughput is undefined")]
    DivisionByZero,
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}

/// Why a `listjobs.json` request did not produce a usable job listing.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("server responded with status {0}")]
    Status(reqwest::StatusCode),
    #[error("server reported an error: {0}")]
    Server(String),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}
