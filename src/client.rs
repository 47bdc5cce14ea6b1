use reqwest::{StatusCode, Url};

use crate::error::{FetchError, OverwatchError, Result};
use crate::model::{ListJobsResponse, RunConfig};

const LIST_JOBS_ENDPOINT: &str = "listjobs.json";

/// Thin client for the scrapyd `listjobs.json` endpoint.
pub struct ScrapydClient {
    http: reqwest::Client,
    list_jobs_url: Url,
}

impl ScrapydClient {
    pub fn new(cfg: &RunConfig) -> Result<Self> {
        let list_jobs_url = build_list_jobs_url(&cfg.host, cfg.port, &cfg.project)?;
        let http = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .user_agent(format!("crawl-overwatch/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| OverwatchError::Fetch {
                url: list_jobs_url.to_string(),
                source: FetchError::Transport(e),
            })?;
        Ok(Self {
            http,
            list_jobs_url,
        })
    }

    pub fn list_jobs_url(&self) -> &Url {
        &self.list_jobs_url
    }

    /// Fetch the current job listing. Any status other than 200 is an error
    /// and the body is not inspected.
    pub async fn list_jobs(&self) -> Result<ListJobsResponse> {
        let url = self.list_jobs_url.clone();
        let fetch_err = |source: FetchError| OverwatchError::Fetch {
            url: url.to_string(),
            source,
        };

        tracing::debug!(%url, "requesting job listing");
        let resp = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| fetch_err(e.into()))?;

        let status = resp.status();
        if status != StatusCode::OK {
            tracing::error!(%url, %status, "job listing request failed");
            return Err(fetch_err(FetchError::Status(status)));
        }

        let body: ListJobsResponse = resp.json().await.map_err(|e| fetch_err(e.into()))?;
        if body.status.as_deref() == Some("error") {
            let message = body
                .message
                .clone()
                .unwrap_or_else(|| "no message given".to_string());
            return Err(fetch_err(FetchError::Server(message)));
        }

        tracing::debug!(
            node = body.node_name.as_deref().unwrap_or("-"),
            pending = body.pending.len(),
            running = body.running.len(),
            finished = body.finished.len(),
            "received job listing"
        );
        Ok(body)
    }
}

/// `{host}[:{port}]/listjobs.json?project={project}`. Hosts without a scheme
/// are assumed to be plain http.
pub fn build_list_jobs_url(host: &str, port: Option<u16>, project: &str) -> Result<Url> {
    let host = host.trim().trim_end_matches('/');
    let base = if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{host}")
    };
    let base = match port {
        Some(port) => format!("{base}:{port}"),
        None => base,
    };

    let mut url = Url::parse(&format!("{base}/{LIST_JOBS_ENDPOINT}"))
        .map_err(|_| OverwatchError::InvalidHost(host.to_string()))?;
    if url.host_str().map_or(true, str::is_empty) {
        return Err(OverwatchError::InvalidHost(host.to_string()));
    }
    url.query_pairs_mut().append_pair("project", project);
    Ok(url)
}
