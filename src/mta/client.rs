use std::collections::HashSet;
use std::time::Duration;

use reqwest::Client;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::models::{FeedEndpoint, RawFeedResponse};

const DEFAULT_USER_AGENT: &str = "MTA-TrainTimes-Rust/1.0";

/// HTTP client for GTFS-RT feeds.
///
/// One pooled `reqwest::Client` is shared by every fetch task. Holds no
/// per-query state, so overlapping queries are independent.
#[derive(Debug, Clone)]
pub struct MtaClient {
    http: Client,
}

impl MtaClient {
    /// Build a client. `timeout` of `None` leaves requests unbounded.
    pub fn new(user_agent: Option<&str>, timeout: Option<Duration>) -> Result<Self, FetchError> {
        let mut builder = Client::builder()
            .user_agent(user_agent.unwrap_or(DEFAULT_USER_AGENT))
            .gzip(true)
            .pool_max_idle_per_host(4);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(FetchError::Client)?;
        Ok(MtaClient { http })
    }

    /// Fetch every endpoint in parallel, all or nothing.
    ///
    /// The first endpoint to fail fails the whole batch; responses already
    /// received from other endpoints are discarded.
    pub async fn fetch_all(
        &self,
        endpoints: &[FeedEndpoint],
    ) -> Result<Vec<RawFeedResponse>, FetchError> {
        let mut join_set = self.spawn_fetches(endpoints);
        let mut responses = Vec::with_capacity(endpoints.len());

        while let Some(result) = join_set.join_next().await {
            match result {
                Ok((_, Ok(raw))) => responses.push(raw),
                Ok((_, Err(e))) => {
                    warn!("[FETCH] Error calling feeds: {}", e);
                    // Stragglers run to completion; their results are dropped.
                    join_set.detach_all();
                    return Err(e);
                }
                Err(e) => {
                    warn!("[FETCH] Feed fetch task panicked: {}", e);
                    join_set.detach_all();
                    return Err(FetchError::Join(e.to_string()));
                }
            }
        }

        Ok(responses)
    }

    /// Fetch every endpoint in parallel and report each outcome separately.
    pub async fn fetch_each(
        &self,
        endpoints: &[FeedEndpoint],
    ) -> Vec<(FeedEndpoint, Result<RawFeedResponse, FetchError>)> {
        let mut join_set = self.spawn_fetches(endpoints);
        let mut outcomes = Vec::with_capacity(endpoints.len());
        let mut join_errors = Vec::new();

        while let Some(result) = join_set.join_next().await {
            match result {
                Ok((endpoint, outcome)) => {
                    if let Err(ref e) = outcome {
                        warn!("[FETCH] {}", e);
                    }
                    outcomes.push((endpoint, outcome));
                }
                Err(e) => {
                    warn!("[FETCH] Feed fetch task panicked: {}", e);
                    join_errors.push(e.to_string());
                }
            }
        }

        settle_outcomes(endpoints, outcomes, join_errors)
    }

    fn spawn_fetches(
        &self,
        endpoints: &[FeedEndpoint],
    ) -> JoinSet<(FeedEndpoint, Result<RawFeedResponse, FetchError>)> {
        let mut join_set = JoinSet::new();
        for endpoint in endpoints {
            let http = self.http.clone();
            let endpoint = endpoint.clone();
            join_set.spawn(async move {
                let result = fetch_single_feed(&http, &endpoint).await;
                (endpoint, result)
            });
        }
        join_set
    }
}

/// Give every endpoint whose task never reported back a `Join` failure, so
/// each requested endpoint has exactly one outcome.
fn settle_outcomes(
    endpoints: &[FeedEndpoint],
    mut outcomes: Vec<(FeedEndpoint, Result<RawFeedResponse, FetchError>)>,
    join_errors: Vec<String>,
) -> Vec<(FeedEndpoint, Result<RawFeedResponse, FetchError>)> {
    if outcomes.len() == endpoints.len() {
        return outcomes;
    }

    let reported: HashSet<FeedEndpoint> = outcomes.iter().map(|(e, _)| e.clone()).collect();
    let mut join_errors = join_errors.into_iter();
    for endpoint in endpoints {
        if reported.contains(endpoint) {
            continue;
        }
        let msg = join_errors
            .next()
            .unwrap_or_else(|| "task did not complete".to_string());
        outcomes.push((endpoint.clone(), Err(FetchError::Join(format!("{}: {}", endpoint, msg)))));
    }
    outcomes
}

/// GET one feed; anything but a 2xx status is a failure.
async fn fetch_single_feed(
    http: &Client,
    endpoint: &FeedEndpoint,
) -> Result<RawFeedResponse, FetchError> {
    let response = http
        .get(endpoint.as_str())
        .send()
        .await
        .map_err(|source| FetchError::Http {
            url: endpoint.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: endpoint.to_string(),
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|source| FetchError::Body {
            url: endpoint.to_string(),
            source,
        })?;

    debug!("[FETCH] {} returned {} bytes", endpoint, body.len());
    Ok(RawFeedResponse {
        endpoint: endpoint.clone(),
        status: status.as_u16(),
        body: body.to_vec(),
    })
}

/// Feed fetch errors.
#[derive(Debug)]
pub enum FetchError {
    /// The HTTP client could not be built.
    Client(reqwest::Error),
    /// Connection, TLS or timeout failure.
    Http { url: String, source: reqwest::Error },
    /// Non-2xx response.
    Status { url: String, status: u16, reason: String },
    /// Response body could not be read.
    Body { url: String, source: reqwest::Error },
    /// A fetch task panicked or was cancelled.
    Join(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Client(e) => write!(f, "HTTP client error: {}", e),
            FetchError::Http { url, source } => write!(f, "{}: HTTP error: {}", url, source),
            FetchError::Status { url, status, reason } => {
                write!(f, "{}: {} {}", url, status, reason)
            }
            FetchError::Body { url, source } => write!(f, "{}: Read error: {}", url, source),
            FetchError::Join(msg) => write!(f, "Fetch task failed: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Client(e)
            | FetchError::Http { source: e, .. }
            | FetchError::Body { source: e, .. } => Some(e),
            FetchError::Status { .. } | FetchError::Join(_) => None,
        }
    }
}
