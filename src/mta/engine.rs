//! Query orchestration: resolve feeds, fetch them concurrently, decode each
//! one and extract arrivals for the requested station.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::models::{Arrival, FeedEndpoint, FeedMessage, RawFeedResponse, StationQuery};
use crate::mta::arrivals::aggregate;
use crate::mta::client::{FetchError, MtaClient};
use crate::mta::decoder::decode;
use crate::mta::feeds::FeedTable;
use crate::mta::stations::StationDirectory;

/// How a fetch failure on one endpoint affects the rest of the batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchPolicy {
    /// Any failing endpoint fails the whole query.
    #[default]
    AllOrNothing,
    /// Failing endpoints are reported; healthy feeds still contribute.
    Partial,
}

/// A feed that did not contribute to a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedFailure {
    pub endpoint: FeedEndpoint,
    pub error: String,
}

/// Result of a successful query.
///
/// Empty `arrivals` with no failures means the feeds were read and nothing
/// is coming.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ArrivalReport {
    pub arrivals: Vec<Arrival>,
    pub decode_failures: Vec<FeedFailure>,
    /// Only populated under [`FetchPolicy::Partial`].
    pub failed_endpoints: Vec<FeedFailure>,
}

/// Arrival lookups against a fixed feed table and station directory.
pub struct ArrivalService {
    feeds: Arc<FeedTable>,
    directory: Arc<dyn StationDirectory>,
    client: MtaClient,
    policy: FetchPolicy,
}

impl ArrivalService {
    pub fn new(
        feeds: Arc<FeedTable>,
        directory: Arc<dyn StationDirectory>,
        client: MtaClient,
        policy: FetchPolicy,
    ) -> Self {
        ArrivalService {
            feeds,
            directory,
            client,
            policy,
        }
    }

    pub fn feeds(&self) -> &FeedTable {
        &self.feeds
    }

    pub fn directory(&self) -> &dyn StationDirectory {
        self.directory.as_ref()
    }

    /// Display name for a parent station.
    pub fn stop_name(&self, station_id: &str) -> Option<&str> {
        self.directory.display_name(station_id)
    }

    /// Upcoming arrivals at `query.station_id`, unordered.
    pub async fn query(&self, query: &StationQuery) -> Result<ArrivalReport, QueryError> {
        if self.directory.sub_stop_ids(&query.station_id).is_none() {
            return Err(QueryError::UnknownStation(query.station_id.clone()));
        }

        let endpoints = self.feeds.resolve(&query.route_filter);
        if endpoints.is_empty() {
            return Ok(ArrivalReport::default());
        }

        let (responses, failed_endpoints) = self.fetch(&endpoints).await?;

        let mut feeds: Vec<FeedMessage> = Vec::with_capacity(responses.len());
        let mut decode_failures = Vec::new();
        for raw in &responses {
            match decode(raw) {
                Ok(feed) => {
                    debug!(
                        "[MTA] {} ({}) decoded {} entities",
                        raw.endpoint,
                        raw.status,
                        feed.entities.len()
                    );
                    feeds.push(feed);
                }
                Err(e) => {
                    warn!("[MTA] {}", e);
                    decode_failures.push(FeedFailure {
                        endpoint: e.endpoint.clone(),
                        error: e.source.to_string(),
                    });
                }
            }
        }

        let arrivals = aggregate(self.directory.as_ref(), &feeds, query);
        info!(
            "[MTA] {}: {} arrivals from {} feeds",
            query.station_id,
            arrivals.len(),
            feeds.len()
        );

        Ok(ArrivalReport {
            arrivals,
            decode_failures,
            failed_endpoints,
        })
    }

    async fn fetch(
        &self,
        endpoints: &[FeedEndpoint],
    ) -> Result<(Vec<RawFeedResponse>, Vec<FeedFailure>), QueryError> {
        match self.policy {
            FetchPolicy::AllOrNothing => {
                let responses = self.client.fetch_all(endpoints).await?;
                Ok((responses, Vec::new()))
            }
            FetchPolicy::Partial => {
                let mut responses = Vec::new();
                let mut failures = Vec::new();
                let mut first_error = None;
                for (endpoint, outcome) in self.client.fetch_each(endpoints).await {
                    match outcome {
                        Ok(raw) => responses.push(raw),
                        Err(e) => {
                            failures.push(FeedFailure {
                                endpoint,
                                error: e.to_string(),
                            });
                            if first_error.is_none() {
                                first_error = Some(e);
                            }
                        }
                    }
                }
                match first_error {
                    Some(e) if responses.is_empty() => Err(QueryError::Fetch(e)),
                    _ => Ok((responses, failures)),
                }
            }
        }
    }
}

/// Query-level failures: the caller could not find out what is coming.
#[derive(Debug)]
pub enum QueryError {
    UnknownStation(String),
    Fetch(FetchError),
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryError::UnknownStation(id) => write!(f, "Station '{}' not found in database", id),
            QueryError::Fetch(e) => write!(f, "Error calling feeds: {}", e),
        }
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QueryError::Fetch(e) => Some(e),
            QueryError::UnknownStation(_) => None,
        }
    }
}

impl From<FetchError> for QueryError {
    fn from(err: FetchError) -> Self {
        QueryError::Fetch(err)
    }
}
