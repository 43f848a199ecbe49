use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

/// Direction of travel inferred from a trip ID.
///
/// `Inbound` is the feed's `N` token and `Outbound` its `S` token. Nothing
/// else in the crate should assume which way those point on a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Inbound,  // N
    Outbound, // S
    Unknown,
}

/// One arrivals request: which station, which directions, which routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationQuery {
    pub station_id: String,
    pub want_inbound: bool,
    pub want_outbound: bool,
    /// Empty means every route.
    pub route_filter: HashSet<String>,
}

impl StationQuery {
    pub fn new(station_id: impl Into<String>) -> Self {
        StationQuery {
            station_id: station_id.into(),
            want_inbound: true,
            want_outbound: true,
            route_filter: HashSet::new(),
        }
    }

    pub fn with_directions(mut self, inbound: bool, outbound: bool) -> Self {
        self.want_inbound = inbound;
        self.want_outbound = outbound;
        self
    }

    pub fn with_routes<I, S>(mut self, routes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.route_filter = routes.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `route_id` passes the route filter.
    pub fn allows_route(&self, route_id: &str) -> bool {
        self.route_filter.is_empty() || self.route_filter.contains(route_id)
    }
}

/// URL of one upstream GTFS-RT feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FeedEndpoint(String);

impl FeedEndpoint {
    pub fn new(url: impl Into<String>) -> Self {
        FeedEndpoint(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeedEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Undecoded body of a successful feed fetch.
#[derive(Debug, Clone)]
pub struct RawFeedResponse {
    pub endpoint: FeedEndpoint,
    pub status: u16,
    pub body: Vec<u8>,
}

/// A decoded feed, reduced to what arrival extraction needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedMessage {
    pub entities: Vec<Entity>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub trip_update: Option<TripUpdate>,
}

/// Predicted stop times for one trip.
#[derive(Debug, Clone, PartialEq)]
pub struct TripUpdate {
    pub trip_id: String,
    pub route_id: String,
    /// In travel order; the last entry is the trip's terminal stop.
    pub stop_time_updates: Vec<StopTimeUpdate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StopTimeUpdate {
    /// Platform-level stop ID, e.g. `B19N`.
    pub sub_stop_id: String,
    /// POSIX seconds. Absent for passed stops and some terminal entries.
    pub arrival_epoch_seconds: Option<i64>,
}

/// A single upcoming arrival at the queried station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Arrival {
    pub arrival_time_millis: i64,
    pub destination_label: String,
    pub route_id: String,
}
