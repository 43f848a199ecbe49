//! MTA GTFS-RT feed URL mapping.
//!
//! Each feed covers a group of routes. The feed IDs map to:
//! `https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/nyct%2Fgtfs{suffix}`

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, warn};

use crate::models::FeedEndpoint;

/// Base URL for MTA GTFS-RT feeds.
pub const MTA_FEED_BASE_URL: &str =
    "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/nyct%2Fgtfs";

/// Every route the built-in table knows about.
const MTA_ROUTES: &[&str] = &[
    "1", "2", "3", "4", "5", "6", "7", "S", "GS", "A", "C", "E", "B", "D", "F", "M", "G", "J",
    "Z", "N", "Q", "R", "W", "L", "SI", "SIR",
];

/// Returns the feed URL suffix for a given route.
pub fn feed_id_for_route(route: &str) -> Option<&'static str> {
    match route {
        // IRT: 1, 2, 3, 4, 5, 6, shuttle
        "1" | "2" | "3" | "4" | "5" | "6" | "S" | "GS" => Some(""),
        // IND: A, C, E
        "A" | "C" | "E" => Some("-ace"),
        // IND: B, D, F, M
        "B" | "D" | "F" | "M" => Some("-bdfm"),
        // IND: G
        "G" => Some("-g"),
        // BMT: J, Z
        "J" | "Z" => Some("-jz"),
        // BMT: N, Q, R, W
        "N" | "Q" | "R" | "W" => Some("-nqrw"),
        // BMT: L
        "L" => Some("-l"),
        // IRT: 7
        "7" => Some("-7"),
        // SIR (Staten Island Railway)
        "SI" | "SIR" => Some("-si"),
        _ => None,
    }
}

/// Immutable route → feed endpoint table, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedTable {
    routes: BTreeMap<String, FeedEndpoint>,
}

impl FeedTable {
    /// The built-in NYC Subway table rooted at `base_url`.
    pub fn mta_default(base_url: &str) -> Self {
        let routes = MTA_ROUTES
            .iter()
            .filter_map(|route| {
                feed_id_for_route(route)
                    .map(|suffix| (route.to_string(), FeedEndpoint::new(format!("{base_url}{suffix}"))))
            })
            .collect();
        FeedTable { routes }
    }

    pub fn from_routes<I, R, U>(routes: I) -> Self
    where
        I: IntoIterator<Item = (R, U)>,
        R: Into<String>,
        U: Into<String>,
    {
        FeedTable {
            routes: routes
                .into_iter()
                .map(|(route, url)| (route.into(), FeedEndpoint::new(url)))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn routes(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    /// Returns the distinct feed endpoints that cover `route_filter`.
    ///
    /// An empty filter selects every configured route. Unknown routes are
    /// skipped; if nothing is left a warning is logged and the result is
    /// empty. Each endpoint appears once, in table order.
    pub fn resolve(&self, route_filter: &HashSet<String>) -> Vec<FeedEndpoint> {
        let mut seen = HashSet::new();
        let mut endpoints = Vec::new();
        for (route, endpoint) in &self.routes {
            if !route_filter.is_empty() && !route_filter.contains(route) {
                continue;
            }
            if seen.insert(endpoint) {
                endpoints.push(endpoint.clone());
            }
        }

        if !route_filter.is_empty() {
            let mut unknown: Vec<&str> = route_filter
                .iter()
                .filter(|route| !self.routes.contains_key(*route))
                .map(String::as_str)
                .collect();
            unknown.sort_unstable();
            if endpoints.is_empty() {
                warn!("[MTA] Invalid route ids {}", unknown.join(","));
            } else if !unknown.is_empty() {
                debug!("[MTA] Ignoring unknown route ids {}", unknown.join(","));
            }
        }

        endpoints
    }
}
