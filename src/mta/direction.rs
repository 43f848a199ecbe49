use regex::Regex;
use std::sync::OnceLock;

use crate::models::Direction;

/// Classify a trip's direction from its NYCT trip ID.
///
/// IDs look like `123456_A..N` (origin time, route, `..`, direction letter);
/// anything else, including a missing ID, is `Unknown`. Only the prefix is
/// checked, so real IDs such as `093450_D..N03R` still classify.
pub fn classify(trip_id: Option<&str>) -> Direction {
    static RE_TRIP_ID: OnceLock<Regex> = OnceLock::new();
    let re = RE_TRIP_ID
        .get_or_init(|| Regex::new(r"^[0-9]{6}_[A-Za-z0-9]\.\.([NS])").unwrap());

    let Some(caps) = trip_id.and_then(|id| re.captures(id)) else {
        return Direction::Unknown;
    };
    match caps.get(1).map(|m| m.as_str()) {
        Some("N") => Direction::Inbound,
        Some("S") => Direction::Outbound,
        _ => Direction::Unknown,
    }
}
