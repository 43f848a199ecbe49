use crate::models::{Arrival, Direction, FeedMessage, StationQuery, TripUpdate};
use crate::mta::direction::classify;
use crate::mta::stations::{base_stop_id, StationDirectory};

/// Whether a trip update is wanted by `query`.
///
/// With both directions requested an unclassifiable trip still matches;
/// with exactly one requested it does not.
pub fn matches(trip_update: Option<&TripUpdate>, query: &StationQuery) -> bool {
    let Some(trip_update) = trip_update else {
        return false;
    };
    if !query.allows_route(&trip_update.route_id) {
        return false;
    }

    let direction = classify(Some(trip_update.trip_id.as_str()));
    match (query.want_inbound, query.want_outbound, direction) {
        (true, true, _) => true,
        (true, false, Direction::Inbound) => true,
        (false, true, Direction::Outbound) => true,
        _ => false,
    }
}

/// Arrival at `station_id` for one trip, if the trip stops there.
///
/// The last stop update at one of the station's platforms with a known
/// arrival time wins. The destination comes from the trip's final stop; if
/// that stop is not in the directory the trip is skipped.
pub fn extract(
    directory: &dyn StationDirectory,
    station_id: &str,
    trip_update: &TripUpdate,
) -> Option<Arrival> {
    let platforms = directory.sub_stop_ids(station_id)?;

    let arrival_secs = trip_update
        .stop_time_updates
        .iter()
        .filter(|stu| platforms.contains(&stu.sub_stop_id))
        .filter_map(|stu| stu.arrival_epoch_seconds)
        .last()?;

    let terminal = trip_update.stop_time_updates.last()?;
    let destination = directory.display_name(base_stop_id(&terminal.sub_stop_id))?;

    // Out-of-range feed times are dropped rather than wrapped
    let arrival_time_millis = arrival_secs.checked_mul(1000)?;

    Some(Arrival {
        arrival_time_millis,
        destination_label: destination.to_string(),
        route_id: trip_update.route_id.clone(),
    })
}

/// Arrivals at the queried station across every decoded feed, unordered.
pub fn aggregate(
    directory: &dyn StationDirectory,
    feeds: &[FeedMessage],
    query: &StationQuery,
) -> Vec<Arrival> {
    feeds
        .iter()
        .flat_map(|feed| &feed.entities)
        .filter_map(|entity| entity.trip_update.as_ref())
        .filter(|update| matches(Some(*update), query))
        .filter_map(|update| extract(directory, &query.station_id, update))
        .collect()
}
