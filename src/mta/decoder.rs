//! Protobuf decoding of GTFS-RT trip update feeds.
//!
//! The prost-generated types stay inside this module; callers only see the
//! trimmed-down [`FeedMessage`] from `models`.

use prost::Message;

use crate::models::{Entity, FeedEndpoint, FeedMessage, RawFeedResponse, StopTimeUpdate, TripUpdate};

/// Generated protobuf types from gtfs-realtime.proto.
pub mod transit_realtime {
    include!(concat!(env!("OUT_DIR"), "/transit_realtime.rs"));
}

/// Decode a fetched feed body.
pub fn decode(raw: &RawFeedResponse) -> Result<FeedMessage, DecodeError> {
    decode_bytes(&raw.body).map_err(|source| DecodeError {
        endpoint: raw.endpoint.clone(),
        source,
    })
}

/// Decode raw protobuf bytes into a [`FeedMessage`].
pub fn decode_bytes(bytes: &[u8]) -> Result<FeedMessage, prost::DecodeError> {
    let feed = transit_realtime::FeedMessage::decode(bytes)?;
    Ok(convert_feed(feed))
}

fn convert_feed(feed: transit_realtime::FeedMessage) -> FeedMessage {
    FeedMessage {
        entities: feed
            .entity
            .into_iter()
            .filter(|entity| !entity.is_deleted())
            .map(|entity| Entity {
                trip_update: entity.trip_update.map(convert_trip_update),
            })
            .collect(),
    }
}

fn convert_trip_update(update: transit_realtime::TripUpdate) -> TripUpdate {
    TripUpdate {
        trip_id: update.trip.trip_id.unwrap_or_default(),
        route_id: update.trip.route_id.unwrap_or_default(),
        stop_time_updates: update
            .stop_time_update
            .into_iter()
            .map(|stu| StopTimeUpdate {
                sub_stop_id: stu.stop_id.unwrap_or_default(),
                arrival_epoch_seconds: stu.arrival.and_then(|a| a.time),
            })
            .collect(),
    }
}

/// A feed body that is not a valid GTFS-RT message.
#[derive(Debug)]
pub struct DecodeError {
    pub endpoint: FeedEndpoint,
    pub source: prost::DecodeError,
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Protobuf decode error from {}: {}", self.endpoint, self.source)
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::transit_realtime as rt;
    use super::*;

    fn raw(body: Vec<u8>) -> RawFeedResponse {
        RawFeedResponse {
            endpoint: FeedEndpoint::new("https://feeds.test/bdfm"),
            status: 200,
            body,
        }
    }

    #[test]
    fn test_empty_bytes_decode_to_empty_feed() {
        // An empty buffer is a valid (all-default) protobuf message
        let feed = decode(&raw(Vec::new())).unwrap();
        assert!(feed.entities.is_empty());
    }

    #[test]
    fn test_invalid_bytes() {
        let err = decode(&raw(vec![0xFF, 0xFE, 0x00, 0x01])).unwrap_err();
        assert_eq!(err.endpoint.as_str(), "https://feeds.test/bdfm");
        assert!(err.to_string().contains("https://feeds.test/bdfm"));
    }

    #[test]
    fn test_trip_update_conversion() {
        let feed = rt::FeedMessage {
            header: rt::FeedHeader {
                gtfs_realtime_version: "1.0".into(),
                timestamp: Some(1_700_000_000),
                ..Default::default()
            },
            entity: vec![
                rt::FeedEntity {
                    id: "1".into(),
                    trip_update: Some(rt::TripUpdate {
                        trip: rt::TripDescriptor {
                            trip_id: Some("123456_D..N".into()),
                            route_id: Some("D".into()),
                            ..Default::default()
                        },
                        stop_time_update: vec![
                            rt::trip_update::StopTimeUpdate {
                                stop_id: Some("B19N".into()),
                                arrival: Some(rt::trip_update::StopTimeEvent {
                                    time: Some(1_700_000_000),
                                    ..Default::default()
                                }),
                                ..Default::default()
                            },
                            rt::trip_update::StopTimeUpdate {
                                stop_id: Some("D11N".into()),
                                ..Default::default()
                            },
                        ],
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                // Vehicle-only entity: no trip update
                rt::FeedEntity {
                    id: "2".into(),
                    ..Default::default()
                },
            ],
        };

        let decoded = decode(&raw(feed.encode_to_vec())).unwrap();
        assert_eq!(decoded.entities.len(), 2);
        let update = decoded.entities[0].trip_update.as_ref().unwrap();
        assert_eq!(update.trip_id, "123456_D..N");
        assert_eq!(update.route_id, "D");
        assert_eq!(
            update.stop_time_updates,
            vec![
                StopTimeUpdate {
                    sub_stop_id: "B19N".into(),
                    arrival_epoch_seconds: Some(1_700_000_000),
                },
                StopTimeUpdate {
                    sub_stop_id: "D11N".into(),
                    arrival_epoch_seconds: None,
                },
            ]
        );
        assert!(decoded.entities[1].trip_update.is_none());
    }

    #[test]
    fn test_deleted_entities_dropped() {
        let feed = rt::FeedMessage {
            header: rt::FeedHeader::default(),
            entity: vec![rt::FeedEntity {
                id: "gone".into(),
                is_deleted: Some(true),
                ..Default::default()
            }],
        };
        let decoded = decode_bytes(&feed.encode_to_vec()).unwrap();
        assert!(decoded.entities.is_empty());
    }
}
