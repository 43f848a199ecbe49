//! Fixtures shared by the fetch and engine tests.

use std::io;
use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use prost::Message;

use crate::mta::decoder::transit_realtime as rt;

/// Serve canned `(path, status, body)` responses on an ephemeral local port.
/// Returns the base URL, e.g. `http://127.0.0.1:38211`.
pub async fn spawn_feed_server(feeds: Vec<(&'static str, StatusCode, Vec<u8>)>) -> String {
    let mut app = Router::new();
    for (path, status, body) in feeds {
        app = app.route(
            path,
            get(move || {
                let body = body.clone();
                async move { (status, body) }
            }),
        );
    }

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    format!("http://{}", addr)
}

/// Encode a feed of trip updates: `(trip_id, route_id, [(stop_id, arrival)])`.
pub fn feed_bytes(trips: &[(&str, &str, &[(&str, Option<i64>)])]) -> Vec<u8> {
    let entity = trips
        .iter()
        .enumerate()
        .map(|(i, (trip_id, route_id, stops))| rt::FeedEntity {
            id: i.to_string(),
            trip_update: Some(rt::TripUpdate {
                trip: rt::TripDescriptor {
                    trip_id: Some(trip_id.to_string()),
                    route_id: Some(route_id.to_string()),
                    ..Default::default()
                },
                stop_time_update: stops
                    .iter()
                    .map(|(stop_id, arrival)| rt::trip_update::StopTimeUpdate {
                        stop_id: Some(stop_id.to_string()),
                        arrival: arrival.map(|time| rt::trip_update::StopTimeEvent {
                            time: Some(time),
                            ..Default::default()
                        }),
                        ..Default::default()
                    })
                    .collect(),
                ..Default::default()
            }),
            ..Default::default()
        })
        .collect();

    rt::FeedMessage {
        header: rt::FeedHeader {
            gtfs_realtime_version: "1.0".into(),
            ..Default::default()
        },
        entity,
    }
    .encode_to_vec()
}

/// In-memory sink for formatted log lines.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// A plain-text subscriber writing into this capture, debug and up.
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + 'static {
        let sink = self.clone();
        tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
