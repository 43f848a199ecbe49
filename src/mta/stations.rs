use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Raw station record from the JSON database.
#[derive(Debug, Clone, Deserialize)]
pub struct Station {
    /// Parent stop ID, e.g. `B19`.
    pub stop_id: String,
    pub name: String,
    /// Platform stop IDs, e.g. `["B19N", "B19S"]`.
    pub child_stops: Vec<String>,
}

/// Embedded station database JSON (compiled into the binary).
const STATION_DB_JSON: &str = include_str!("../../assets/stations.json");

/// Read-only station lookups used by arrival extraction.
pub trait StationDirectory: Send + Sync {
    /// Platform stop IDs belonging to a parent station.
    fn sub_stop_ids(&self, station_id: &str) -> Option<&[String]>;

    /// Display name for a parent stop ID.
    fn display_name(&self, base_stop_id: &str) -> Option<&str>;

    fn len(&self) -> usize;
}

/// Station directory backed by a JSON station list.
#[derive(Debug, Clone)]
pub struct StaticStationDirectory {
    /// Lookup index: parent stop ID → station.
    stations: HashMap<String, Station>,
}

impl StaticStationDirectory {
    /// The NYC Subway table shipped with the binary.
    pub fn embedded() -> Result<Self, StationDbError> {
        Self::from_json(STATION_DB_JSON)
    }

    /// Load a station list from a JSON file.
    pub fn load(path: &Path) -> Result<Self, StationDbError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| StationDbError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self, StationDbError> {
        let list: Vec<Station> =
            serde_json::from_str(json).map_err(|e| StationDbError::Parse(e.to_string()))?;

        let mut stations = HashMap::with_capacity(list.len());
        for station in list {
            if stations.contains_key(&station.stop_id) {
                return Err(StationDbError::Duplicate(station.stop_id));
            }
            stations.insert(station.stop_id.clone(), station);
        }
        Ok(StaticStationDirectory { stations })
    }
}

impl StationDirectory for StaticStationDirectory {
    fn sub_stop_ids(&self, station_id: &str) -> Option<&[String]> {
        self.stations.get(station_id).map(|s| s.child_stops.as_slice())
    }

    fn display_name(&self, base_stop_id: &str) -> Option<&str> {
        self.stations.get(base_stop_id).map(|s| s.name.as_str())
    }

    fn len(&self) -> usize {
        self.stations.len()
    }
}

/// Strip the one-character platform suffix from a stop ID (`D11N` → `D11`).
pub fn base_stop_id(sub_stop_id: &str) -> &str {
    match sub_stop_id.char_indices().last() {
        Some((idx, _)) => &sub_stop_id[..idx],
        None => sub_stop_id,
    }
}

/// Station database errors.
#[derive(Debug)]
pub enum StationDbError {
    Io(String),
    Parse(String),
    Duplicate(String),
}

impl std::fmt::Display for StationDbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StationDbError::Io(msg) => write!(f, "Station database I/O error: {}", msg),
            StationDbError::Parse(msg) => write!(f, "Station database parse error: {}", msg),
            StationDbError::Duplicate(id) => {
                write!(f, "Station '{}' listed more than once", id)
            }
        }
    }
}

impl std::error::Error for StationDbError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_db_loads() {
        let db = StaticStationDirectory::embedded().expect("embedded station DB is valid JSON");
        assert!(db.len() > 400, "station database should have entries");
        assert_eq!(db.display_name("127"), Some("Times Sq-42 St"));
    }

    #[test]
    fn test_sub_stop_ids() {
        let db = StaticStationDirectory::embedded().unwrap();
        let ids = db.sub_stop_ids("B19").expect("B19 should exist");
        assert_eq!(ids, ["B19N".to_string(), "B19S".to_string()]);
        assert_eq!(db.display_name("B19"), Some("18 Av"));
    }

    #[test]
    fn test_unknown_station() {
        let db = StaticStationDirectory::embedded().unwrap();
        assert!(db.sub_stop_ids("XYZ").is_none());
        assert!(db.display_name("XYZ").is_none());
        assert!(db.display_name("").is_none());
    }

    #[test]
    fn test_from_json_rejects_duplicates() {
        let json = r#"[
            {"stop_id": "A01", "name": "One", "child_stops": ["A01N", "A01S"]},
            {"stop_id": "A01", "name": "Two", "child_stops": ["A01N", "A01S"]}
        ]"#;
        let err = StaticStationDirectory::from_json(json).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = StaticStationDirectory::from_json("{not json").unwrap_err();
        assert!(err.to_string().contains("parse error"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = StaticStationDirectory::load(Path::new("/nonexistent/stations.json")).unwrap_err();
        assert!(matches!(err, StationDbError::Io(_)));
    }

    #[test]
    fn test_base_stop_id() {
        assert_eq!(base_stop_id("D11N"), "D11");
        assert_eq!(base_stop_id("127S"), "127");
        assert_eq!(base_stop_id("X"), "");
        assert_eq!(base_stop_id(""), "");
    }
}
