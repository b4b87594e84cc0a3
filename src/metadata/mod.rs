// Sidecar metadata extraction module

pub mod exiftool;

use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::error::{ArchiveError, Result};

/// Normalized metadata parsed from one takeout sidecar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Capture time, seconds since the Unix epoch (UTC)
    pub timestamp: Option<i64>,
    pub geo: Option<GeoPoint>,
    pub people: Vec<String>,
    pub description: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
}

// Raw sidecar layout as written by Google Photos. Unknown keys are ignored,
// wrongly typed known keys fail the whole parse.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSidecar {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    photo_taken_time: Option<RawTime>,
    #[serde(default)]
    creation_time: Option<RawTime>,
    #[serde(default)]
    geo_data: Option<RawGeo>,
    #[serde(default)]
    people: Option<Vec<RawPerson>>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTime {
    #[serde(default)]
    timestamp: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawGeo {
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
    #[serde(default)]
    altitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawPerson {
    #[serde(default)]
    name: Option<String>,
}

/// Parse a sidecar file into a MetadataRecord.
pub fn extract(path: &Path) -> Result<MetadataRecord> {
    let text = std::fs::read_to_string(path).map_err(|e| ArchiveError::UnparsableMetadata {
        path: path.display().to_string(),
        detail: e.to_string(),
    })?;
    parse_sidecar(&text, &path.display().to_string())
}

/// Parse sidecar content. `origin` is only used in error messages.
pub fn parse_sidecar(text: &str, origin: &str) -> Result<MetadataRecord> {
    let raw: RawSidecar = serde_json::from_str(text).map_err(|e| ArchiveError::UnparsableMetadata {
        path: origin.to_string(),
        detail: e.to_string(),
    })?;

    let timestamp = select_timestamp(&raw);
    let geo = raw.geo_data.as_ref().and_then(normalize_geo);

    let people = raw.people
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.name)
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();

    Ok(MetadataRecord {
        timestamp,
        geo,
        people,
        description: raw.description.filter(|d| !d.trim().is_empty()),
        title: raw.title,
        url: raw.url.filter(|u| !u.trim().is_empty()),
    })
}

/// Read only the `title` field of a sidecar. Returns None for unparsable files.
pub fn read_title(path: &Path) -> Option<String> {
    read_string_field(path, "title")
}

/// Read only the `url` field, so a sidecar with other malformed fields
/// still yields its source link.
pub fn read_url(path: &Path) -> Option<String> {
    read_string_field(path, "url").filter(|u| !u.trim().is_empty())
}

fn read_string_field(path: &Path, key: &str) -> Option<String> {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            log::warn!("Could not read {}: {}", path.display(), e);
            return None;
        }
    };
    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(doc) => doc.get(key).and_then(|v| v.as_str()).map(String::from),
        Err(e) => {
            log::warn!("Could not parse {}: {}", path.display(), e);
            None
        }
    }
}

/// photoTakenTime wins over creationTime. The fallback only applies when the
/// preferred field is absent; a present but non-numeric value means no timestamp.
fn select_timestamp(raw: &RawSidecar) -> Option<i64> {
    let present = |t: &Option<RawTime>| -> Option<serde_json::Value> {
        t.as_ref()
            .and_then(|t| t.timestamp.clone())
            .filter(|v| !v.is_null() && v.as_str().map_or(true, |s| !s.trim().is_empty()))
    };

    let value = present(&raw.photo_taken_time).or_else(|| present(&raw.creation_time))?;
    parse_epoch_seconds(&value)
}

/// Accept an integer or a string holding an integer.
fn parse_epoch_seconds(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn normalize_geo(raw: &RawGeo) -> Option<GeoPoint> {
    let latitude = raw.latitude.unwrap_or(0.0);
    let longitude = raw.longitude.unwrap_or(0.0);
    // Google writes 0.0/0.0 for "no location"
    if latitude == 0.0 && longitude == 0.0 {
        return None;
    }
    Some(GeoPoint {
        latitude,
        longitude,
        altitude: raw.altitude.filter(|a| *a != 0.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_taken_time_wins() {
        let json = r#"{
            "title": "IMG_0001.jpg",
            "creationTime": {"timestamp": "1700000000"},
            "photoTakenTime": {"timestamp": "1609459200", "formatted": "Jan 1, 2021"}
        }"#;
        let rec = parse_sidecar(json, "test").unwrap();
        assert_eq!(rec.timestamp, Some(1609459200));
        assert_eq!(rec.title.as_deref(), Some("IMG_0001.jpg"));
    }

    #[test]
    fn test_creation_time_fallback_and_integer_form() {
        let json = r#"{"creationTime": {"timestamp": 1609459200}}"#;
        let rec = parse_sidecar(json, "test").unwrap();
        assert_eq!(rec.timestamp, Some(1609459200));
    }

    #[test]
    fn test_non_numeric_timestamp_is_none() {
        let json = r#"{"photoTakenTime": {"timestamp": "yesterday"}, "creationTime": {"timestamp": "1609459200"}}"#;
        let rec = parse_sidecar(json, "test").unwrap();
        assert_eq!(rec.timestamp, None);

        let rec = parse_sidecar("{}", "test").unwrap();
        assert_eq!(rec.timestamp, None);
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = parse_sidecar("{ not json", "broken.json").unwrap_err();
        assert!(matches!(err, ArchiveError::UnparsableMetadata { .. }));

        let err = parse_sidecar(r#"{"geoData": {"latitude": "north"}}"#, "typed.json").unwrap_err();
        assert!(matches!(err, ArchiveError::UnparsableMetadata { .. }));
    }

    #[test]
    fn test_geo_defaults() {
        let json = r#"{"geoData": {"latitude": 37.5, "altitude": 0.0}}"#;
        let rec = parse_sidecar(json, "test").unwrap();
        let geo = rec.geo.unwrap();
        assert_eq!(geo.latitude, 37.5);
        assert_eq!(geo.longitude, 0.0);
        assert_eq!(geo.altitude, None);

        let json = r#"{"geoData": {"latitude": 0.0, "longitude": 0.0, "altitude": 12.0}}"#;
        assert!(parse_sidecar(json, "test").unwrap().geo.is_none());

        let json = r#"{"geoData": {"latitude": -33.8, "longitude": 151.2, "altitude": 58.5}}"#;
        assert_eq!(parse_sidecar(json, "test").unwrap().geo.unwrap().altitude, Some(58.5));
    }

    #[test]
    fn test_people_and_description() {
        let json = r#"{
            "description": "  ",
            "people": [{"name": "Alice"}, {"name": ""}, {}, {"name": "Bob"}],
            "url": "https://photos.google.com/photo/abc"
        }"#;
        let rec = parse_sidecar(json, "test").unwrap();
        assert_eq!(rec.people, vec!["Alice".to_string(), "Bob".to_string()]);
        assert_eq!(rec.description, None);
        assert_eq!(rec.url.as_deref(), Some("https://photos.google.com/photo/abc"));
    }

    #[test]
    fn test_read_title() {
        let dir = tempfile::TempDir::new().unwrap();
        let good = dir.path().join("a.json");
        std::fs::write(&good, r#"{"title": "IMG_1.jpg"}"#).unwrap();
        let bad = dir.path().join("b.json");
        std::fs::write(&bad, "garbage").unwrap();

        assert_eq!(read_title(&good).as_deref(), Some("IMG_1.jpg"));
        assert_eq!(read_title(&bad), None);
    }

    #[test]
    fn test_read_url_survives_bad_fields() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("orphan.json");
        std::fs::write(&path, r#"{"people": "x", "url": "https://photos.google.com/photo/xyz"}"#).unwrap();

        assert!(extract(&path).is_err());
        assert_eq!(read_url(&path).as_deref(), Some("https://photos.google.com/photo/xyz"));

        std::fs::write(&path, r#"{"url": " "}"#).unwrap();
        assert_eq!(read_url(&path), None);
    }
}
