use async_trait::async_trait;
use devcamper_query::{GeoPoint, Geocoder, GeocodingFailure, QueryError};
use serde_json::{json, Value};
use std::collections::HashMap;

pub const BOSTON_ZIP: &str = "02118";
pub const UNKNOWN_ZIP: &str = "00000";
pub const OUTAGE_ZIP: &str = "99999";

/// Geocoder answering from a fixed table; `OUTAGE_ZIP` simulates a provider failure.
pub struct StubGeocoder {
    places: HashMap<String, GeoPoint>,
}

impl Default for StubGeocoder {
    fn default() -> Self {
        let mut places = HashMap::new();
        places.insert(BOSTON_ZIP.to_string(), point(42.3415, -71.0743));
        places.insert(
            "233 Bay State Rd Boston MA 02215".to_string(),
            point(42.350846, -71.104028),
        );
        Self { places }
    }
}

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn geocode(&self, code: &str) -> devcamper_query::Result<Vec<GeoPoint>> {
        if code == OUTAGE_ZIP {
            return Err(QueryError::Geocoding {
                code: code.to_string(),
                reason: GeocodingFailure::Unavailable("connection refused".to_string()),
            });
        }
        Ok(self.places.get(code).copied().into_iter().collect())
    }
}

pub fn point(latitude: f64, longitude: f64) -> GeoPoint {
    GeoPoint::new(latitude, longitude).expect("valid test coordinates")
}

/// Timestamp `minutes` after a fixed epoch, so seeded records have a known order.
pub fn created_at(minutes: u32) -> String {
    format!("2024-01-01T{:02}:{:02}:00.000Z", minutes / 60, minutes % 60)
}

pub fn bootcamp(id: &str, name: &str, average_cost: i64, careers: &[&str]) -> Value {
    json!({
        "id": id,
        "name": name,
        "averageCost": average_cost,
        "careers": careers,
        "housing": false,
        "createdAt": created_at(0),
    })
}

pub fn located_bootcamp(id: &str, name: &str, at: GeoPoint) -> Value {
    let mut bootcamp = bootcamp(id, name, 10000, &["Web Development"]);
    bootcamp["location"] = at.to_geojson();
    bootcamp
}

/// `count` numbered bootcamps, newest last
pub fn numbered_bootcamps(count: u32) -> Vec<Value> {
    (1..=count)
        .map(|n| {
            let mut doc = bootcamp(
                &format!("b{n:03}"),
                &format!("Bootcamp {n}"),
                i64::from(n) * 1000,
                &["Web Development"],
            );
            doc["createdAt"] = json!(created_at(n));
            doc
        })
        .collect()
}

pub fn course(id: &str, title: &str, bootcamp_id: &str, tuition: i64) -> Value {
    json!({
        "id": id,
        "title": title,
        "tuition": tuition,
        "bootcamp": bootcamp_id,
        "createdAt": created_at(0),
    })
}
