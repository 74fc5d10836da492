//! Geo radius resolver
//!
//! Converts a postal code and a distance into a "within sphere" filter:
//! the code is geocoded to a center point and the distance is converted to an
//! angular radius by dividing it by the earth's radius in the same unit.
//!
//! The unit matters: 10 miles divided by the kilometre radius (6378) yields a
//! radius 1.6x too small. Callers always state the unit explicitly and the
//! radius table is configured per unit.

use crate::error::{GeocodingFailure, QueryError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceUnit {
    #[serde(rename = "mi")]
    Miles,
    #[serde(rename = "km")]
    Kilometers,
}

impl DistanceUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Miles => "mi",
            Self::Kilometers => "km",
        }
    }
}

impl FromStr for DistanceUnit {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mi" | "mile" | "miles" => Ok(Self::Miles),
            "km" | "kilometer" | "kilometers" | "kilometre" | "kilometres" => Ok(Self::Kilometers),
            other => Err(QueryError::InvalidDistance(format!(
                "unknown unit '{other}', expected 'mi' or 'km'"
            ))),
        }
    }
}

/// Earth radius per distance unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EarthRadius {
    pub miles: f64,
    pub kilometers: f64,
}

impl Default for EarthRadius {
    fn default() -> Self {
        Self {
            miles: 3963.0,
            kilometers: 6378.0,
        }
    }
}

impl EarthRadius {
    pub fn in_unit(&self, unit: DistanceUnit) -> f64 {
        match unit {
            DistanceUnit::Miles => self.miles,
            DistanceUnit::Kilometers => self.kilometers,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Returns `None` unless both coordinates are finite and in range.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self {
            latitude,
            longitude,
        })
    }

    /// Read a GeoJSON point (`coordinates` are `[longitude, latitude]`).
    pub fn from_geojson(value: &JsonValue) -> Option<Self> {
        if let Some(kind) = value.get("type") {
            if kind.as_str() != Some("Point") {
                return None;
            }
        }
        let coordinates = value.get("coordinates")?.as_array()?;
        match coordinates.as_slice() {
            [lng, lat] => Self::new(lat.as_f64()?, lng.as_f64()?),
            _ => None,
        }
    }

    pub fn to_geojson(&self) -> JsonValue {
        json!({
            "type": "Point",
            "coordinates": [self.longitude, self.latitude],
        })
    }

    /// Great-circle angle between two points, in radians (haversine).
    pub fn central_angle(&self, other: &GeoPoint) -> f64 {
        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let d_lat = lat2 - lat1;
        let d_lng = (other.longitude - self.longitude).to_radians();
        let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        2.0 * h.sqrt().min(1.0).asin()
    }
}

/// Records within `radius_radians` of `center` on the unit sphere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadiusFilter {
    pub center: GeoPoint,
    pub radius_radians: f64,
}

impl RadiusFilter {
    pub fn contains(&self, point: &GeoPoint) -> bool {
        self.center.central_angle(point) <= self.radius_radians
    }
}

/// Geocoding collaborator.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Candidate points for a postal code or address, best match first.
    ///
    /// An empty vector means "no match"; errors mean the service failed.
    async fn geocode(&self, code: &str) -> Result<Vec<GeoPoint>>;
}

/// Turns `(code, distance, unit)` into a [`RadiusFilter`].
#[derive(Debug, Clone, Default)]
pub struct GeoRadiusResolver {
    earth_radius: EarthRadius,
}

impl GeoRadiusResolver {
    pub fn new(earth_radius: EarthRadius) -> Self {
        Self { earth_radius }
    }

    pub fn earth_radius(&self) -> EarthRadius {
        self.earth_radius
    }

    /// `distance / earth_radius(unit)`.
    pub fn radius_radians(&self, distance: f64, unit: DistanceUnit) -> Result<f64> {
        if !distance.is_finite() || distance < 0.0 {
            return Err(QueryError::InvalidDistance(format!(
                "{distance} is not a non-negative number"
            )));
        }
        Ok(distance / self.earth_radius.in_unit(unit))
    }

    /// Geocode `code` and take the first candidate.
    pub async fn locate(&self, geocoder: &dyn Geocoder, code: &str) -> Result<GeoPoint> {
        let candidates = geocoder.geocode(code).await.map_err(|err| match err {
            err @ QueryError::Geocoding { .. } => err,
            other => {
                tracing::warn!(code, error = %other, "Geocoder request failed");
                QueryError::Geocoding {
                    code: code.to_string(),
                    reason: GeocodingFailure::Unavailable(other.to_string()),
                }
            }
        })?;

        candidates
            .into_iter()
            .next()
            .ok_or_else(|| QueryError::Geocoding {
                code: code.to_string(),
                reason: GeocodingFailure::NoResults,
            })
    }

    /// Build the radius filter for a radius search.
    ///
    /// The distance is validated before the geocoder is called.
    pub async fn resolve_radius(
        &self,
        geocoder: &dyn Geocoder,
        code: &str,
        distance: f64,
        unit: DistanceUnit,
    ) -> Result<RadiusFilter> {
        let radius_radians = self.radius_radians(distance, unit)?;
        let center = self.locate(geocoder, code).await?;

        tracing::debug!(
            code,
            distance,
            unit = unit.as_str(),
            radius_radians,
            latitude = center.latitude,
            longitude = center.longitude,
            "Resolved radius filter"
        );

        Ok(RadiusFilter {
            center,
            radius_radians,
        })
    }
}
