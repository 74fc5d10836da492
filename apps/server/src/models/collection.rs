//! Resource collections served under `/api/v1`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Bootcamps,
    Courses,
    Reviews,
    Users,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Bootcamps,
        Collection::Courses,
        Collection::Reviews,
        Collection::Users,
    ];

    /// Path segment and store collection name.
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Bootcamps => "bootcamps",
            Collection::Courses => "courses",
            Collection::Reviews => "reviews",
            Collection::Users => "users",
        }
    }

    /// Singular name used in client-facing messages.
    pub fn resource_name(self) -> &'static str {
        match self {
            Collection::Bootcamps => "Bootcamp",
            Collection::Courses => "Course",
            Collection::Reviews => "Review",
            Collection::Users => "User",
        }
    }

    /// Fields that must be present (and non-null) on create.
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            Collection::Bootcamps => &["name"],
            Collection::Courses => &["title"],
            Collection::Reviews => &["title", "text", "rating"],
            Collection::Users => &["name", "email"],
        }
    }

    /// Fields that are never returned and can never be filtered or sorted on.
    pub fn protected_fields(self) -> &'static [&'static str] {
        match self {
            Collection::Users => &["password"],
            _ => &[],
        }
    }

    /// GeoJSON point field used by radius searches.
    pub fn geo_field(self) -> Option<&'static str> {
        match self {
            Collection::Bootcamps => Some("location"),
            _ => None,
        }
    }

    /// Field of a course referencing its bootcamp.
    pub fn parent_field(self) -> Option<&'static str> {
        match self {
            Collection::Courses => Some("bootcamp"),
            _ => None,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|collection| collection.as_str() == s)
            .ok_or_else(|| format!("unknown collection '{s}'"))
    }
}
