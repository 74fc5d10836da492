//! Error types for query translation and execution

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, QueryError>;

/// Query engine errors
///
/// `Validation` and `FilterParse` are produced while parsing client input and
/// are absorbed by the compiler (defaults are substituted, constraints are
/// dropped). The remaining variants come from the execution stage and are
/// always propagated.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Invalid {param} value: {reason}")]
    Validation { param: String, reason: String },

    #[error("Invalid filter on '{key}': {reason}")]
    FilterParse { key: String, reason: String },

    #[error("Invalid distance: {0}")]
    InvalidDistance(String),

    #[error("Could not resolve location '{code}': {reason}")]
    Geocoding { code: String, reason: GeocodingFailure },

    #[error("Store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Why a postal code could not be turned into coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeocodingFailure {
    /// The geocoder answered, but with zero usable candidates.
    NoResults,
    /// The geocoder could not be reached or returned an unusable response.
    Unavailable(String),
}

impl std::fmt::Display for GeocodingFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeocodingFailure::NoResults => write!(f, "no matching location found"),
            GeocodingFailure::Unavailable(reason) => write!(f, "geocoder unavailable ({reason})"),
        }
    }
}

impl QueryError {
    pub fn validation(param: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            param: param.into(),
            reason: reason.into(),
        }
    }

    pub fn filter_parse(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::FilterParse {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Wrap any backend error as a store failure.
    pub fn store<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Store(Box::new(err))
    }

    /// Parsing-stage errors are recovered locally; everything else propagates.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::FilterParse { .. })
    }
}
