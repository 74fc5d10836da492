//! Error types for the API server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use devcamper_query::{GeocodingFailure, QueryError};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{resource} with id of {id} was not found")]
    ResourceNotFound { resource: &'static str, id: String },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::ResourceNotFound { .. } | Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Validation(_) | Error::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Error::Query(err) => match err {
                QueryError::Validation { .. }
                | QueryError::FilterParse { .. }
                | QueryError::InvalidDistance(_) => StatusCode::BAD_REQUEST,
                QueryError::Geocoding {
                    reason: GeocodingFailure::NoResults,
                    ..
                } => StatusCode::NOT_FOUND,
                QueryError::Geocoding {
                    reason: GeocodingFailure::Unavailable(_),
                    ..
                } => StatusCode::FAILED_DEPENDENCY,
                QueryError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Database(_)
            | Error::Migration(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Internal error: {}", self);
            "Server Error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "success": false,
            "error": message,
        }));

        (status, body).into_response()
    }
}
