//! DevCamper API server
//!
//! REST API over bootcamps, courses, reviews and users with:
//! - Query-string filtering with comparison operators
//! - Field selection, multi-key sorting and offset pagination
//! - Radius search around a geocoded postal code
//! - Pluggable document stores (in-memory or PostgreSQL `jsonb`)

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod geocoder;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
pub use state::AppState;
