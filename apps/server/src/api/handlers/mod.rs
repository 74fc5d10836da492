//! Request handlers for API endpoints
//!
//! Handlers coordinate between routes and services, handling:
//! - Request extraction
//! - Service invocation
//! - Response envelopes (`{ success, ... }`)

pub mod metrics;
pub mod radius;
pub mod resources;

pub use metrics::*;
pub use radius::*;
pub use resources::*;
