//! Route definitions

pub mod metrics;
pub mod resources;
