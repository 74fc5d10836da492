//! Service layer - request orchestration on top of the store and the query engine

pub mod resources;

pub use resources::ResourceService;
