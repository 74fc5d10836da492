//! Domain models for the API server

pub mod collection;

pub use collection::Collection;
