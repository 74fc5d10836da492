//! Database layer - document store backends

pub mod memory;
pub mod postgres;
pub mod query_builder;

pub use memory::MemoryDocumentStore;
pub use postgres::PostgresDocumentStore;

use std::time::Instant;

/// Record one store operation in the store latency histogram.
pub(crate) fn observe(backend: &str, operation: &str, started: Instant) {
    crate::metrics::STORE_QUERY_DURATION_SECONDS
        .with_label_values(&[backend, operation])
        .observe(started.elapsed().as_secs_f64());
}
