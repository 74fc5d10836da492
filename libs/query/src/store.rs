//! Document store collaborator

use crate::error::Result;
use crate::filter::FilterExpression;
use crate::geo::RadiusFilter;
use crate::plan::{Projection, QueryPlan, SortKey};
use async_trait::async_trait;
use serde_json::Value as JsonValue;

/// Identifier field of every stored document.
pub const ID_FIELD: &str = "id";

/// Creation timestamp field (RFC 3339), the default sort key.
pub const CREATED_AT_FIELD: &str = "createdAt";

/// Which documents of a collection a query addresses.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    All,
    Filter(FilterExpression),
    /// Documents whose GeoJSON point at `field` lies inside `radius`.
    Within { field: String, radius: RadiusFilter },
}

impl Selector {
    pub fn from_filter(filter: &FilterExpression) -> Self {
        if filter.is_empty() {
            Self::All
        } else {
            Self::Filter(filter.clone())
        }
    }
}

/// Projection, order and window of a `find`.
#[derive(Debug, Clone, PartialEq)]
pub struct FindOptions {
    pub projection: Projection,
    pub sort: Vec<SortKey>,
    pub skip: u64,
    /// `None` returns every matching document
    pub limit: Option<u64>,
}

impl FindOptions {
    pub fn unbounded() -> Self {
        Self {
            projection: Projection::All,
            sort: Vec::new(),
            skip: 0,
            limit: None,
        }
    }
}

impl From<&QueryPlan> for FindOptions {
    fn from(plan: &QueryPlan) -> Self {
        Self {
            projection: plan.projection.clone(),
            sort: plan.sort.clone(),
            skip: plan.skip,
            limit: Some(plan.limit),
        }
    }
}

/// Storage backend for JSON documents grouped in named collections.
///
/// Implementations report every failure as [`crate::QueryError::Store`]; the
/// engine propagates those untouched.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Matching documents, projected, ordered and windowed per `options`.
    async fn find(
        &self,
        collection: &str,
        selector: &Selector,
        options: &FindOptions,
    ) -> Result<Vec<JsonValue>>;

    /// Number of documents matching `selector`, ignoring any window.
    async fn count(&self, collection: &str, selector: &Selector) -> Result<u64>;

    /// Fetch one document by id.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<JsonValue>>;

    /// Store a new document. The document carries its own `id`.
    async fn insert(&self, collection: &str, document: JsonValue) -> Result<JsonValue>;

    /// Merge top-level fields of `changes` into an existing document.
    ///
    /// Returns the updated document, or `None` when the id does not exist.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        changes: JsonValue,
    ) -> Result<Option<JsonValue>>;

    /// Remove a document; returns whether it existed.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool>;
}
