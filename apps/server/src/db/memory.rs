//! In-memory document store
//!
//! Default backend for development and the backend used by the test suite.
//! Evaluates selectors with the query engine's own matchers, so its results
//! define the reference behavior the Postgres backend mirrors.

use async_trait::async_trait;
use devcamper_query::{
    field_value, DocumentStore, FindOptions, GeoPoint, QueryError, Result, Selector, SortDirection,
    SortKey, ID_FIELD,
};
use serde_json::Value as JsonValue;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::RwLock;

const BACKEND: &str = "memory";

#[derive(Debug, thiserror::Error)]
pub enum MemoryStoreError {
    #[error("document has no string 'id' field")]
    MissingId,

    #[error("document '{id}' already exists in '{collection}'")]
    DuplicateId { collection: String, id: String },

    #[error("document must be a JSON object")]
    NotAnObject,
}

/// Collections of JSON documents kept in insertion order.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Vec<JsonValue>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn find(
        &self,
        collection: &str,
        selector: &Selector,
        options: &FindOptions,
    ) -> Result<Vec<JsonValue>> {
        let started = Instant::now();
        let collections = self.collections.read().await;
        let documents = collections.get(collection).map(Vec::as_slice).unwrap_or(&[]);

        let mut matched: Vec<&JsonValue> = documents
            .iter()
            .filter(|doc| selector_matches(selector, doc))
            .collect();
        matched.sort_by(|a, b| compare_documents(a, b, &options.sort));

        let skip = usize::try_from(options.skip).unwrap_or(usize::MAX);
        let limit = options
            .limit
            .map(|limit| usize::try_from(limit).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);

        let page = matched
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|doc| options.projection.apply(doc))
            .collect();

        super::observe(BACKEND, "find", started);
        Ok(page)
    }

    async fn count(&self, collection: &str, selector: &Selector) -> Result<u64> {
        let started = Instant::now();
        let collections = self.collections.read().await;
        let count = collections
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|doc| selector_matches(selector, doc))
                    .count()
            })
            .unwrap_or(0);

        super::observe(BACKEND, "count", started);
        Ok(count as u64)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<JsonValue>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|documents| documents.iter().find(|doc| has_id(doc, id)))
            .cloned())
    }

    async fn insert(&self, collection: &str, document: JsonValue) -> Result<JsonValue> {
        let started = Instant::now();
        if !document.is_object() {
            return Err(QueryError::store(MemoryStoreError::NotAnObject));
        }
        let id = document
            .get(ID_FIELD)
            .and_then(JsonValue::as_str)
            .ok_or_else(|| QueryError::store(MemoryStoreError::MissingId))?
            .to_string();

        let mut collections = self.collections.write().await;
        let documents = collections.entry(collection.to_string()).or_default();
        if documents.iter().any(|doc| has_id(doc, &id)) {
            return Err(QueryError::store(MemoryStoreError::DuplicateId {
                collection: collection.to_string(),
                id,
            }));
        }
        documents.push(document.clone());

        super::observe(BACKEND, "insert", started);
        Ok(document)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        changes: JsonValue,
    ) -> Result<Option<JsonValue>> {
        let JsonValue::Object(changes) = changes else {
            return Err(QueryError::store(MemoryStoreError::NotAnObject));
        };

        let mut collections = self.collections.write().await;
        let Some(document) = collections
            .get_mut(collection)
            .and_then(|documents| documents.iter_mut().find(|doc| has_id(doc, id)))
        else {
            return Ok(None);
        };

        if let JsonValue::Object(fields) = document {
            for (key, value) in changes {
                fields.insert(key, value);
            }
        }
        Ok(Some(document.clone()))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let before = documents.len();
        documents.retain(|doc| !has_id(doc, id));
        Ok(documents.len() != before)
    }
}

fn has_id(document: &JsonValue, id: &str) -> bool {
    document.get(ID_FIELD).and_then(JsonValue::as_str) == Some(id)
}

fn selector_matches(selector: &Selector, document: &JsonValue) -> bool {
    match selector {
        Selector::All => true,
        Selector::Filter(filter) => filter.matches(document),
        Selector::Within { field, radius } => field_value(document, field)
            .and_then(GeoPoint::from_geojson)
            .is_some_and(|point| radius.contains(&point)),
    }
}

fn compare_documents(a: &JsonValue, b: &JsonValue, sort: &[SortKey]) -> Ordering {
    for key in sort {
        let ordering = compare_values(field_value(a, &key.field), field_value(b, &key.field));
        let ordering = match key.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Missing < string < number < boolean < array < object, as jsonb orders them.
fn type_rank(value: Option<&JsonValue>) -> u8 {
    match value {
        None | Some(JsonValue::Null) => 0,
        Some(JsonValue::String(_)) => 1,
        Some(JsonValue::Number(_)) => 2,
        Some(JsonValue::Bool(_)) => 3,
        Some(JsonValue::Array(_)) => 4,
        Some(JsonValue::Object(_)) => 5,
    }
}

fn compare_values(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    match (a, b) {
        (Some(JsonValue::Number(x)), Some(JsonValue::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(JsonValue::String(x)), Some(JsonValue::String(y))) => x.cmp(y),
        (Some(JsonValue::Bool(x)), Some(JsonValue::Bool(y))) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
