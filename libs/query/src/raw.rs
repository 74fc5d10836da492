//! Raw query parameters as received from the HTTP layer

use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Parameter names consumed structurally by the compiler; never filters.
pub const RESERVED_PARAMS: &[&str] = &["select", "sort", "page", "limit"];

/// A single parameter value: one occurrence, or several in request order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Scalar(String),
    List(Vec<String>),
}

impl RawValue {
    /// First occurrence of the value.
    pub fn first(&self) -> Option<&str> {
        match self {
            RawValue::Scalar(s) => Some(s.as_str()),
            RawValue::List(values) => values.first().map(String::as_str),
        }
    }

    pub fn values(&self) -> Vec<&str> {
        match self {
            RawValue::Scalar(s) => vec![s.as_str()],
            RawValue::List(values) => values.iter().map(String::as_str).collect(),
        }
    }

    fn push(&mut self, value: String) {
        match self {
            RawValue::Scalar(existing) => {
                let first = std::mem::take(existing);
                *self = RawValue::List(vec![first, value]);
            }
            RawValue::List(values) => values.push(value),
        }
    }
}

/// Client-supplied query keyed by the verbatim parameter name.
///
/// Keys keep their bracket syntax (`averageCost[lte]`); interpreting it is the
/// job of the operator translator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawQuery {
    params: BTreeMap<String, RawValue>,
}

impl RawQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from ordered, already-decoded `(key, value)` pairs.
    ///
    /// Repeating a key turns its value into a list in request order.
    pub fn from_items(items: &[(String, String)]) -> Self {
        let mut query = Self::new();
        for (key, value) in items {
            query.insert(key.clone(), value.clone());
        }
        query
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        match self.params.entry(key.into()) {
            Entry::Occupied(mut entry) => entry.get_mut().push(value),
            Entry::Vacant(entry) => {
                entry.insert(RawValue::Scalar(value));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.params.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Value of a reserved parameter; the first occurrence wins.
    pub fn reserved(&self, name: &str) -> Option<&str> {
        debug_assert!(is_reserved(name));
        self.params.get(name).and_then(RawValue::first)
    }

    /// All non-reserved parameters in ascending key order.
    pub fn filter_params(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.params
            .iter()
            .filter(|(key, _)| !is_reserved(key))
            .map(|(key, value)| (key.as_str(), value))
    }
}

/// Whether a parameter name is reserved. Matches the bare name and any
/// bracketed form (`page[gt]`), so reserved names never become filters.
pub fn is_reserved(key: &str) -> bool {
    let base = key.split('[').next().unwrap_or(key);
    RESERVED_PARAMS.contains(&base)
}
