//! Operator translator: raw parameters to filter expressions
//!
//! Parameter keys follow the bracket convention used by query-string parsers:
//! - `housing=true` is an equality match
//! - `averageCost[lte]=10000` is a range comparison
//! - `careers[in]=Business,UI/UX` (or `[Business,UI/UX]`) is set membership
//! - `careers=Business&careers=UI/UX` (repeated key) is set membership too
//!
//! Only the tokens of [`Operator`] are interpreted. Everything else is
//! dropped from the filter, never forwarded: a dropped parameter means "no
//! constraint on this field".

use crate::error::QueryError;
use crate::operator::Operator;
use crate::raw::{RawQuery, RawValue};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::cmp::Ordering;

/// Typed operand of a filter leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum FilterValue {
    /// A finite number; the client's spelling is kept for text comparisons.
    Number { value: f64, raw: String },
    Bool(bool),
    Text(String),
}

impl FilterValue {
    /// Type a raw query value: finite numbers, then booleans, then text.
    pub fn parse(raw: &str) -> Self {
        if let Ok(value) = raw.trim().parse::<f64>() {
            if value.is_finite() {
                return Self::Number {
                    value,
                    raw: raw.to_string(),
                };
            }
        }
        match raw {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            _ => Self::Text(raw.to_string()),
        }
    }

    /// The value as the client wrote it.
    pub fn raw(&self) -> &str {
        match self {
            Self::Number { raw, .. } => raw,
            Self::Bool(true) => "true",
            Self::Bool(false) => "false",
            Self::Text(text) => text,
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Number { value, .. } => {
                if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
                    JsonValue::from(*value as i64)
                } else {
                    serde_json::Number::from_f64(*value)
                        .map(JsonValue::Number)
                        .unwrap_or(JsonValue::Null)
                }
            }
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::Text(text) => JsonValue::String(text.clone()),
        }
    }
}

/// Operand of a leaf: one value, or a set for [`Operator::In`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LeafValue {
    Single(FilterValue),
    Set(Vec<FilterValue>),
}

/// `{field, operator, value}` constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterLeaf {
    pub field: String,
    pub op: Operator,
    pub value: LeafValue,
}

impl FilterLeaf {
    pub fn eq(field: impl Into<String>, value: FilterValue) -> Self {
        Self {
            field: field.into(),
            op: Operator::Eq,
            value: LeafValue::Single(value),
        }
    }

    /// Evaluate the leaf against a JSON document.
    pub fn matches(&self, doc: &JsonValue) -> bool {
        let Some(stored) = field_value(doc, &self.field) else {
            return false;
        };
        match (self.op, &self.value) {
            (Operator::Eq, LeafValue::Single(operand)) => equals_any(stored, operand),
            (Operator::In, LeafValue::Set(operands)) => {
                operands.iter().any(|operand| equals_any(stored, operand))
            }
            (op, LeafValue::Single(operand)) if op.is_range() => {
                compare(stored, operand).is_some_and(|ordering| op.accepts(ordering))
            }
            _ => false,
        }
    }
}

/// Conjunction of filter leaves. An empty expression matches every document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterExpression {
    leaves: Vec<FilterLeaf>,
}

impl FilterExpression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, leaf: FilterLeaf) -> Self {
        self.leaves.push(leaf);
        self
    }

    pub fn push(&mut self, leaf: FilterLeaf) {
        self.leaves.push(leaf);
    }

    pub fn leaves(&self) -> &[FilterLeaf] {
        &self.leaves
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn retain(&mut self, keep: impl FnMut(&FilterLeaf) -> bool) {
        self.leaves.retain(keep);
    }

    pub fn matches(&self, doc: &JsonValue) -> bool {
        self.leaves.iter().all(|leaf| leaf.matches(doc))
    }
}

/// Translate the non-reserved parameters of `raw` into a filter expression.
pub fn translate(raw: &RawQuery) -> FilterExpression {
    translate_with_diagnostics(raw).0
}

/// Like [`translate`], also returning one error per dropped parameter.
pub fn translate_with_diagnostics(raw: &RawQuery) -> (FilterExpression, Vec<QueryError>) {
    let mut expression = FilterExpression::new();
    let mut dropped = Vec::new();

    for (key, value) in raw.filter_params() {
        match translate_param(key, value) {
            Ok(leaf) => expression.push(leaf),
            Err(err) => {
                tracing::debug!(error = %err, "Dropping filter constraint");
                dropped.push(err);
            }
        }
    }

    (expression, dropped)
}

fn translate_param(key: &str, value: &RawValue) -> Result<FilterLeaf, QueryError> {
    let (field, token) = split_key(key).map_err(|reason| QueryError::filter_parse(key, reason))?;

    let op = match token {
        None if matches!(value, RawValue::List(_)) => Operator::In,
        None => Operator::Eq,
        Some(token) => Operator::from_token(token).ok_or_else(|| {
            QueryError::filter_parse(key, format!("unknown operator '{token}'"))
        })?,
    };

    let value = match (op, value) {
        (Operator::In, RawValue::List(values)) if token.is_none() => {
            LeafValue::Set(values.iter().map(|v| FilterValue::parse(v)).collect())
        }
        (Operator::In, value) => {
            let mut set = Vec::new();
            for raw in value.values() {
                set.extend(
                    parse_set(raw).map_err(|reason| QueryError::filter_parse(key, reason))?,
                );
            }
            if set.is_empty() {
                return Err(QueryError::filter_parse(key, "empty set"));
            }
            LeafValue::Set(set)
        }
        (_, RawValue::Scalar(raw)) => LeafValue::Single(FilterValue::parse(raw)),
        (op, RawValue::List(_)) => {
            return Err(QueryError::filter_parse(
                key,
                format!("operator '{op}' takes a single value"),
            ));
        }
    };

    Ok(FilterLeaf {
        field: field.to_string(),
        op,
        value,
    })
}

/// Split `field[token]` into its parts.
fn split_key(key: &str) -> Result<(&str, Option<&str>), String> {
    let (field, token) = match key.find('[') {
        None => (key, None),
        Some(open) => {
            let Some(inner) = key[open + 1..].strip_suffix(']') else {
                return Err("unterminated operator brackets".to_string());
            };
            if inner.contains('[') || inner.contains(']') {
                return Err("nested operator brackets".to_string());
            }
            (&key[..open], Some(inner))
        }
    };

    if !is_valid_field_path(field) {
        return Err(format!("invalid field name '{field}'"));
    }
    Ok((field, token))
}

/// Parse one `in` operand: `a,b,c` or `[a,b,c]`.
fn parse_set(raw: &str) -> Result<Vec<FilterValue>, String> {
    let trimmed = raw.trim();
    let opens = trimmed.starts_with('[');
    let closes = trimmed.ends_with(']');
    let inner = match (opens, closes) {
        (true, true) if trimmed.len() >= 2 => &trimmed[1..trimmed.len() - 1],
        (false, false) => trimmed,
        _ => return Err("unbalanced brackets in set".to_string()),
    };
    if inner.contains('[') || inner.contains(']') {
        return Err("nested brackets in set".to_string());
    }

    Ok(inner
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(FilterValue::parse)
        .collect())
}

/// Dotted path of identifier segments (`location.state`).
///
/// Rejects `$`-prefixed names and anything that is not a plain identifier, so
/// a field name can never smuggle store operator syntax.
pub fn is_valid_field_path(path: &str) -> bool {
    !path.is_empty()
        && path.split('.').all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

/// Resolve a dotted path inside a JSON document.
pub fn field_value<'a>(doc: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    path.split('.')
        .try_fold(doc, |current, segment| current.as_object()?.get(segment))
        .filter(|value| !value.is_null())
}

fn equals_any(stored: &JsonValue, operand: &FilterValue) -> bool {
    match stored {
        JsonValue::Array(items) => items.iter().any(|item| equals(item, operand)),
        other => equals(other, operand),
    }
}

fn equals(stored: &JsonValue, operand: &FilterValue) -> bool {
    match (stored, operand) {
        (JsonValue::Number(n), FilterValue::Number { value, .. }) => n.as_f64() == Some(*value),
        (JsonValue::Bool(b), FilterValue::Bool(expected)) => b == expected,
        (JsonValue::String(s), operand) => s == operand.raw(),
        _ => false,
    }
}

fn compare(stored: &JsonValue, operand: &FilterValue) -> Option<Ordering> {
    match (stored, operand) {
        (JsonValue::Number(n), FilterValue::Number { value, .. }) => n.as_f64()?.partial_cmp(value),
        (JsonValue::String(s), FilterValue::Text(text)) => Some(s.as_str().cmp(text.as_str())),
        _ => None,
    }
}
