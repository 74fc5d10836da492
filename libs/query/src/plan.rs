//! Query compiler: raw query + filter expression to an executable plan

use crate::error::QueryError;
use crate::filter::{is_valid_field_path, translate_with_diagnostics, FilterExpression};
use crate::raw::RawQuery;
use crate::store::ID_FIELD;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Defaults and limits applied by the compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Page size when `limit` is absent or invalid
    pub default_limit: u64,
    /// Upper bound for `limit`; larger requests are clamped
    pub max_limit: u64,
    /// Sort applied when `sort` is absent (same syntax as the parameter)
    pub default_sort: String,
    /// Appended ascending to every sort so the order is total
    pub tiebreak_field: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            default_limit: 25,
            max_limit: 100,
            default_sort: "-createdAt".to_string(),
            tiebreak_field: ID_FIELD.to_string(),
        }
    }
}

/// Which fields of each record to return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    All,
    Fields(Vec<String>),
}

impl Projection {
    /// Reduce a document to the projected (possibly dotted) paths.
    ///
    /// The identifier field is always kept.
    pub fn apply(&self, doc: &JsonValue) -> JsonValue {
        let Projection::Fields(fields) = self else {
            return doc.clone();
        };
        let Some(source) = doc.as_object() else {
            return doc.clone();
        };

        let mut out = Map::new();
        if let Some(id) = source.get(ID_FIELD) {
            out.insert(ID_FIELD.to_string(), id.clone());
        }
        for field in fields {
            let segments: Vec<&str> = field.split('.').collect();
            if let Some(value) = lookup(doc, &segments) {
                insert_path(&mut out, &segments, value.clone());
            }
        }
        JsonValue::Object(out)
    }
}

fn lookup<'a>(doc: &'a JsonValue, segments: &[&str]) -> Option<&'a JsonValue> {
    segments
        .iter()
        .try_fold(doc, |current, segment| current.as_object()?.get(*segment))
}

fn insert_path(target: &mut Map<String, JsonValue>, segments: &[&str], value: JsonValue) {
    match segments {
        [] => {}
        [last] => {
            target.insert(last.to_string(), value);
        }
        [head, rest @ ..] => {
            let child = target
                .entry(head.to_string())
                .or_insert_with(|| JsonValue::Object(Map::new()));
            if !child.is_object() {
                *child = JsonValue::Object(Map::new());
            }
            if let JsonValue::Object(map) = child {
                insert_path(map, rest, value);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// Compiled, store-independent description of one listing query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    pub filter: FilterExpression,
    pub projection: Projection,
    pub sort: Vec<SortKey>,
    /// 1-based page number the window was derived from
    pub page: u64,
    pub skip: u64,
    pub limit: u64,
}

impl QueryPlan {
    /// Strip every reference to protected fields (filters, sort keys, projection).
    ///
    /// A protected field must not be observable through range probing or
    /// ordering, not only through its value.
    pub fn restrict_fields(&mut self, protected: &[&str]) {
        let touches = |field: &str| {
            protected.iter().any(|p| {
                field == *p
                    || field
                        .strip_prefix(p)
                        .is_some_and(|rest| rest.starts_with('.'))
            })
        };
        self.filter.retain(|leaf| !touches(&leaf.field));
        self.sort.retain(|key| !touches(&key.field));
        if let Projection::Fields(fields) = &mut self.projection {
            fields.retain(|field| !touches(field));
        }
    }
}

/// Assembles filter, projection, sort and pagination window.
#[derive(Debug, Clone, Default)]
pub struct QueryCompiler {
    config: CompilerConfig,
}

impl QueryCompiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Translate and compile in one step, discarding diagnostics.
    pub fn build_plan(&self, raw: &RawQuery) -> QueryPlan {
        self.compile_with_diagnostics(raw).0
    }

    /// Translate and compile, returning every absorbed parse problem.
    pub fn compile_with_diagnostics(&self, raw: &RawQuery) -> (QueryPlan, Vec<QueryError>) {
        let (filter, mut diagnostics) = translate_with_diagnostics(raw);
        let (plan, compile_diagnostics) = self.compile(raw, filter);
        diagnostics.extend(compile_diagnostics);
        (plan, diagnostics)
    }

    /// Compile the reserved parameters of `raw` around an already translated filter.
    ///
    /// Never fails: invalid `select`/`sort`/`page`/`limit` input is replaced by
    /// defaults and reported in the returned list.
    pub fn compile(
        &self,
        raw: &RawQuery,
        filter: FilterExpression,
    ) -> (QueryPlan, Vec<QueryError>) {
        let mut diagnostics = Vec::new();

        let projection = match raw.reserved("select") {
            Some(select) => parse_projection(select, &mut diagnostics),
            None => Projection::All,
        };

        let mut sort = raw
            .reserved("sort")
            .map(|value| parse_sort(value, &mut diagnostics))
            .unwrap_or_default();
        if sort.is_empty() {
            sort = parse_sort(&self.config.default_sort, &mut Vec::new());
        }
        if !sort.iter().any(|key| key.field == self.config.tiebreak_field) {
            sort.push(SortKey::ascending(self.config.tiebreak_field.clone()));
        }

        let page = parse_positive(raw, "page", 1, &mut diagnostics);
        let mut limit = parse_positive(raw, "limit", self.config.default_limit, &mut diagnostics);
        if limit > self.config.max_limit {
            diagnostics.push(QueryError::validation(
                "limit",
                format!("{limit} exceeds maximum of {}", self.config.max_limit),
            ));
            limit = self.config.max_limit;
        }

        for diagnostic in &diagnostics {
            tracing::debug!(error = %diagnostic, "Substituting default for query parameter");
        }

        let plan = QueryPlan {
            filter,
            projection,
            sort,
            page,
            skip: (page - 1).saturating_mul(limit),
            limit,
        };
        (plan, diagnostics)
    }
}

fn parse_projection(value: &str, diagnostics: &mut Vec<QueryError>) -> Projection {
    let mut fields: Vec<String> = Vec::new();
    for field in value.split(',').map(str::trim).filter(|f| !f.is_empty()) {
        if !is_valid_field_path(field) {
            diagnostics.push(QueryError::validation(
                "select",
                format!("invalid field '{field}'"),
            ));
            continue;
        }
        if !fields.iter().any(|existing| existing == field) {
            fields.push(field.to_string());
        }
    }

    if fields.is_empty() {
        Projection::All
    } else {
        Projection::Fields(fields)
    }
}

/// Parse `name,-averageCost` into sort keys; `-` marks descending.
fn parse_sort(value: &str, diagnostics: &mut Vec<QueryError>) -> Vec<SortKey> {
    let mut keys: Vec<SortKey> = Vec::new();
    for raw in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (field, direction) = match raw.strip_prefix('-') {
            Some(rest) => (rest, SortDirection::Descending),
            None => (raw, SortDirection::Ascending),
        };
        if !is_valid_field_path(field) {
            diagnostics.push(QueryError::validation(
                "sort",
                format!("invalid field '{raw}'"),
            ));
            continue;
        }
        // First mention of a field decides its direction.
        if keys.iter().any(|key| key.field == field) {
            continue;
        }
        keys.push(SortKey {
            field: field.to_string(),
            direction,
        });
    }
    keys
}

fn parse_positive(
    raw: &RawQuery,
    param: &str,
    default: u64,
    diagnostics: &mut Vec<QueryError>,
) -> u64 {
    let Some(value) = raw.reserved(param) else {
        return default;
    };
    match value.trim().parse::<u64>() {
        Ok(parsed) if parsed > 0 => parsed,
        _ => {
            diagnostics.push(QueryError::validation(
                param,
                format!("'{value}' is not a positive integer"),
            ));
            default
        }
    }
}
