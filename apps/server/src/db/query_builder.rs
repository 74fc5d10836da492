//! SQL query builder for document selectors.
//!
//! Compiles selectors, sort keys and windows into SQL over the `documents`
//! table. Every client-derived value, including field paths, is bound as a
//! parameter; the generated SQL text only ever contains placeholders and
//! fixed fragments.

use devcamper_query::{
    FilterLeaf, FilterValue, FindOptions, LeafValue, Operator, RadiusFilter, Selector,
    SortDirection,
};

/// Bind values for `sqlx` queries.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Text(String),
    TextArray(Vec<String>),
    BigInt(i64),
}

/// Accumulates SQL text and its positional bind values.
#[derive(Debug, Default)]
pub struct QueryBuilder {
    bind_params: Vec<BindValue>,
}

impl QueryBuilder {
    fn push(&mut self, value: BindValue) -> usize {
        self.bind_params.push(value);
        self.bind_params.len()
    }

    fn push_text(&mut self, value: impl Into<String>) -> usize {
        self.push(BindValue::Text(value.into()))
    }

    fn push_path(&mut self, field: &str) -> usize {
        self.push(BindValue::TextArray(
            field.split('.').map(str::to_string).collect(),
        ))
    }

    /// `SELECT body … ORDER BY … OFFSET … LIMIT …`
    pub fn build_find(
        collection: &str,
        selector: &Selector,
        options: &FindOptions,
    ) -> (String, Vec<BindValue>) {
        let mut builder = Self::default();
        let where_clause = builder.where_clause(collection, selector);
        let mut sql = format!("SELECT body FROM documents WHERE {where_clause}");

        let order: Vec<String> = options
            .sort
            .iter()
            .map(|key| builder.order_clause(&key.field, key.direction))
            .collect();
        if !order.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.join(", "));
        }

        let offset = builder.push(BindValue::BigInt(to_i64(options.skip)));
        sql.push_str(&format!(" OFFSET ${offset}"));
        if let Some(limit) = options.limit {
            let limit = builder.push(BindValue::BigInt(to_i64(limit)));
            sql.push_str(&format!(" LIMIT ${limit}"));
        }

        (sql, builder.bind_params)
    }

    /// `SELECT COUNT(*) …` over the same selector, ignoring any window.
    pub fn build_count(collection: &str, selector: &Selector) -> (String, Vec<BindValue>) {
        let mut builder = Self::default();
        let where_clause = builder.where_clause(collection, selector);
        (
            format!("SELECT COUNT(*) FROM documents WHERE {where_clause}"),
            builder.bind_params,
        )
    }

    /// Missing and null first, then strings in byte order, numbers,
    /// booleans, arrays and objects; the same order the memory store uses.
    fn order_clause(&mut self, field: &str, direction: SortDirection) -> String {
        let path = self.push_path(field);
        let direction = match direction {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        };
        let value = format!("body #> ${path}::text[]");
        format!(
            "CASE jsonb_typeof({value}) WHEN 'string' THEN 1 WHEN 'number' THEN 2 \
             WHEN 'boolean' THEN 3 WHEN 'array' THEN 4 WHEN 'object' THEN 5 ELSE 0 END {direction}, \
             CASE WHEN jsonb_typeof({value}) = 'string' THEN body #>> ${path}::text[] END \
             COLLATE \"C\" {direction}, \
             {value} {direction}"
        )
    }

    fn where_clause(&mut self, collection: &str, selector: &Selector) -> String {
        let collection = self.push_text(collection);
        let mut clauses = vec![format!("collection = ${collection}")];

        match selector {
            Selector::All => {}
            Selector::Filter(filter) => {
                clauses.extend(filter.leaves().iter().map(|leaf| self.leaf_clause(leaf)));
            }
            Selector::Within { field, radius } => clauses.push(self.within_clause(field, radius)),
        }

        clauses.join(" AND ")
    }

    fn leaf_clause(&mut self, leaf: &FilterLeaf) -> String {
        match (leaf.op, &leaf.value) {
            (Operator::Eq, LeafValue::Single(operand)) => {
                self.membership_clause(&leaf.field, std::slice::from_ref(operand))
            }
            (Operator::In, LeafValue::Set(operands)) => {
                self.membership_clause(&leaf.field, operands)
            }
            (op, LeafValue::Single(operand)) if op.is_range() => {
                self.range_clause(&leaf.field, op, operand)
            }
            _ => "FALSE".to_string(),
        }
    }

    /// Field (or any element of an array field) equals one of the operands.
    ///
    /// Each operand contributes its typed JSON form; numbers and booleans also
    /// match a stored string spelled the way the client wrote them.
    fn membership_clause(&mut self, field: &str, operands: &[FilterValue]) -> String {
        let mut candidates: Vec<String> = Vec::new();
        for operand in operands {
            candidates.push(operand.to_json().to_string());
            if !matches!(operand, FilterValue::Text(_)) {
                candidates.push(serde_json::Value::String(operand.raw().to_string()).to_string());
            }
        }

        let path = self.push_path(field);
        let candidates = self.push(BindValue::TextArray(candidates));
        format!(
            "EXISTS (SELECT 1 FROM unnest(${candidates}::text[]) AS candidate(value) \
             WHERE body #> ${path}::text[] = candidate.value::jsonb \
             OR (jsonb_typeof(body #> ${path}::text[]) = 'array' \
             AND body #> ${path}::text[] @> jsonb_build_array(candidate.value::jsonb)))"
        )
    }

    /// Number-to-number or text-to-text comparison; other pairings never match.
    fn range_clause(&mut self, field: &str, op: Operator, operand: &FilterValue) -> String {
        let comparator = match op {
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Eq | Operator::In => return "FALSE".to_string(),
        };

        match operand {
            FilterValue::Number { value, .. } => {
                let path = self.push_path(field);
                let value = self.push_text(value.to_string());
                format!(
                    "CASE WHEN jsonb_typeof(body #> ${path}::text[]) = 'number' \
                     THEN (body #>> ${path}::text[])::double precision {comparator} ${value}::double precision \
                     ELSE FALSE END"
                )
            }
            FilterValue::Text(text) => {
                let path = self.push_path(field);
                let value = self.push_text(text.clone());
                format!(
                    "CASE WHEN jsonb_typeof(body #> ${path}::text[]) = 'string' \
                     THEN (body #>> ${path}::text[]) COLLATE \"C\" {comparator} ${value} \
                     ELSE FALSE END"
                )
            }
            FilterValue::Bool(_) => "FALSE".to_string(),
        }
    }

    /// Haversine central angle between the stored GeoJSON point and the center.
    fn within_clause(&mut self, field: &str, radius: &RadiusFilter) -> String {
        let path = self.push_path(field);
        let lat = self.push_text(radius.center.latitude.to_string());
        let lng = self.push_text(radius.center.longitude.to_string());
        let max = self.push_text(radius.radius_radians.to_string());

        let coordinates = format!("(body #> ${path}::text[] -> 'coordinates')");
        let point_lng = format!("({coordinates} ->> 0)::double precision");
        let point_lat = format!("({coordinates} ->> 1)::double precision");

        format!(
            "CASE WHEN jsonb_typeof({coordinates} -> 0) = 'number' \
             AND jsonb_typeof({coordinates} -> 1) = 'number' \
             THEN 2 * asin(least(1.0, sqrt(\
             power(sin(radians({point_lat} - ${lat}::double precision) / 2), 2) \
             + cos(radians(${lat}::double precision)) * cos(radians({point_lat})) \
             * power(sin(radians({point_lng} - ${lng}::double precision) / 2), 2)))) \
             <= ${max}::double precision \
             ELSE FALSE END"
        )
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
