//! Resource service - listing, radius search and CRUD over document collections
//!
//! Orchestrates requests by:
//! - Compiling client query parameters into a query plan
//! - Executing the plan against the document store
//! - Attaching pagination descriptors and hiding protected fields

use crate::{models::Collection, Error, Result};
use chrono::{SecondsFormat, Utc};
use devcamper_query::{
    paginate, DistanceUnit, DocumentStore, FilterLeaf, FilterValue, FindOptions, GeoRadiusResolver,
    Geocoder, PageResult, QueryCompiler, QueryError, QueryPlan, RawQuery, Selector,
    CREATED_AT_FIELD, ID_FIELD,
};
use serde_json::{json, Map, Value as JsonValue};
use std::sync::Arc;
use uuid::Uuid;

/// Address field geocoded into the geo field on write.
const ADDRESS_FIELD: &str = "address";

/// Resource service coordinates listing, radius search and CRUD
pub struct ResourceService {
    store: Arc<dyn DocumentStore>,
    geocoder: Arc<dyn Geocoder>,
    compiler: QueryCompiler,
    resolver: GeoRadiusResolver,
    default_unit: DistanceUnit,
}

impl ResourceService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        geocoder: Arc<dyn Geocoder>,
        compiler: QueryCompiler,
        resolver: GeoRadiusResolver,
        default_unit: DistanceUnit,
    ) -> Self {
        Self {
            store,
            geocoder,
            compiler,
            resolver,
            default_unit,
        }
    }

    /// List one page of a collection.
    ///
    /// GET /api/v1/{collection}?filters&select&sort&page&limit
    pub async fn list(
        &self,
        collection: Collection,
        raw: &RawQuery,
    ) -> Result<PageResult<JsonValue>> {
        self.list_constrained(collection, raw, None).await
    }

    /// Courses of one bootcamp, combined with the client's own filters.
    ///
    /// GET /api/v1/bootcamps/{id}/courses
    pub async fn courses_for_bootcamp(
        &self,
        bootcamp_id: &str,
        raw: &RawQuery,
    ) -> Result<PageResult<JsonValue>> {
        let collection = Collection::Courses;
        let parent = collection
            .parent_field()
            .ok_or_else(|| Error::Internal("courses have no parent field".to_string()))?;
        let constraint = FilterLeaf::eq(parent, FilterValue::Text(bootcamp_id.to_string()));
        self.list_constrained(collection, raw, Some(constraint)).await
    }

    #[tracing::instrument(skip_all, fields(collection = %collection))]
    async fn list_constrained(
        &self,
        collection: Collection,
        raw: &RawQuery,
        constraint: Option<FilterLeaf>,
    ) -> Result<PageResult<JsonValue>> {
        let plan = self.plan(collection, raw, constraint);
        let selector = Selector::from_filter(&plan.filter);
        let options = FindOptions::from(&plan);

        let (count, items) = tokio::try_join!(
            self.store.count(collection.as_str(), &selector),
            self.store.find(collection.as_str(), &selector, &options),
        )?;

        let items: Vec<JsonValue> = items
            .into_iter()
            .map(|doc| hide_protected(collection, doc))
            .collect();

        crate::metrics::LIST_RESULTS
            .with_label_values(&[collection.as_str()])
            .observe(items.len() as f64);
        tracing::debug!(
            count,
            returned = items.len(),
            page = plan.page,
            limit = plan.limit,
            "Listed resources"
        );

        Ok(paginate(&plan, items, count))
    }

    /// Compile `raw` for `collection`, recording every absorbed parse problem.
    pub fn plan(
        &self,
        collection: Collection,
        raw: &RawQuery,
        constraint: Option<FilterLeaf>,
    ) -> QueryPlan {
        let (mut plan, diagnostics) = self.compiler.compile_with_diagnostics(raw);
        for diagnostic in &diagnostics {
            let kind = match diagnostic {
                QueryError::FilterParse { .. } => "filter",
                _ => "validation",
            };
            crate::metrics::QUERY_DIAGNOSTICS_TOTAL
                .with_label_values(&[collection.as_str(), kind])
                .inc();
        }

        plan.restrict_fields(collection.protected_fields());
        if let Some(constraint) = constraint {
            plan.filter.push(constraint);
        }
        plan
    }

    /// Bootcamps within `distance` of the location of a postal code.
    ///
    /// GET /api/v1/bootcamps/radius/{zipcode}/{distance}?unit=mi|km
    #[tracing::instrument(skip(self))]
    pub async fn within_radius(
        &self,
        zipcode: &str,
        distance: &str,
        unit: Option<&str>,
    ) -> Result<Vec<JsonValue>> {
        let collection = Collection::Bootcamps;
        let field = collection
            .geo_field()
            .ok_or_else(|| Error::Internal("bootcamps have no geo field".to_string()))?;

        let distance: f64 = distance.trim().parse().map_err(|_| {
            QueryError::InvalidDistance(format!("'{distance}' is not a number"))
        })?;
        let unit = match unit {
            Some(unit) => unit.parse::<DistanceUnit>()?,
            None => self.default_unit,
        };

        let radius = self
            .resolver
            .resolve_radius(self.geocoder.as_ref(), zipcode, distance, unit)
            .await?;

        // Default order keeps repeated radius searches stable.
        let options = FindOptions {
            sort: self.compiler.build_plan(&RawQuery::new()).sort,
            ..FindOptions::unbounded()
        };
        let selector = Selector::Within {
            field: field.to_string(),
            radius,
        };
        let items = self
            .store
            .find(collection.as_str(), &selector, &options)
            .await?;

        Ok(items
            .into_iter()
            .map(|doc| hide_protected(collection, doc))
            .collect())
    }

    /// GET /api/v1/{collection}/{id}
    pub async fn get(&self, collection: Collection, id: &str) -> Result<JsonValue> {
        self.store
            .get(collection.as_str(), id)
            .await?
            .map(|doc| hide_protected(collection, doc))
            .ok_or_else(|| not_found(collection, id))
    }

    /// POST /api/v1/{collection}
    #[tracing::instrument(skip_all, fields(collection = %collection))]
    pub async fn create(&self, collection: Collection, body: JsonValue) -> Result<JsonValue> {
        let mut fields = into_fields(body)?;
        fields.remove(ID_FIELD);
        fields.remove(CREATED_AT_FIELD);
        for protected in collection.protected_fields() {
            fields.remove(*protected);
        }

        let missing: Vec<String> = collection
            .required_fields()
            .iter()
            .filter(|field| is_blank(fields.get(**field)))
            .map(|field| format!("Please add a {field}"))
            .collect();
        if !missing.is_empty() {
            return Err(Error::Validation(missing.join(", ")));
        }

        self.geocode_address(collection, &mut fields).await?;

        let id = Uuid::new_v4().to_string();
        fields.insert(ID_FIELD.to_string(), JsonValue::String(id.clone()));
        fields.insert(
            CREATED_AT_FIELD.to_string(),
            JsonValue::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );

        let created = self
            .store
            .insert(collection.as_str(), JsonValue::Object(fields))
            .await?;
        tracing::info!(id = %id, "Created resource");
        Ok(hide_protected(collection, created))
    }

    /// PUT /api/v1/{collection}/{id} (top-level merge)
    #[tracing::instrument(skip_all, fields(collection = %collection))]
    pub async fn update(
        &self,
        collection: Collection,
        id: &str,
        body: JsonValue,
    ) -> Result<JsonValue> {
        let mut changes = into_fields(body)?;
        changes.remove(ID_FIELD);
        changes.remove(CREATED_AT_FIELD);
        for protected in collection.protected_fields() {
            changes.remove(*protected);
        }

        let cleared: Vec<String> = collection
            .required_fields()
            .iter()
            .filter(|field| changes.contains_key(**field) && is_blank(changes.get(**field)))
            .map(|field| format!("Please add a {field}"))
            .collect();
        if !cleared.is_empty() {
            return Err(Error::Validation(cleared.join(", ")));
        }

        if self.store.get(collection.as_str(), id).await?.is_none() {
            return Err(not_found(collection, id));
        }
        self.geocode_address(collection, &mut changes).await?;

        self.store
            .update(collection.as_str(), id, JsonValue::Object(changes))
            .await?
            .map(|doc| hide_protected(collection, doc))
            .ok_or_else(|| not_found(collection, id))
    }

    /// DELETE /api/v1/{collection}/{id}
    pub async fn delete(&self, collection: Collection, id: &str) -> Result<JsonValue> {
        if !self.store.delete(collection.as_str(), id).await? {
            return Err(not_found(collection, id));
        }
        tracing::info!(collection = %collection, id, "Deleted resource");
        Ok(json!({
            "message": format!("{} with id {} was deleted!", collection.resource_name(), id)
        }))
    }

    /// Turn a submitted `address` into a GeoJSON point on the geo field.
    ///
    /// An explicit geo value in the same write wins over the address.
    async fn geocode_address(
        &self,
        collection: Collection,
        fields: &mut Map<String, JsonValue>,
    ) -> Result<()> {
        let Some(geo_field) = collection.geo_field() else {
            return Ok(());
        };
        if fields.contains_key(geo_field) {
            return Ok(());
        }
        let Some(address) = fields.get(ADDRESS_FIELD).and_then(JsonValue::as_str) else {
            return Ok(());
        };

        let point = self.resolver.locate(self.geocoder.as_ref(), address).await?;
        let mut location = point.to_geojson();
        if let Some(object) = location.as_object_mut() {
            object.insert(
                "formattedAddress".to_string(),
                JsonValue::String(address.to_string()),
            );
        }
        fields.insert(geo_field.to_string(), location);
        Ok(())
    }
}

fn not_found(collection: Collection, id: &str) -> Error {
    Error::ResourceNotFound {
        resource: collection.resource_name(),
        id: id.to_string(),
    }
}

fn into_fields(body: JsonValue) -> Result<Map<String, JsonValue>> {
    match body {
        JsonValue::Object(fields) => Ok(fields),
        _ => Err(Error::InvalidBody("expected a JSON object".to_string())),
    }
}

fn is_blank(value: Option<&JsonValue>) -> bool {
    match value {
        None | Some(JsonValue::Null) => true,
        Some(JsonValue::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

fn hide_protected(collection: Collection, mut document: JsonValue) -> JsonValue {
    if let Some(fields) = document.as_object_mut() {
        for protected in collection.protected_fields() {
            fields.remove(*protected);
        }
    }
    document
}
