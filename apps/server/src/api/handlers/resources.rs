//! Collection listing and CRUD handlers

use crate::{
    api::extractors::{JsonBody, QueryParams},
    models::Collection,
    state::AppState,
    Result,
};
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use devcamper_query::PageResult;
use serde_json::{json, Value as JsonValue};

fn page_envelope(page: PageResult<JsonValue>) -> Json<JsonValue> {
    Json(json!({
        "success": true,
        "count": page.count,
        "pagination": page.pagination,
        "data": page.items,
    }))
}

fn data_envelope(data: JsonValue) -> Json<JsonValue> {
    Json(json!({
        "success": true,
        "data": data,
    }))
}

/// GET /api/v1/{collection}
pub async fn list_resources(
    State(state): State<AppState>,
    Extension(collection): Extension<Collection>,
    QueryParams(raw): QueryParams,
) -> Result<impl IntoResponse> {
    let page = state.resources.list(collection, &raw).await?;
    Ok(page_envelope(page))
}

/// GET /api/v1/bootcamps/{id}/courses
pub async fn bootcamp_courses(
    State(state): State<AppState>,
    Path(id): Path<String>,
    QueryParams(raw): QueryParams,
) -> Result<impl IntoResponse> {
    let page = state.resources.courses_for_bootcamp(&id, &raw).await?;
    Ok(page_envelope(page))
}

/// GET /api/v1/{collection}/{id}
pub async fn get_resource(
    State(state): State<AppState>,
    Extension(collection): Extension<Collection>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let document = state.resources.get(collection, &id).await?;
    Ok(data_envelope(document))
}

/// POST /api/v1/{collection}
pub async fn create_resource(
    State(state): State<AppState>,
    Extension(collection): Extension<Collection>,
    JsonBody(body): JsonBody,
) -> Result<impl IntoResponse> {
    let created = state.resources.create(collection, body).await?;
    Ok((StatusCode::CREATED, data_envelope(created)))
}

/// PUT /api/v1/{collection}/{id}
pub async fn update_resource(
    State(state): State<AppState>,
    Extension(collection): Extension<Collection>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> Result<impl IntoResponse> {
    let updated = state.resources.update(collection, &id, body).await?;
    Ok(data_envelope(updated))
}

/// DELETE /api/v1/{collection}/{id}
pub async fn delete_resource(
    State(state): State<AppState>,
    Extension(collection): Extension<Collection>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let outcome = state.resources.delete(collection, &id).await?;
    Ok(data_envelope(outcome))
}
