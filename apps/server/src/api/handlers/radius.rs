//! Geospatial radius search handler

use crate::{api::extractors::QueryParams, state::AppState, Result};
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
};
use devcamper_query::RawValue;
use serde_json::json;

/// GET /api/v1/bootcamps/radius/{zipcode}/{distance}?unit=mi|km
///
/// Results are not paginated; `count` is the number of matches returned.
pub async fn bootcamps_in_radius(
    State(state): State<AppState>,
    Path((zipcode, distance)): Path<(String, String)>,
    QueryParams(raw): QueryParams,
) -> Result<impl IntoResponse> {
    let unit = raw.get("unit").and_then(RawValue::first);
    let bootcamps = state
        .resources
        .within_radius(&zipcode, &distance, unit)
        .await?;

    Ok(Json(json!({
        "success": true,
        "count": bootcamps.len(),
        "data": bootcamps,
    })))
}
