//! Prometheus metrics for the API server

use crate::models::Collection;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge_vec, HistogramVec,
    IntCounterVec, IntGaugeVec,
};

/// Prefix of every resource route.
pub const API_PREFIX: &str = "/api/v1";

lazy_static! {
    // HTTP Request Metrics

    /// Total HTTP requests by method, path, and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "devcamper_http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .expect("Failed to register HTTP_REQUESTS_TOTAL");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "devcamper_http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("Failed to register HTTP_REQUEST_DURATION_SECONDS");

    pub static ref HTTP_REQUESTS_IN_FLIGHT: IntGaugeVec = register_int_gauge_vec!(
        "devcamper_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
        &["method", "path"]
    )
    .expect("Failed to register HTTP_REQUESTS_IN_FLIGHT");

    // Query Metrics

    /// Client constraints dropped by the translator or replaced by defaults
    pub static ref QUERY_DIAGNOSTICS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "devcamper_query_diagnostics_total",
        "Query parameters dropped or replaced with defaults",
        &["collection", "kind"]
    )
    .expect("Failed to register QUERY_DIAGNOSTICS_TOTAL");

    pub static ref LIST_RESULTS: HistogramVec = register_histogram_vec!(
        "devcamper_list_results",
        "Number of records returned per listing page",
        &["collection"],
        vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0]
    )
    .expect("Failed to register LIST_RESULTS");

    // Collaborator Metrics

    pub static ref GEOCODER_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "devcamper_geocoder_requests_total",
        "Geocoder requests by outcome",
        &["provider", "outcome"]
    )
    .expect("Failed to register GEOCODER_REQUESTS_TOTAL");

    pub static ref STORE_QUERY_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "devcamper_store_query_duration_seconds",
        "Document store operation duration in seconds",
        &["backend", "operation"],
        vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]
    )
    .expect("Failed to register STORE_QUERY_DURATION_SECONDS");
}

/// Replace ids and free-form segments with placeholders to bound label cardinality.
///
/// Only routes the router actually serves keep their shape; everything else
/// collapses to `/other` or `/api/v1/other`.
pub fn sanitize_path(path: &str) -> String {
    let Some(rest) = path.strip_prefix(API_PREFIX) else {
        return match path {
            "/" | "/health" | "/metrics" => path.to_string(),
            _ => "/other".to_string(),
        };
    };

    let segments: Vec<&str> = rest.trim_matches('/').split('/').collect();
    let Some(collection) = segments
        .first()
        .and_then(|segment| segment.parse::<Collection>().ok())
    else {
        return format!("{API_PREFIX}/other");
    };

    let bootcamps = collection == Collection::Bootcamps;
    match &segments[1..] {
        [] => format!("{API_PREFIX}/{collection}"),
        ["radius", _, _] if bootcamps => {
            format!("{API_PREFIX}/{collection}/radius/{{zipcode}}/{{distance}}")
        }
        [_] => format!("{API_PREFIX}/{collection}/{{id}}"),
        [_, "courses"] if bootcamps => format!("{API_PREFIX}/{collection}/{{id}}/courses"),
        _ => format!("{API_PREFIX}/other"),
    }
}

/// Collection addressed by a resource route.
pub fn extract_collection(path: &str) -> Option<Collection> {
    let rest = path.strip_prefix(API_PREFIX)?.trim_start_matches('/');
    rest.split('/').next()?.parse().ok()
}
