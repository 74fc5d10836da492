//! Radius search tests (GET /api/v1/bootcamps/radius/{zipcode}/{distance})
//!
//! Tests cover:
//! - Matching by great-circle distance in miles and kilometres
//! - Geocoder misses and outages
//! - Invalid distances and units

use crate::support::{
    assert_failure, assert_status, extract_ids, located_bootcamp, point, TestApp, BOSTON_ZIP,
    OUTAGE_ZIP, UNKNOWN_ZIP,
};
use axum::http::{Method, StatusCode};

async fn app_with_campuses() -> anyhow::Result<TestApp> {
    let app = TestApp::new();
    app.seed(
        "bootcamps",
        vec![
            located_bootcamp("boston", "Devworks Bootcamp", point(42.35, -71.06)),
            located_bootcamp("cambridge", "ModernTech Bootcamp", point(42.3736, -71.1097)),
            located_bootcamp("losangeles", "Codemasters", point(34.0522, -118.2437)),
        ],
    )
    .await?;
    Ok(app)
}

#[tokio::test]
async fn finds_bootcamps_within_miles() -> anyhow::Result<()> {
    let app = app_with_campuses().await?;

    let (status, body) = app
        .request_json(
            Method::GET,
            &format!("/api/v1/bootcamps/radius/{BOSTON_ZIP}/10"),
            None,
        )
        .await?;

    assert_status(status, StatusCode::OK, "radius 10 mi");
    assert_eq!(body["count"], 2);
    assert_eq!(extract_ids(&body)?, vec!["boston", "cambridge"]);
    assert!(body.get("pagination").is_none());
    Ok(())
}

#[tokio::test]
async fn kilometres_shrink_the_radius() -> anyhow::Result<()> {
    let app = app_with_campuses().await?;

    let (_, body) = app
        .request_json(
            Method::GET,
            &format!("/api/v1/bootcamps/radius/{BOSTON_ZIP}/3?unit=km"),
            None,
        )
        .await?;

    assert_eq!(extract_ids(&body)?, vec!["boston"]);
    Ok(())
}

#[tokio::test]
async fn zero_distance_matches_nothing_nearby() -> anyhow::Result<()> {
    let app = app_with_campuses().await?;

    let (status, body) = app
        .request_json(
            Method::GET,
            &format!("/api/v1/bootcamps/radius/{BOSTON_ZIP}/0"),
            None,
        )
        .await?;

    assert_status(status, StatusCode::OK, "radius 0");
    assert_eq!(body["count"], 0);
    Ok(())
}

#[tokio::test]
async fn unknown_zipcode_is_not_found() -> anyhow::Result<()> {
    let app = app_with_campuses().await?;

    let (status, body) = app
        .request_json(
            Method::GET,
            &format!("/api/v1/bootcamps/radius/{UNKNOWN_ZIP}/10"),
            None,
        )
        .await?;

    assert_status(status, StatusCode::NOT_FOUND, "unknown zipcode");
    assert_failure(&body)?;
    Ok(())
}

#[tokio::test]
async fn geocoder_outage_is_a_failed_dependency() -> anyhow::Result<()> {
    let app = app_with_campuses().await?;

    let (status, body) = app
        .request_json(
            Method::GET,
            &format!("/api/v1/bootcamps/radius/{OUTAGE_ZIP}/10"),
            None,
        )
        .await?;

    assert_status(status, StatusCode::FAILED_DEPENDENCY, "geocoder outage");
    assert_failure(&body)?;
    Ok(())
}

#[tokio::test]
async fn invalid_distances_are_bad_requests() -> anyhow::Result<()> {
    let app = app_with_campuses().await?;

    for path in [
        format!("/api/v1/bootcamps/radius/{BOSTON_ZIP}/-5"),
        format!("/api/v1/bootcamps/radius/{BOSTON_ZIP}/ten"),
        format!("/api/v1/bootcamps/radius/{BOSTON_ZIP}/10?unit=furlongs"),
    ] {
        let (status, body) = app.request_json(Method::GET, &path, None).await?;
        assert_status(status, StatusCode::BAD_REQUEST, &path);
        assert_failure(&body)?;
    }
    Ok(())
}
