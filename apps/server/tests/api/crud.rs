//! Single-resource tests (POST, GET, PUT, DELETE)
//!
//! Tests cover:
//! - 201 Created with server-assigned id and timestamp
//! - Required field validation
//! - Address geocoding on write
//! - 404 Not Found envelopes for unknown ids
//! - Top-level merge on update

use crate::support::{
    assert_failure, assert_status, assert_success, bootcamp, to_json_body, TestApp,
};
use axum::body::Bytes;
use axum::http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn create_then_read_bootcamp() -> anyhow::Result<()> {
    let app = TestApp::new();

    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/bootcamps",
            Some(&json!({
                "name": "Devworks Bootcamp",
                "address": "233 Bay State Rd Boston MA 02215",
                "careers": ["Web Development", "UI/UX"],
                "id": "client-chosen"
            })),
        )
        .await?;

    assert_status(status, StatusCode::CREATED, "create");
    let created = assert_success(&body)?;
    let id = created["id"].as_str().expect("id assigned");
    assert_ne!(id, "client-chosen");
    assert!(created["createdAt"].is_string());
    assert_eq!(created["location"]["type"], "Point");
    assert_eq!(
        created["location"]["coordinates"],
        json!([-71.104028, 42.350846])
    );

    let (status, body) = app
        .request_json(Method::GET, &format!("/api/v1/bootcamps/{id}"), None)
        .await?;
    assert_status(status, StatusCode::OK, "read");
    assert_eq!(assert_success(&body)?["name"], "Devworks Bootcamp");
    Ok(())
}

#[tokio::test]
async fn create_reports_missing_required_fields() -> anyhow::Result<()> {
    let app = TestApp::new();

    let (status, body) = app
        .request_json(Method::POST, "/api/v1/reviews", Some(&json!({"title": "Great"})))
        .await?;

    assert_status(status, StatusCode::BAD_REQUEST, "create review");
    assert_eq!(
        assert_failure(&body)?,
        "Please add a text, Please add a rating"
    );
    Ok(())
}

#[tokio::test]
async fn create_with_ungeocodable_address_is_not_found() -> anyhow::Result<()> {
    let app = TestApp::new();

    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/bootcamps",
            Some(&json!({"name": "Nowhere Bootcamp", "address": "1 Nowhere Lane"})),
        )
        .await?;

    assert_status(status, StatusCode::NOT_FOUND, "create with unknown address");
    assert_failure(&body)?;
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() -> anyhow::Result<()> {
    let app = TestApp::new();

    let (status, _headers, body) = app
        .request(
            Method::POST,
            "/api/v1/courses",
            Some(Bytes::from_static(b"{\"title\": ")),
        )
        .await?;

    assert_status(status, StatusCode::BAD_REQUEST, "malformed body");
    let body: serde_json::Value = serde_json::from_slice(&body)?;
    assert!(assert_failure(&body)?.starts_with("Invalid request body"));
    Ok(())
}

#[tokio::test]
async fn read_unknown_id_is_not_found() -> anyhow::Result<()> {
    let app = TestApp::new();

    let (status, body) = app
        .request_json(Method::GET, "/api/v1/bootcamps/5d725a1b7b292f5f8ceff788", None)
        .await?;

    assert_status(status, StatusCode::NOT_FOUND, "read unknown");
    assert_eq!(
        assert_failure(&body)?,
        "Bootcamp with id of 5d725a1b7b292f5f8ceff788 was not found"
    );
    Ok(())
}

#[tokio::test]
async fn update_merges_top_level_fields() -> anyhow::Result<()> {
    let app = TestApp::new();
    app.seed("bootcamps", vec![bootcamp("devworks", "Devworks Bootcamp", 10000, &["Business"])])
        .await?;

    let (status, body) = app
        .request_json(
            Method::PUT,
            "/api/v1/bootcamps/devworks",
            Some(&json!({"housing": true, "averageCost": 9000})),
        )
        .await?;

    assert_status(status, StatusCode::OK, "update");
    let updated = assert_success(&body)?;
    assert_eq!(updated["name"], "Devworks Bootcamp");
    assert_eq!(updated["housing"], true);
    assert_eq!(updated["averageCost"], 9000);

    let (status, _) = app
        .request_json(
            Method::PUT,
            "/api/v1/bootcamps/missing",
            Some(&json!({"housing": true})),
        )
        .await?;
    assert_status(status, StatusCode::NOT_FOUND, "update unknown");
    Ok(())
}

#[tokio::test]
async fn delete_removes_the_resource() -> anyhow::Result<()> {
    let app = TestApp::new();
    app.seed("bootcamps", vec![bootcamp("devworks", "Devworks Bootcamp", 10000, &["Business"])])
        .await?;

    let (status, body) = app
        .request_json(Method::DELETE, "/api/v1/bootcamps/devworks", None)
        .await?;
    assert_status(status, StatusCode::OK, "delete");
    assert_eq!(
        assert_success(&body)?["message"],
        "Bootcamp with id devworks was deleted!"
    );

    let (status, _) = app
        .request_json(Method::GET, "/api/v1/bootcamps/devworks", None)
        .await?;
    assert_status(status, StatusCode::NOT_FOUND, "read after delete");

    let (status, _) = app
        .request_json(Method::DELETE, "/api/v1/bootcamps/devworks", None)
        .await?;
    assert_status(status, StatusCode::NOT_FOUND, "delete twice");
    Ok(())
}

#[tokio::test]
async fn responses_carry_request_ids() -> anyhow::Result<()> {
    let app = TestApp::new();

    let (_, headers, _) = app
        .request(Method::GET, "/api/v1/courses", None)
        .await?;
    assert!(headers.contains_key("x-request-id"));

    let body = to_json_body(&json!({"title": "Full Stack"}))?;
    let (status, headers, _) = app
        .request(Method::POST, "/api/v1/courses", Some(body))
        .await?;
    assert_status(status, StatusCode::CREATED, "create course");
    assert!(headers.contains_key("x-request-id"));
    Ok(())
}
