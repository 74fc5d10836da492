//! Collection listing tests (GET /api/v1/{collection})
//!
//! Tests cover:
//! - Pagination window and next/prev descriptors
//! - Default and client-requested ordering
//! - Comparison and membership filters
//! - Field selection
//! - Dropped operator-injection keys and protected fields

use crate::support::{
    assert_failure, assert_status, bootcamp, course, data_items, extract_ids, field_values,
    numbered_bootcamps, TestApp,
};
use axum::http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn last_page_reports_total_and_previous_page() -> anyhow::Result<()> {
    let app = TestApp::new();
    app.seed("bootcamps", numbered_bootcamps(47)).await?;

    let (status, body) = app
        .request_json(Method::GET, "/api/v1/bootcamps?page=5&limit=10", None)
        .await?;

    assert_status(status, StatusCode::OK, "list page 5");
    assert_eq!(body["count"], 47);
    assert_eq!(data_items(&body)?.len(), 7);
    assert_eq!(body["pagination"], json!({"prev": {"page": 4, "limit": 10}}));
    Ok(())
}

#[tokio::test]
async fn first_page_links_only_forward() -> anyhow::Result<()> {
    let app = TestApp::new();
    app.seed("bootcamps", numbered_bootcamps(12)).await?;

    let (_, body) = app
        .request_json(Method::GET, "/api/v1/bootcamps?limit=5", None)
        .await?;

    assert_eq!(body["count"], 12);
    assert_eq!(body["pagination"], json!({"next": {"page": 2, "limit": 5}}));
    assert_eq!(
        extract_ids(&body)?,
        vec!["b012", "b011", "b010", "b009", "b008"]
    );
    Ok(())
}

#[tokio::test]
async fn empty_collection_lists_nothing() -> anyhow::Result<()> {
    let app = TestApp::new();

    let (status, body) = app
        .request_json(Method::GET, "/api/v1/reviews", None)
        .await?;

    assert_status(status, StatusCode::OK, "list empty");
    assert_eq!(body["count"], 0);
    assert_eq!(body["pagination"], json!({}));
    assert!(data_items(&body)?.is_empty());
    Ok(())
}

#[tokio::test]
async fn invalid_window_parameters_fall_back_to_defaults() -> anyhow::Result<()> {
    let app = TestApp::new_with_config(|config| {
        config.query.default_limit = 3;
        config.query.max_limit = 5;
    });
    app.seed("bootcamps", numbered_bootcamps(8)).await?;

    let (status, body) = app
        .request_json(Method::GET, "/api/v1/bootcamps?page=zero&limit=-4", None)
        .await?;
    assert_status(status, StatusCode::OK, "invalid window");
    assert_eq!(data_items(&body)?.len(), 3);
    assert_eq!(body["pagination"], json!({"next": {"page": 2, "limit": 3}}));

    let (_, body) = app
        .request_json(Method::GET, "/api/v1/bootcamps?limit=500", None)
        .await?;
    assert_eq!(data_items(&body)?.len(), 5);
    assert_eq!(body["pagination"], json!({"next": {"page": 2, "limit": 5}}));
    Ok(())
}

#[tokio::test]
async fn range_filters_compare_numbers() -> anyhow::Result<()> {
    let app = TestApp::new();
    app.seed("bootcamps", numbered_bootcamps(6)).await?;

    let (_, body) = app
        .request_json(
            Method::GET,
            "/api/v1/bootcamps?averageCost%5Bgt%5D=2000&averageCost%5Blte%5D=4000",
            None,
        )
        .await?;

    assert_eq!(body["count"], 2);
    assert_eq!(extract_ids(&body)?, vec!["b004", "b003"]);
    Ok(())
}

#[tokio::test]
async fn membership_filters_match_array_elements() -> anyhow::Result<()> {
    let app = TestApp::new();
    app.seed(
        "bootcamps",
        vec![
            bootcamp("devworks", "Devworks Bootcamp", 10000, &["Web Development", "UI/UX", "Business"]),
            bootcamp("modern", "ModernTech Bootcamp", 8000, &["Web Development", "UI/UX", "Mobile Development"]),
            bootcamp("codemasters", "Codemasters", 6000, &["Web Development", "Data Science"]),
        ],
    )
    .await?;

    let (_, body) = app
        .request_json(Method::GET, "/api/v1/bootcamps?careers%5Bin%5D=Business,Data+Science", None)
        .await?;
    assert_eq!(extract_ids(&body)?, vec!["codemasters", "devworks"]);

    let (_, body) = app
        .request_json(Method::GET, "/api/v1/bootcamps?careers=UI%2FUX", None)
        .await?;
    assert_eq!(extract_ids(&body)?, vec!["devworks", "modern"]);

    let (_, body) = app
        .request_json(Method::GET, "/api/v1/bootcamps?averageCost=8000&housing=false", None)
        .await?;
    assert_eq!(extract_ids(&body)?, vec!["modern"]);
    Ok(())
}

#[tokio::test]
async fn select_and_sort_shape_the_records() -> anyhow::Result<()> {
    let app = TestApp::new();
    app.seed(
        "bootcamps",
        vec![
            bootcamp("b1", "ModernTech Bootcamp", 8000, &["UI/UX"]),
            bootcamp("b2", "Codemasters", 6000, &["Data Science"]),
            bootcamp("b3", "Devworks Bootcamp", 10000, &["Business"]),
        ],
    )
    .await?;

    let (_, body) = app
        .request_json(Method::GET, "/api/v1/bootcamps?select=name&sort=-averageCost", None)
        .await?;

    let items = data_items(&body)?;
    assert_eq!(items[0], json!({"id": "b3", "name": "Devworks Bootcamp"}));
    assert_eq!(
        field_values(&body, "name")?,
        vec!["Devworks Bootcamp", "ModernTech Bootcamp", "Codemasters"]
    );
    Ok(())
}

#[tokio::test]
async fn operator_injection_keys_are_ignored() -> anyhow::Result<()> {
    let app = TestApp::new();
    app.seed("bootcamps", numbered_bootcamps(4)).await?;

    let (status, body) = app
        .request_json(
            Method::GET,
            "/api/v1/bootcamps?%24where=1&name%5B%24ne%5D=x&averageCost%5Bregex%5D=.*&%24or=1",
            None,
        )
        .await?;

    assert_status(status, StatusCode::OK, "injection keys");
    assert_eq!(body["count"], 4);
    Ok(())
}

#[tokio::test]
async fn passwords_are_neither_returned_nor_filterable() -> anyhow::Result<()> {
    let app = TestApp::new();
    app.seed(
        "users",
        vec![
            json!({"id": "u1", "name": "John Doe", "email": "john@gmail.com", "password": "123456", "createdAt": "2024-01-01T00:00:00.000Z"}),
            json!({"id": "u2", "name": "Kevin Smith", "email": "kevin@gmail.com", "password": "abcdef", "createdAt": "2024-01-02T00:00:00.000Z"}),
        ],
    )
    .await?;

    let (_, body) = app
        .request_json(Method::GET, "/api/v1/users?password=123456&select=name,password", None)
        .await?;

    assert_eq!(body["count"], 2);
    for item in data_items(&body)? {
        assert!(item.get("password").is_none(), "password leaked: {item}");
    }

    let (_, body) = app
        .request_json(Method::GET, "/api/v1/users/u1", None)
        .await?;
    assert!(body["data"].get("password").is_none());
    Ok(())
}

#[tokio::test]
async fn bootcamp_courses_combine_with_client_filters() -> anyhow::Result<()> {
    let app = TestApp::new();
    app.seed(
        "courses",
        vec![
            course("c1", "Front End Web Development", "devworks", 8000),
            course("c2", "Full Stack Web Development", "devworks", 10000),
            course("c3", "Web Design & Development", "modern", 12000),
        ],
    )
    .await?;

    let (status, body) = app
        .request_json(Method::GET, "/api/v1/bootcamps/devworks/courses", None)
        .await?;
    assert_status(status, StatusCode::OK, "bootcamp courses");
    assert_eq!(body["count"], 2);
    assert_eq!(extract_ids(&body)?, vec!["c1", "c2"]);

    let (_, body) = app
        .request_json(
            Method::GET,
            "/api/v1/bootcamps/devworks/courses?tuition%5Bgte%5D=9000&bootcamp=modern",
            None,
        )
        .await?;
    assert_eq!(body["count"], 0);

    let (_, body) = app
        .request_json(
            Method::GET,
            "/api/v1/bootcamps/devworks/courses?tuition%5Bgte%5D=9000",
            None,
        )
        .await?;
    assert_eq!(extract_ids(&body)?, vec!["c2"]);
    Ok(())
}

#[tokio::test]
async fn unknown_routes_use_the_error_envelope() -> anyhow::Result<()> {
    let app = TestApp::new();

    let (status, body) = app
        .request_json(Method::GET, "/api/v1/workshops", None)
        .await?;

    assert_status(status, StatusCode::NOT_FOUND, "unknown collection");
    assert_eq!(assert_failure(&body)?, "Route /api/v1/workshops not found");
    Ok(())
}
