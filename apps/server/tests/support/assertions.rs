use anyhow::Context as _;
use axum::http::StatusCode;
use serde_json::Value;

/// Assert a response status with a labelled failure message
pub fn assert_status(actual: StatusCode, expected: StatusCode, label: &str) {
    assert_eq!(
        actual, expected,
        "{label}: expected status {expected}, got {actual}"
    );
}

/// Assert the `{ success: true, ... }` envelope and return `data`
pub fn assert_success(body: &Value) -> anyhow::Result<&Value> {
    assert_eq!(body["success"], Value::Bool(true), "expected success: {body}");
    body.get("data").context("envelope has data")
}

/// Assert the `{ success: false, error }` envelope and return the message
pub fn assert_failure(body: &Value) -> anyhow::Result<&str> {
    assert_eq!(body["success"], Value::Bool(false), "expected failure: {body}");
    body.get("error")
        .and_then(Value::as_str)
        .context("envelope has error message")
}

/// Records of a listing envelope
pub fn data_items(body: &Value) -> anyhow::Result<&Vec<Value>> {
    assert_success(body)?
        .as_array()
        .context("data is an array")
}

/// Values of `field` across the records of a listing envelope
pub fn field_values<'a>(body: &'a Value, field: &str) -> anyhow::Result<Vec<&'a Value>> {
    Ok(data_items(body)?
        .iter()
        .map(|item| item.get(field).unwrap_or(&Value::Null))
        .collect())
}

/// `id` of every record in a listing envelope, in order
pub fn extract_ids(body: &Value) -> anyhow::Result<Vec<String>> {
    data_items(body)?
        .iter()
        .map(|item| {
            item.get("id")
                .and_then(Value::as_str)
                .map(str::to_string)
                .context("record has an id")
        })
        .collect()
}
