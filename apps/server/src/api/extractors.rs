//! Custom Axum extractors for query strings and JSON bodies.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
};
use devcamper_query::RawQuery;
use serde_json::Value as JsonValue;
use std::convert::Infallible;

/// Decoded query string as ordered key/value pairs, repeated keys kept.
///
/// Never rejects: an absent or empty query string is an empty [`RawQuery`].
pub struct QueryParams(pub RawQuery);

#[async_trait]
impl<S> FromRequestParts<S> for QueryParams
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let items = parts
            .uri
            .query()
            .map(parse_form_urlencoded)
            .unwrap_or_default();
        Ok(QueryParams(RawQuery::from_items(&items)))
    }
}

/// `application/x-www-form-urlencoded` decoding (`+` is a space, `%5B` is `[`).
pub fn parse_form_urlencoded(s: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(s.as_bytes())
        .into_owned()
        .collect()
}

/// JSON request body; failures use the API error envelope instead of axum's
/// plain-text rejections.
pub struct JsonBody(pub JsonValue);

#[async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = crate::Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| crate::Error::InvalidBody(format!("Failed to read request body: {}", e)))?;

        let value: JsonValue = serde_json::from_slice(&bytes)
            .map_err(|e| crate::Error::InvalidBody(format!("Invalid JSON in request body: {}", e)))?;

        Ok(JsonBody(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devcamper_query::RawValue;

    #[test]
    fn decodes_brackets_and_plus() {
        let items = parse_form_urlencoded("averageCost%5Blte%5D=10000&name=Dev+Works");
        assert_eq!(
            items,
            vec![
                ("averageCost[lte]".to_string(), "10000".to_string()),
                ("name".to_string(), "Dev Works".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn repeated_keys_become_lists() {
        let request = axum::http::Request::builder()
            .uri("/api/v1/bootcamps?careers=Business&careers=UI%2FUX")
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();

        let QueryParams(raw) = QueryParams::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(
            raw.get("careers"),
            Some(&RawValue::List(vec![
                "Business".to_string(),
                "UI/UX".to_string()
            ]))
        );
    }
}
