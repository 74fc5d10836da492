pub mod assertions;
pub mod fixtures;

use anyhow::Context as _;
use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use devcamper::{api::create_router, db::MemoryDocumentStore, AppState, Config};
use devcamper_query::DocumentStore as _;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt as _;

// Re-export commonly used items
pub use assertions::*;
pub use fixtures::*;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::new_with_config(|_| {})
    }

    pub fn new_with_config(configure: impl FnOnce(&mut Config)) -> Self {
        Self::with_geocoder(configure, StubGeocoder::default())
    }

    pub fn with_geocoder(configure: impl FnOnce(&mut Config), geocoder: StubGeocoder) -> Self {
        let mut config = Config::default();
        configure(&mut config);

        let state = AppState::with_collaborators(
            config,
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(geocoder),
        );
        let router = create_router(state.clone());

        Self { router, state }
    }

    /// Insert documents directly into the store, bypassing the API.
    pub async fn seed(&self, collection: &str, documents: Vec<Value>) -> anyhow::Result<()> {
        for document in documents {
            self.state
                .store
                .insert(collection, document)
                .await
                .context("seed document")?;
        }
        Ok(())
    }

    pub async fn request(
        &self,
        method: Method,
        path_and_query: &str,
        body: Option<Bytes>,
    ) -> anyhow::Result<(StatusCode, HeaderMap, Bytes)> {
        let request = Request::builder()
            .method(method)
            .uri(path_and_query)
            .header("host", "example.org")
            .header("content-type", "application/json")
            .body(match body {
                Some(bytes) => Body::from(bytes),
                None => Body::empty(),
            })
            .context("build request")?;

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .context("dispatch request")?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .context("read response body")?;

        Ok((status, headers, body))
    }

    /// Send a request and parse the JSON response body.
    pub async fn request_json(
        &self,
        method: Method,
        path_and_query: &str,
        body: Option<&Value>,
    ) -> anyhow::Result<(StatusCode, Value)> {
        let body = body.map(to_json_body).transpose()?;
        let (status, _headers, bytes) = self.request(method, path_and_query, body).await?;
        let json = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse response body: {}", String::from_utf8_lossy(&bytes)))?;
        Ok((status, json))
    }
}

pub fn to_json_body(value: &Value) -> anyhow::Result<Bytes> {
    Ok(Bytes::from(serde_json::to_vec(value).context("serialize body")?))
}
