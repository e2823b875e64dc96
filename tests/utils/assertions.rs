//! HTTP helpers - send a request through the router and inspect the JSON reply
#![allow(dead_code)] // Test utilities may not all be used in every test

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt; // for `oneshot`

// ============================================================================
// Response Helpers
// ============================================================================

pub struct JsonResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl JsonResponse {
    pub async fn get(router: &Router, uri: &str) -> Self {
        Self::send(router, "GET", uri, None).await
    }

    pub async fn post(router: &Router, uri: &str, body: Value) -> Self {
        Self::send(router, "POST", uri, Some(body)).await
    }

    pub async fn post_empty(router: &Router, uri: &str) -> Self {
        Self::send(router, "POST", uri, None).await
    }

    async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> Self {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        Self { status, body }
    }

    /// Assert a 200 and hand back the body
    pub fn ok(self) -> Value {
        assert_eq!(self.status, StatusCode::OK, "unexpected reply: {}", self.body);
        self.body
    }

    /// Assert an error reply with the given status and kind
    pub fn error(self, status: StatusCode, kind: &str) {
        assert_eq!(self.status, status, "unexpected reply: {}", self.body);
        assert_eq!(self.body["kind"], kind);
        assert!(self.body["error"].is_string());
    }
}
