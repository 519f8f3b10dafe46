//! Fixtures shared by unit tests across modules.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use crate::auth::testing::StaticAuth;
use crate::data_client::memory::MemoryDataClient;
use crate::routes::build_router;
use crate::state::AppState;

pub const TOKEN: &str = "token-amal";

pub fn place_row(name: &str, category: &str, rating: f64) -> Value {
    json!({
        "id": Uuid::new_v4(),
        "name": name,
        "description": null,
        "category": category,
        "rating": rating,
        "created_at": "2024-05-01T10:00:00Z",
        "images": null,
        "features": null,
        "seasonal": null
    })
}

pub fn id_of(row: &Value) -> Uuid {
    serde_json::from_value(row["id"].clone()).expect("fixture row has a uuid id")
}

/// A router over an in-memory store with one signed-in user.
pub fn app(data: &MemoryDataClient, user_id: Uuid) -> Router {
    let state = AppState::for_tests(
        Arc::new(data.clone()),
        Arc::new(StaticAuth::with_user(TOKEN, user_id)),
    );
    build_router(state)
}

/// Sends a request and returns status plus parsed JSON body (`Null` when empty).
pub async fn call(
    app: Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .expect("valid request");

    let response = app.oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}
