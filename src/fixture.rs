//! Target-service fixture: a small in-memory profile API that generated suites can run against.
//!
//! `GET /profile` and `PUT /profile` behind a bearer check. Email addresses are stored as
//! given; the missing format check is a planted defect for generated suites to find.

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Token the fixture always rejects
pub const REJECTED_TOKEN: &str = "invalid-token";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub email: String,
    pub full_name: String,
    pub account_tier: String,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            email: "user@example.com".to_string(),
            full_name: "John Doe".to_string(),
            account_tier: "gold".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Shared fixture state
#[derive(Debug, Default)]
pub struct FixtureState {
    profile: Mutex<Profile>,
}

impl FixtureState {
    pub fn profile(&self) -> Profile {
        self.profile.lock().clone()
    }
}

pub fn build_router(state: Arc<FixtureState>) -> Router {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .fallback(not_found)
        .with_state(state)
}

/// Serve the fixture until the process is stopped.
pub async fn serve(bind: SocketAddr) -> std::io::Result<()> {
    serve_on(tokio::net::TcpListener::bind(bind).await?).await
}

/// Serve on an already bound listener.
pub async fn serve_on(listener: tokio::net::TcpListener) -> std::io::Result<()> {
    info!(address = %listener.local_addr()?, "Fixture service listening");
    axum::serve(listener, build_router(Arc::new(FixtureState::default()))).await
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "detail": "Unauthorized" })),
    )
        .into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };
    match value.strip_prefix("Bearer ") {
        Some(token) => token.split(' ').next() != Some(REJECTED_TOKEN),
        None => false,
    }
}

async fn get_profile(State(state): State<Arc<FixtureState>>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(state.profile()).into_response()
}

async fn update_profile(
    State(state): State<Arc<FixtureState>>,
    headers: HeaderMap,
    Json(update): Json<ProfileUpdate>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut profile = state.profile.lock();
    profile.email = update.email;
    if let Some(full_name) = update.full_name.filter(|n| !n.is_empty()) {
        profile.full_name = full_name;
    }
    Json(profile.clone()).into_response()
}

async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "page-not-found" })),
    )
        .into_response()
}
