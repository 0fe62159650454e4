use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::collections::HashMap;

use crate::core::metrics;
use crate::core::state::AppState;
use crate::schemas::{HealthResponse, RootResponse};

pub(crate) const SESSION_PATH: &str = "/api/v1/session";

pub(crate) async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Quiz session API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        session_url: SESSION_PATH.to_string(),
    })
}

pub(crate) async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    let session = state.session().lock().await;
    let mut components = HashMap::new();
    components.insert("questions".to_string(), session.total_questions().to_string());
    components.insert("phase".to_string(), format!("{:?}", session.phase()));
    components.insert(
        "delivery_mode".to_string(),
        state.settings().delivery().mode.as_str().to_string(),
    );

    Json(HealthResponse {
        service: "quiz-session".to_string(),
        status: "healthy".to_string(),
        components,
    })
}

pub(crate) async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    if !state.settings().telemetry().prometheus_enabled {
        return StatusCode::NOT_FOUND.into_response();
    }

    match metrics::render() {
        Some(body) => ([(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")], body)
            .into_response(),
        None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}
