use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;

use crate::router::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatusResponse {
    pub message: String,
    pub status: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub chatbot: &'static str,
    pub timestamp: String,
}

pub async fn root(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        message: format!("{} Chatbot API is running!", state.runtime.prompt().organization_name()),
        status: "healthy",
    })
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        chatbot: if state.runtime.is_ready() { "ready" } else { "unavailable" },
        timestamp: Utc::now().to_rfc3339(),
    })
}
