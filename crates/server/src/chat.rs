use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use labbot_core::InterfaceError;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::router::AppState;

pub const CORRELATION_HEADER: &str = "x-correlation-id";

#[derive(Clone, Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// HTTP rendering of an [`InterfaceError`].
#[derive(Debug)]
pub struct ApiError(pub InterfaceError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ErrorBody { detail: self.0.detail() })).into_response()
    }
}

pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let correlation_id = correlation_id(&headers);
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(
                event_name = "chat.request.rejected",
                correlation_id = %correlation_id,
                status = rejection.status().as_u16(),
                error = %rejection.body_text(),
                "chat request body rejected"
            );
            return Err(ApiError(InterfaceError::BadRequest {
                message: rejection.body_text(),
                correlation_id,
            }));
        }
    };
    info!(
        event_name = "chat.request.received",
        correlation_id = %correlation_id,
        message_chars = request.message.chars().count(),
        "chat request received"
    );

    match state.runtime.respond(&request.message, &correlation_id).await {
        Ok(reply) => Ok(Json(ChatResponse { response: reply.text })),
        Err(application_error) => {
            let interface_error = application_error.into_interface(correlation_id);
            error!(
                event_name = "chat.request.failed",
                correlation_id = %interface_error.correlation_id(),
                error = %interface_error,
                "chat request failed"
            );
            Err(ApiError(interface_error))
        }
    }
}

fn correlation_id(headers: &HeaderMap) -> String {
    headers
        .get(CORRELATION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
