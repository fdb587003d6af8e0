use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::app_error::AppError;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error before it gets converted into a status response.
        tracing::error!(error = ?self, "Request failed");

        match self {
            AppError::NoIdentity => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": "No user available. Set NOAUTH_USER_ID or enable auth."
                })),
            )
                .into_response(),
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "error": "API Key not found" })),
            )
                .into_response(),
            AppError::Database(_) | AppError::Conflict(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response()
            }
            AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
            }
        }
    }
}
