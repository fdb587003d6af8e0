use axum::{
    Router,
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::any,
};

use crate::adapters::http::app_state::AppState;

// Authentication is disabled in the current build. The routes stay mounted
// so clients get a definite answer instead of a routing fallthrough.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", any(disabled))
        .route("/{*rest}", any(disabled))
}

async fn disabled(method: Method) -> impl IntoResponse {
    if method == Method::OPTIONS {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
