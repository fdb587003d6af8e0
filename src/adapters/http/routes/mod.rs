pub mod api_keys;
pub mod auth;

use axum::Router;

use crate::adapters::http::app_state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(api_keys::router())
        .nest("/auth", auth::router())
}
