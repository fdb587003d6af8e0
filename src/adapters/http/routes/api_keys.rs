use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    identity,
    use_cases::{api_key::ApiKey, usage::UsageOutcome},
};

#[derive(Deserialize)]
struct CreatePayload {
    name: String,
    limit: Option<i64>,
}

#[derive(Deserialize)]
struct UpdatePayload {
    name: String,
}

#[derive(Deserialize)]
struct ValidatePayload {
    value: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api-keys", get(list_keys).post(create_key))
        .route(
            "/api-keys/{id}",
            get(get_key).put(update_key).delete(delete_key),
        )
        .route("/validate-key", post(validate_key))
}

async fn list_keys(State(app_state): State<AppState>) -> AppResult<impl IntoResponse> {
    let Some(user_id) = identity::resolve_user_id(&app_state.config).await? else {
        // No session and no configured NOAUTH id: an empty list, not an error.
        return Ok(Json(Vec::<ApiKey>::new()));
    };
    let keys = app_state.api_keys.list(user_id).await?;
    Ok(Json(keys))
}

async fn create_key(
    State(app_state): State<AppState>,
    Json(payload): Json<CreatePayload>,
) -> AppResult<impl IntoResponse> {
    let user_id = identity::resolve_user_id(&app_state.config)
        .await?
        .ok_or(AppError::NoIdentity)?;
    let key = app_state
        .api_keys
        .create(user_id, &payload.name, payload.limit)
        .await?;
    Ok(Json(key))
}

async fn get_key(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let user_id = identity::resolve_user_id(&app_state.config)
        .await?
        .ok_or(AppError::NoIdentity)?;
    let key = app_state.api_keys.get(id, user_id).await?;
    Ok(Json(key))
}

async fn update_key(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePayload>,
) -> AppResult<impl IntoResponse> {
    let user_id = identity::resolve_user_id(&app_state.config)
        .await?
        .ok_or(AppError::NoIdentity)?;
    let key = app_state.api_keys.update(id, user_id, &payload.name).await?;
    Ok(Json(key))
}

async fn delete_key(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let user_id = identity::resolve_user_id(&app_state.config)
        .await?
        .ok_or(AppError::NoIdentity)?;
    app_state.api_keys.delete(id, user_id).await?;
    Ok(Json(
        serde_json::json!({ "message": "API Key deleted successfully" }),
    ))
}

async fn validate_key(
    State(app_state): State<AppState>,
    Json(payload): Json<ValidatePayload>,
) -> AppResult<Response> {
    let Some(key) = app_state.usage.validate(&payload.value).await? else {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Invalid API key" })),
        )
            .into_response());
    };

    match app_state.usage.check_and_increment(&key).await? {
        UsageOutcome::LimitExceeded => Ok((
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({ "error": "Rate limit exceeded" })),
        )
            .into_response()),
        UsageOutcome::Allowed => Ok(Json(serde_json::json!({
            "message": "Valid API key",
            "usage": key.usage + 1,
            "limit": key.limit,
        }))
        .into_response()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{Value, json};
    use uuid::Uuid;

    use crate::{
        adapters::http::app_state::AppState,
        infra::app::create_app,
        test_utils::{test_app_state, test_config},
    };

    fn server(noauth_user_id: Option<Uuid>) -> TestServer {
        TestServer::new(create_app(test_app_state(noauth_user_id))).unwrap()
    }

    #[tokio::test]
    async fn listing_without_identity_yields_an_empty_array() {
        let server = server(None);
        let response = server.get("/api-keys").await;

        response.assert_status(StatusCode::OK);
        response.assert_json(&json!([]));
    }

    #[tokio::test]
    async fn creating_without_identity_is_a_client_error() {
        let server = server(None);
        let response = server
            .post("/api-keys")
            .json(&json!({ "name": "prod" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn created_keys_round_trip_through_get() {
        let server = server(Some(Uuid::new_v4()));
        let created: Value = server
            .post("/api-keys")
            .json(&json!({ "name": "prod", "limit": 100 }))
            .await
            .json();

        assert_eq!(created["name"], "prod");
        assert_eq!(created["usage"], 0);
        assert_eq!(created["limit"], 100);
        let value = created["value"].as_str().unwrap();
        assert!(value.starts_with("dandi-"));

        let id = created["id"].as_str().unwrap();
        let fetched: Value = server.get(&format!("/api-keys/{id}")).await.json();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn another_identity_cannot_see_the_key() {
        let state = test_app_state(Some(Uuid::new_v4()));
        // Same stores, different resolved identity.
        let other_state = AppState {
            config: Arc::new(test_config(Some(Uuid::new_v4()))),
            ..state.clone()
        };
        let owner = TestServer::new(create_app(state)).unwrap();
        let other = TestServer::new(create_app(other_state)).unwrap();

        let created: Value = owner
            .post("/api-keys")
            .json(&json!({ "name": "prod" }))
            .await
            .json();
        let id = created["id"].as_str().unwrap();

        owner
            .get(&format!("/api-keys/{id}"))
            .await
            .assert_status(StatusCode::OK);
        other
            .get(&format!("/api-keys/{id}"))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn renaming_keeps_the_secret_value() {
        let server = server(Some(Uuid::new_v4()));
        let created: Value = server
            .post("/api-keys")
            .json(&json!({ "name": "before" }))
            .await
            .json();
        let id = created["id"].as_str().unwrap();

        let updated: Value = server
            .put(&format!("/api-keys/{id}"))
            .json(&json!({ "name": "after" }))
            .await
            .json();

        assert_eq!(updated["name"], "after");
        assert_eq!(updated["value"], created["value"]);
        assert_eq!(updated["usage"], created["usage"]);
        assert_eq!(updated["user_id"], created["user_id"]);
    }

    #[tokio::test]
    async fn deleting_then_fetching_is_not_found() {
        let server = server(Some(Uuid::new_v4()));
        let created: Value = server
            .post("/api-keys")
            .json(&json!({ "name": "gone" }))
            .await
            .json();
        let id = created["id"].as_str().unwrap();

        let response = server.delete(&format!("/api-keys/{id}")).await;
        response.assert_status(StatusCode::OK);
        response.assert_json(&json!({ "message": "API Key deleted successfully" }));

        server
            .get(&format!("/api-keys/{id}"))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .delete(&format!("/api-keys/{id}"))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn validation_enforces_the_limit() {
        let server = server(Some(Uuid::new_v4()));
        let created: Value = server
            .post("/api-keys")
            .json(&json!({ "name": "metered", "limit": 1 }))
            .await
            .json();
        let value = created["value"].as_str().unwrap();

        let response = server
            .post("/validate-key")
            .json(&json!({ "value": value }))
            .await;
        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["usage"], 1);

        server
            .post("/validate-key")
            .json(&json!({ "value": value }))
            .await
            .assert_status(StatusCode::TOO_MANY_REQUESTS);

        server
            .post("/validate-key")
            .json(&json!({ "value": "dandi-0unknown" }))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
