//! Test utilities: fixtures and repo doubles for exercising the use cases
//! and HTTP routes without a database.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    adapters::{http::app_state::AppState, persistence::MemoryStore},
    app_error::{AppError, AppResult},
    infra::config::AppConfig,
    use_cases::{
        api_key::{ApiKey, ApiKeyRepo, ApiKeyUseCases, NewApiKey},
        usage::UsageUseCases,
    },
};

pub fn test_config(noauth_user_id: Option<Uuid>) -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".to_string(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        cors_origin: "http://localhost:3000".parse().unwrap(),
        noauth_user_id,
    }
}

/// AppState wired entirely against in-memory stores. The primary store is a
/// `MemoryStore` too, so the happy paths run without a database; fallback
/// behavior itself is covered by the use-case unit tests.
pub fn test_app_state(noauth_user_id: Option<Uuid>) -> AppState {
    let primary = Arc::new(MemoryStore::new());
    let fallback = Arc::new(MemoryStore::new());

    let api_keys = ApiKeyUseCases::new(
        primary.clone() as Arc<dyn ApiKeyRepo>,
        fallback.clone() as Arc<dyn ApiKeyRepo>,
    );
    let usage = UsageUseCases::new(primary as Arc<dyn ApiKeyRepo>);

    AppState {
        config: Arc::new(test_config(noauth_user_id)),
        api_keys: Arc::new(api_keys),
        usage: Arc::new(usage),
        fallback,
    }
}

// ============================================================================
// Repo Doubles
// ============================================================================

/// Repo double whose every call fails, for driving the fallback path.
#[derive(Default)]
pub struct FailingApiKeyRepo;

fn down() -> AppError {
    AppError::Database("connection refused".to_string())
}

#[async_trait]
impl ApiKeyRepo for FailingApiKeyRepo {
    async fn list_for_user(&self, _user_id: Uuid) -> AppResult<Vec<ApiKey>> {
        Err(down())
    }

    async fn insert(&self, _new: &NewApiKey) -> AppResult<ApiKey> {
        Err(down())
    }

    async fn find_by_id(&self, _id: Uuid, _user_id: Uuid) -> AppResult<Option<ApiKey>> {
        Err(down())
    }

    async fn rename(&self, _id: Uuid, _user_id: Uuid, _name: &str) -> AppResult<Option<ApiKey>> {
        Err(down())
    }

    async fn delete(&self, _id: Uuid, _user_id: Uuid) -> AppResult<bool> {
        Err(down())
    }

    async fn find_by_value(&self, _value: &str) -> AppResult<Option<ApiKey>> {
        Err(down())
    }

    async fn increment_usage(&self, _id: Uuid) -> AppResult<()> {
        Err(down())
    }
}

/// Repo double that reports a unique violation on the first insert and
/// behaves like an in-memory store afterwards.
#[derive(Default)]
pub struct ConflictOnceRepo {
    inner: MemoryStore,
    pub inserts: AtomicUsize,
}

impl ConflictOnceRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ApiKeyRepo for ConflictOnceRepo {
    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<ApiKey>> {
        self.inner.list_for_user(user_id).await
    }

    async fn insert(&self, new: &NewApiKey) -> AppResult<ApiKey> {
        if self.inserts.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(AppError::Conflict(
                "duplicate key value violates unique constraint".to_string(),
            ));
        }
        self.inner.insert(new).await
    }

    async fn find_by_id(&self, id: Uuid, user_id: Uuid) -> AppResult<Option<ApiKey>> {
        self.inner.find_by_id(id, user_id).await
    }

    async fn rename(&self, id: Uuid, user_id: Uuid, name: &str) -> AppResult<Option<ApiKey>> {
        self.inner.rename(id, user_id, name).await
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> AppResult<bool> {
        self.inner.delete(id, user_id).await
    }

    async fn find_by_value(&self, value: &str) -> AppResult<Option<ApiKey>> {
        self.inner.find_by_value(value).await
    }

    async fn increment_usage(&self, id: Uuid) -> AppResult<()> {
        self.inner.increment_usage(id).await
    }
}
