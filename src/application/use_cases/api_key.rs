use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};

// ============================================================================
// Records & Repository Trait
// ============================================================================

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ApiKey {
    pub id: Uuid,
    pub name: String,
    pub value: String,
    pub usage: i64,
    pub limit: Option<i64>,
    pub user_id: Uuid,
    pub created_at: NaiveDateTime,
}

/// Fields the service supplies when inserting a key. The store generates
/// `id` and `created_at`; `usage` starts at zero.
#[derive(Debug, Clone)]
pub struct NewApiKey {
    pub name: String,
    pub value: String,
    pub limit: Option<i64>,
    pub user_id: Uuid,
}

#[async_trait]
pub trait ApiKeyRepo: Send + Sync {
    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<ApiKey>>;
    async fn insert(&self, new: &NewApiKey) -> AppResult<ApiKey>;
    async fn find_by_id(&self, id: Uuid, user_id: Uuid) -> AppResult<Option<ApiKey>>;
    async fn rename(&self, id: Uuid, user_id: Uuid, name: &str) -> AppResult<Option<ApiKey>>;
    async fn delete(&self, id: Uuid, user_id: Uuid) -> AppResult<bool>;
    async fn find_by_value(&self, value: &str) -> AppResult<Option<ApiKey>>;
    async fn increment_usage(&self, id: Uuid) -> AppResult<()>;
}

// ============================================================================
// Use Cases
// ============================================================================

/// CRUD over API keys with a dual-store contract: every operation runs
/// against the primary (database-backed) repo first and falls back to the
/// volatile in-process store when the primary fails. Records created through
/// the fallback are visible only for the lifetime of the process.
#[derive(Clone)]
pub struct ApiKeyUseCases {
    primary: Arc<dyn ApiKeyRepo>,
    fallback: Arc<dyn ApiKeyRepo>,
}

impl ApiKeyUseCases {
    pub fn new(primary: Arc<dyn ApiKeyRepo>, fallback: Arc<dyn ApiKeyRepo>) -> Self {
        Self { primary, fallback }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, user_id: Uuid) -> AppResult<Vec<ApiKey>> {
        match self.primary.list_for_user(user_id).await {
            Ok(keys) => Ok(keys),
            Err(err) => {
                warn!(error = ?err, "listing keys against the database failed, using fallback store");
                self.fallback.list_for_user(user_id).await
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn create(
        &self,
        user_id: Uuid,
        name: &str,
        limit: Option<i64>,
    ) -> AppResult<ApiKey> {
        let new = NewApiKey {
            name: name.to_string(),
            value: generate_key_value(),
            limit,
            user_id,
        };

        match self.primary.insert(&new).await {
            Ok(key) => return Ok(key),
            Err(AppError::Conflict(msg)) => {
                // Unique conflict on the owner row: one retry under a freshly
                // generated owner id before giving up on the database.
                warn!(%msg, "insert conflicted, retrying with a fresh owner id");
                let retry = NewApiKey {
                    user_id: Uuid::new_v4(),
                    ..new.clone()
                };
                match self.primary.insert(&retry).await {
                    Ok(key) => return Ok(key),
                    Err(err) => {
                        warn!(error = ?err, "retry insert failed, using fallback store");
                    }
                }
            }
            Err(err) => {
                warn!(error = ?err, "creating key against the database failed, using fallback store");
            }
        }

        self.fallback.insert(&new).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid, user_id: Uuid) -> AppResult<ApiKey> {
        let found = match self.primary.find_by_id(id, user_id).await {
            Ok(found) => found,
            Err(err) => {
                warn!(error = ?err, "fetching key against the database failed, using fallback store");
                self.fallback.find_by_id(id, user_id).await?
            }
        };
        found.ok_or(AppError::NotFound)
    }

    #[instrument(skip(self))]
    pub async fn update(&self, id: Uuid, user_id: Uuid, name: &str) -> AppResult<ApiKey> {
        let updated = match self.primary.rename(id, user_id, name).await {
            Ok(updated) => updated,
            Err(err) => {
                warn!(error = ?err, "updating key against the database failed, using fallback store");
                self.fallback.rename(id, user_id, name).await?
            }
        };
        updated.ok_or(AppError::NotFound)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> AppResult<()> {
        let deleted = match self.primary.delete(id, user_id).await {
            Ok(deleted) => deleted,
            Err(err) => {
                warn!(error = ?err, "deleting key against the database failed, using fallback store");
                self.fallback.delete(id, user_id).await?
            }
        };
        if deleted { Ok(()) } else { Err(AppError::NotFound) }
    }
}

// ============================================================================
// Key Generation
// ============================================================================

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a key value with format: `dandi-<unix millis><13 base36 chars>`.
fn generate_key_value() -> String {
    use rand::Rng;

    let mut rng = rand::rngs::OsRng;
    let suffix: String = (0..13)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("dandi-{}{}", chrono::Utc::now().timestamp_millis(), suffix)
}
