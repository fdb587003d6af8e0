use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    app_error::AppResult,
    use_cases::api_key::{ApiKey, ApiKeyRepo, NewApiKey},
};

/// Volatile fallback store: an ordered, process-local collection of key
/// records. Contents live for the lifetime of the process and are gone on
/// restart; value uniqueness is not enforced here.
#[derive(Default)]
pub struct MemoryStore {
    keys: Mutex<Vec<ApiKey>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every stored key. Intended for test isolation.
    pub fn reset(&self) {
        self.keys.lock().unwrap().clear();
    }
}

#[async_trait]
impl ApiKeyRepo for MemoryStore {
    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<ApiKey>> {
        let keys = self.keys.lock().unwrap();
        Ok(keys
            .iter()
            .filter(|k| k.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert(&self, new: &NewApiKey) -> AppResult<ApiKey> {
        let key = ApiKey {
            id: Uuid::new_v4(),
            name: new.name.clone(),
            value: new.value.clone(),
            usage: 0,
            limit: new.limit,
            user_id: new.user_id,
            created_at: Utc::now().naive_utc(),
        };
        self.keys.lock().unwrap().push(key.clone());
        Ok(key)
    }

    async fn find_by_id(&self, id: Uuid, user_id: Uuid) -> AppResult<Option<ApiKey>> {
        let keys = self.keys.lock().unwrap();
        Ok(keys
            .iter()
            .find(|k| k.id == id && k.user_id == user_id)
            .cloned())
    }

    async fn rename(&self, id: Uuid, user_id: Uuid, name: &str) -> AppResult<Option<ApiKey>> {
        let mut keys = self.keys.lock().unwrap();
        if let Some(key) = keys.iter_mut().find(|k| k.id == id && k.user_id == user_id) {
            key.name = name.to_string();
            return Ok(Some(key.clone()));
        }
        Ok(None)
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let mut keys = self.keys.lock().unwrap();
        let before = keys.len();
        keys.retain(|k| !(k.id == id && k.user_id == user_id));
        Ok(keys.len() != before)
    }

    async fn find_by_value(&self, value: &str) -> AppResult<Option<ApiKey>> {
        let keys = self.keys.lock().unwrap();
        Ok(keys.iter().find(|k| k.value == value).cloned())
    }

    async fn increment_usage(&self, id: Uuid) -> AppResult<()> {
        let mut keys = self.keys.lock().unwrap();
        if let Some(key) = keys.iter_mut().find(|k| k.id == id) {
            key.usage += 1;
        }
        Ok(())
    }
}
