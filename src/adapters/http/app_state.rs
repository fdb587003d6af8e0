use std::sync::Arc;

use crate::{
    adapters::persistence::MemoryStore,
    infra::config::AppConfig,
    use_cases::{api_key::ApiKeyUseCases, usage::UsageUseCases},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub api_keys: Arc<ApiKeyUseCases>,
    pub usage: Arc<UsageUseCases>,
    /// Handle on the volatile store so tests can reset it between cases.
    pub fallback: Arc<MemoryStore>,
}
