use std::sync::Arc;

use tracing::instrument;

use crate::{
    app_error::AppResult,
    use_cases::api_key::{ApiKey, ApiKeyRepo},
};

/// Outcome of a usage check against a key's configured limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageOutcome {
    Allowed,
    LimitExceeded,
}

/// Resolves presented key values and enforces the usage/limit counter.
/// Runs against the primary store only; keys created through the volatile
/// fallback are not honored here.
#[derive(Clone)]
pub struct UsageUseCases {
    repo: Arc<dyn ApiKeyRepo>,
}

impl UsageUseCases {
    pub fn new(repo: Arc<dyn ApiKeyRepo>) -> Self {
        Self { repo }
    }

    #[instrument(skip_all)]
    pub async fn validate(&self, value: &str) -> AppResult<Option<ApiKey>> {
        self.repo.find_by_value(value).await
    }

    /// Check usage against the limit, then bump the counter. A missing limit
    /// means the key is unmetered.
    ///
    /// The check and the increment are two separate statements: concurrent
    /// callers can both pass the check before either increment lands, so
    /// usage may overshoot the limit under race. Accepted limitation.
    #[instrument(skip_all, fields(key_id = %key.id))]
    pub async fn check_and_increment(&self, key: &ApiKey) -> AppResult<UsageOutcome> {
        if let Some(limit) = key.limit {
            if key.usage >= limit {
                return Ok(UsageOutcome::LimitExceeded);
            }
        }
        self.repo.increment_usage(key.id).await?;
        Ok(UsageOutcome::Allowed)
    }
}
