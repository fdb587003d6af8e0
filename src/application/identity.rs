use uuid::Uuid;

use crate::{app_error::AppResult, infra::config::AppConfig};

// Authentication is disabled in the current build. Session lookup always
// resolves to no user so callers fall through to the configured NOAUTH id.
pub async fn session_user() -> AppResult<Option<Uuid>> {
    Ok(None)
}

pub async fn resolve_user_id(config: &AppConfig) -> AppResult<Option<Uuid>> {
    if let Some(user_id) = session_user().await? {
        return Ok(Some(user_id));
    }
    Ok(config.noauth_user_id)
}
