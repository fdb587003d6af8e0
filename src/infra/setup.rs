use std::sync::Arc;

use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::{http::app_state::AppState, persistence::MemoryStore},
    infra::{config::AppConfig, postgres_persistence},
    use_cases::{
        api_key::{ApiKeyRepo, ApiKeyUseCases},
        usage::UsageUseCases,
    },
};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env();

    let postgres_arc = Arc::new(postgres_persistence(&config.database_url)?);

    // Best effort: an unreachable database is survivable, requests then run
    // against the volatile fallback store.
    if let Err(err) = sqlx::migrate!().run(&postgres_arc.pool).await {
        warn!(error = ?err, "running migrations failed, continuing with the fallback store");
    }

    let fallback = Arc::new(MemoryStore::new());

    let api_keys = ApiKeyUseCases::new(
        postgres_arc.clone() as Arc<dyn ApiKeyRepo>,
        fallback.clone() as Arc<dyn ApiKeyRepo>,
    );
    let usage = UsageUseCases::new(postgres_arc as Arc<dyn ApiKeyRepo>);

    Ok(AppState {
        config: Arc::new(config),
        api_keys: Arc::new(api_keys),
        usage: Arc::new(usage),
        fallback,
    })
}

pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "dandi_api=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .pretty();

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init()
        .ok();
}
