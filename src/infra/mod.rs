pub mod app;
pub mod config;
pub mod setup;

use sqlx::postgres::PgPoolOptions;

use crate::adapters::persistence::PostgresPersistence;

/// Build the Postgres-backed persistence layer. The pool connects lazily so
/// the process can come up and serve from the fallback store while the
/// database is unreachable.
pub fn postgres_persistence(database_url: &str) -> anyhow::Result<PostgresPersistence> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect_lazy(database_url)?;
    Ok(PostgresPersistence::new(pool))
}
