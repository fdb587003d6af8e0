pub mod api_key;
pub mod memory;

use sqlx::PgPool;
use tokio::sync::OnceCell;

pub use memory::MemoryStore;

pub struct PostgresPersistence {
    pub pool: PgPool,
    // Probed once per process: whether api_keys carries the optional
    // "limit" column. See api_key.rs.
    limit_column: OnceCell<bool>,
}

impl PostgresPersistence {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            limit_column: OnceCell::new(),
        }
    }
}
