mod from_row;
mod schema;
pub mod queries;

pub use schema::init_db;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::config::ExpiryPolicy;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    /// Shared secret gating the admin endpoints.
    pub admin_token: String,
    /// Prefix for generated key strings, e.g. "VURE".
    pub key_prefix: String,
    /// Whether a key's TTL starts at issuance or at first validation.
    pub expiry_policy: ExpiryPolicy,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    // Bounded busy wait: concurrent writers queue briefly instead of
    // surfacing SQLITE_BUSY to request handlers.
    let manager = SqliteConnectionManager::file(database_path)
        .with_init(|conn| conn.busy_timeout(std::time::Duration::from_secs(5)));
    Pool::builder().max_size(10).build(manager)
}
