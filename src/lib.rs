// Public modules
pub mod auth;
pub mod db_migration;
pub mod domains;
pub mod errors;
pub mod types;
pub mod validation;

use errors::DbResult;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// Open (or create) the SQLite database at the given URL and bring its
/// schema up to date. `sqlite::memory:` works for tests.
pub async fn initialize(db_url: &str) -> DbResult<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await?;

    db_migration::run_migrations(&pool).await?;
    Ok(pool)
}

/// Initialize env_logger once; safe to call from multiple tests
pub fn init_logging() {
    let _ = env_logger::builder().is_test(cfg!(test)).try_init();
}
