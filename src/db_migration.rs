use crate::errors::{DbError, DbResult};
use sqlx::SqlitePool;

// Embed all migration SQL files at compile time
const MIGRATION_BASIC: &str = include_str!("../migrations/20250601000000_basic.sql");

// List of migrations with their names and SQL content, in apply order
const MIGRATIONS: &[(&str, &str)] = &[("20250601000000_basic.sql", MIGRATION_BASIC)];

/// Bring the database schema up to date, applying any pending migrations
/// inside a single transaction.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    create_migrations_table(pool).await?;

    let last_migration = get_last_migration(pool).await?;
    let pending = pending_migrations(last_migration.as_deref());

    if pending.is_empty() {
        log::debug!("No pending migrations");
        return Ok(());
    }

    log::info!("Applying {} pending migration(s)", pending.len());

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| DbError::Transaction(format!("Failed to begin transaction: {}", e)))?;

    for (name, sql) in pending {
        sqlx::query(sql)
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::Migration(format!("Failed to apply {}: {}", name, e)))?;

        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query("INSERT INTO migrations (name, applied_at) VALUES (?, ?)")
            .bind(name)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::Migration(format!("Failed to record {}: {}", name, e)))?;

        log::info!("Applied migration {}", name);
    }

    tx.commit()
        .await
        .map_err(|e| DbError::Transaction(format!("Failed to commit migrations: {}", e)))?;

    Ok(())
}

async fn create_migrations_table(pool: &SqlitePool) -> DbResult<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| DbError::Migration(format!("Failed to create migrations table: {}", e)))?;

    Ok(())
}

async fn get_last_migration(pool: &SqlitePool) -> DbResult<Option<String>> {
    sqlx::query_scalar::<_, String>("SELECT name FROM migrations ORDER BY id DESC LIMIT 1")
        .fetch_optional(pool)
        .await
        .map_err(|e| DbError::Migration(format!("Failed to read migrations table: {}", e)))
}

/// Migrations ordered after the last applied one
fn pending_migrations(last_migration: Option<&str>) -> Vec<(&'static str, &'static str)> {
    match last_migration {
        None => MIGRATIONS.to_vec(),
        Some(last) => MIGRATIONS
            .iter()
            .filter(|(name, _)| *name > last)
            .copied()
            .collect(),
    }
}
