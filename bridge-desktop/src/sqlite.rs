//! Shared SQLite connection setup for the desktop stores.

use bridge_traits::error::{BridgeError, Result};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::debug;

/// Open (creating if needed) the database file at `db_path`.
///
/// Any failure is reported as [`BridgeError::NotAvailable`]: a store that
/// cannot be opened must make every later call fail rather than degrade.
pub(crate) async fn open_file(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| BridgeError::NotAvailable(format!("Cannot create {:?}: {}", parent, e)))?;
    }

    // SQLite URLs use forward slashes on every platform
    let path_str = db_path.to_string_lossy().replace('\\', "/");
    let db_url = format!("sqlite://{}?mode=rwc", path_str);

    let pool = SqlitePool::connect(&db_url)
        .await
        .map_err(|e| BridgeError::NotAvailable(format!("Failed to connect to DB: {}", e)))?;

    debug!(path = ?db_path, "Opened SQLite database");
    Ok(pool)
}

/// Open a private in-memory database.
///
/// Every pooled connection to `sqlite::memory:` gets its own empty database,
/// so the pool is capped at a single connection.
pub(crate) async fn open_in_memory() -> Result<SqlitePool> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .map_err(|e| BridgeError::NotAvailable(format!("Failed to connect to DB: {}", e)))
}

/// Run a schema statement, mapping failures to `NotAvailable`.
pub(crate) async fn ensure_schema(pool: &SqlitePool, ddl: &str) -> Result<()> {
    sqlx::query(ddl)
        .execute(pool)
        .await
        .map_err(|e| BridgeError::NotAvailable(format!("Failed to create table: {}", e)))?;
    Ok(())
}

pub(crate) fn db_error(context: &str, e: sqlx::Error) -> BridgeError {
    BridgeError::DatabaseError(format!("{}: {}", context, e))
}

pub(crate) fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
