use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::debug;

/// Ensure the database file exists, run lazy migrations, and return a live
/// connection.
pub fn ensure_schema(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent).context("failed to create data directory")?;
    }

    let conn = Connection::open(db_path).context("failed to open SQLite database")?;
    migrate(&conn)?;
    debug!(path = %db_path.display(), "database ready");
    Ok(conn)
}

/// Throwaway database with the same schema, used by tests and demos.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    migrate(&conn)?;
    Ok(conn)
}

fn migrate(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS clients (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            client_type TEXT NOT NULL CHECK (client_type IN ('Individual', 'Company')),
            email TEXT NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('Active', 'Inactive')),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            updated_by TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create clients table")?;

    Ok(())
}
