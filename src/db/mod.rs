pub(crate) mod columns;
mod migration;

use std::path::Path;

use anyhow::Result;
use rusqlite::Connection;

pub use migration::{MIGRATIONS, Migration};

/// Database wrapper providing connection management and schema migrations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens an in-memory SQLite database.
    ///
    /// Automatically applies all migrations on connection open.
    pub fn in_memory() -> Result<Self> {
        Self::initialize(Connection::open_in_memory()?)
    }

    /// Opens a file-based SQLite database at the given path.
    ///
    /// Creates the database file if it does not exist.
    /// Automatically applies pending migrations on connection open.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "opening database");
        Self::initialize(Connection::open(path)?)
    }

    fn initialize(mut conn: Connection) -> Result<Self> {
        // Cascading deletes on note_references depend on this.
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        migration::apply_pending_migrations(&mut conn)?;
        Ok(Self { conn })
    }

    /// Returns the highest applied schema version.
    pub fn schema_version(&self) -> Result<u32> {
        migration::current_version(&self.conn)
    }

    /// Returns a reference to the underlying connection.
    ///
    /// Useful for executing custom queries in tests.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests;
