use time::OffsetDateTime;

/// Individual migration with version metadata.
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub up: &'static str,
}

impl Migration {
    /// Creates a new migration.
    pub const fn new(version: u32, description: &'static str, up: &'static str) -> Self {
        Self {
            version,
            description,
            up,
        }
    }

    /// Checks if this migration has been applied to the database.
    pub fn is_applied(&self, conn: &rusqlite::Connection) -> anyhow::Result<bool> {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM schema_migrations WHERE version = ?1)",
            [self.version],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Applies this migration and records it in `schema_migrations`, atomically.
    pub fn apply(&self, conn: &mut rusqlite::Connection) -> anyhow::Result<()> {
        let tx = conn.transaction()?;

        tx.execute_batch(self.up)?;

        let applied_at = OffsetDateTime::now_utc().unix_timestamp();
        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at, description) VALUES (?1, ?2, ?3)",
            rusqlite::params![self.version, applied_at, self.description],
        )?;

        tx.commit()?;
        Ok(())
    }
}

/// Registry of all migrations in version order.
pub const MIGRATIONS: &[Migration] = &[
    Migration::new(
        1,
        "Initial schema: create notes and note_references tables",
        include_str!("migrations/001_initial_schema.sql"),
    ),
    // Hierarchical folders for organizing notes
    Migration::new(
        2,
        "Add note_folders table and folder_id column on notes",
        include_str!("migrations/002_note_folders.sql"),
    ),
];

/// Applies all pending migrations in version order.
pub fn apply_pending_migrations(conn: &mut rusqlite::Connection) -> anyhow::Result<()> {
    ensure_migration_table_exists(conn)?;

    for migration in MIGRATIONS {
        if !migration.is_applied(conn)? {
            migration.apply(conn)?;
            tracing::info!(
                version = migration.version,
                description = migration.description,
                "applied migration"
            );
        }
    }

    Ok(())
}

/// Returns the highest applied migration version, or 0 for a fresh database.
pub fn current_version(conn: &rusqlite::Connection) -> anyhow::Result<u32> {
    let version: Option<u32> =
        conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })?;
    Ok(version.unwrap_or(0))
}

fn ensure_migration_table_exists(conn: &rusqlite::Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL,
            description TEXT
        );
        "#,
    )?;
    Ok(())
}
