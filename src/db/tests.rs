use super::*;
use tempfile::tempdir;

fn names(db: &Database, kind: &str) -> Vec<String> {
    db.connection()
        .prepare("SELECT name FROM sqlite_master WHERE type = ?1 ORDER BY name")
        .unwrap()
        .query_map([kind], |row| row.get(0))
        .unwrap()
        .filter_map(|r| r.ok())
        .collect()
}

fn insert_note(db: &Database, title: &str) -> i64 {
    db.connection()
        .execute(
            "INSERT INTO notes (title, created_at, updated_at) VALUES (?1, 0, 0)",
            [title],
        )
        .unwrap();
    db.connection().last_insert_rowid()
}

#[test]
fn in_memory_opens_successfully() {
    let result = Database::in_memory();
    assert!(result.is_ok());
}

#[test]
fn schema_tables_exist() {
    let db = Database::in_memory().unwrap();
    let tables = names(&db, "table");

    assert!(tables.contains(&"notes".to_string()));
    assert!(tables.contains(&"note_references".to_string()));
    assert!(tables.contains(&"note_folders".to_string()));
    assert!(tables.contains(&"schema_migrations".to_string()));
}

#[test]
fn schema_indexes_exist() {
    let db = Database::in_memory().unwrap();
    let indexes = names(&db, "index");

    assert!(indexes.contains(&"idx_notes_updated".to_string()));
    assert!(indexes.contains(&"idx_notes_title".to_string()));
    assert!(indexes.contains(&"idx_note_references_target".to_string()));
    assert!(indexes.contains(&"idx_notes_folder".to_string()));
    assert!(indexes.contains(&"idx_note_folders_parent".to_string()));
}

#[test]
fn foreign_keys_enabled() {
    let db = Database::in_memory().unwrap();

    let fk_enabled: i32 = db
        .connection()
        .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
        .unwrap();

    assert_eq!(fk_enabled, 1);
}

#[test]
fn all_migrations_are_recorded() {
    let db = Database::in_memory().unwrap();

    let latest = MIGRATIONS.iter().map(|m| m.version).max().unwrap();
    assert_eq!(db.schema_version().unwrap(), latest);

    let recorded: i64 = db
        .connection()
        .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
        .unwrap();
    assert_eq!(recorded as usize, MIGRATIONS.len());
}

#[test]
fn category_column_rejects_unknown_values() {
    let db = Database::in_memory().unwrap();

    let result = db.connection().execute(
        "INSERT INTO notes (title, category, created_at, updated_at) VALUES ('x', 'dragon', 0, 0)",
        [],
    );

    assert!(result.is_err());
}

#[test]
fn reference_pairs_are_unique() {
    let db = Database::in_memory().unwrap();
    let a = insert_note(&db, "A");
    let b = insert_note(&db, "B");

    let insert = "INSERT INTO note_references (source_note_id, target_note_id, created_at) VALUES (?1, ?2, 0)";
    db.connection().execute(insert, [a, b]).unwrap();

    assert!(db.connection().execute(insert, [a, b]).is_err());
    // The reverse direction is a different edge.
    assert!(db.connection().execute(insert, [b, a]).is_ok());
}

#[test]
fn deleting_a_note_cascades_to_references() {
    let db = Database::in_memory().unwrap();
    let a = insert_note(&db, "A");
    let b = insert_note(&db, "B");
    db.connection()
        .execute(
            "INSERT INTO note_references (source_note_id, target_note_id, created_at) VALUES (?1, ?2, 0)",
            [a, b],
        )
        .unwrap();

    db.connection()
        .execute("DELETE FROM notes WHERE id = ?1", [b])
        .unwrap();

    let remaining: i64 = db
        .connection()
        .query_row("SELECT COUNT(*) FROM note_references", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
}

#[test]
fn open_creates_database_file() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test.db");

    let result = Database::open(&db_path);
    assert!(result.is_ok());
    assert!(db_path.exists());
}

#[test]
fn reopen_is_idempotent() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test.db");

    {
        let db = Database::open(&db_path).unwrap();
        insert_note(&db, "Persisted");
    }

    // Reopen - pending migrations are skipped
    let db2 = Database::open(&db_path).unwrap();

    let count: i32 = db2
        .connection()
        .query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(db2.schema_version().unwrap(), 2);
}

#[test]
fn deleting_a_folder_unfiles_its_notes() {
    let db = Database::in_memory().unwrap();
    let conn = db.connection();
    conn.execute(
        "INSERT INTO note_folders (name, created_at) VALUES ('Villains', 0)",
        [],
    )
    .unwrap();
    let folder_id = conn.last_insert_rowid();
    let note_id = insert_note(&db, "Bhaal");
    conn.execute(
        "UPDATE notes SET folder_id = ?1 WHERE id = ?2",
        [folder_id, note_id],
    )
    .unwrap();

    conn.execute("DELETE FROM note_folders WHERE id = ?1", [folder_id])
        .unwrap();

    let folder: Option<i64> = conn
        .query_row("SELECT folder_id FROM notes WHERE id = ?1", [note_id], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(folder, None);
}

#[test]
fn folder_icon_rejects_unknown_values() {
    let db = Database::in_memory().unwrap();

    let result = db.connection().execute(
        "INSERT INTO note_folders (name, icon, created_at) VALUES ('X', 'custom', 0)",
        [],
    );

    assert!(result.is_err());
}

#[test]
fn deleting_a_parent_row_lifts_children_to_the_root() {
    let db = Database::in_memory().unwrap();
    let conn = db.connection();
    conn.execute(
        "INSERT INTO note_folders (name, created_at) VALUES ('Parent', 0)",
        [],
    )
    .unwrap();
    let parent = conn.last_insert_rowid();
    conn.execute(
        "INSERT INTO note_folders (name, parent_id, created_at) VALUES ('Child', ?1, 0)",
        [parent],
    )
    .unwrap();
    let child = conn.last_insert_rowid();

    conn.execute("DELETE FROM note_folders WHERE id = ?1", [parent])
        .unwrap();

    let parent_id: Option<i64> = conn
        .query_row("SELECT parent_id FROM note_folders WHERE id = ?1", [child], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(parent_id, None);
}
