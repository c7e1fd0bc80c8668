use anyhow::{Context, Result};
use rusqlite::{OptionalExtension, Row, params};

use super::{NoteService, ValidationError};
use crate::db::columns;
use crate::models::{Category, Folder, FolderId};

const FOLDER_COLUMNS: &str = "id, name, icon, parent_id, created_at";

/// Fields for a folder that does not exist yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewFolder {
    pub name: String,
    pub icon: Option<Category>,
    pub parent: Option<FolderId>,
}

impl NewFolder {
    /// Starts a root folder with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets the category icon.
    pub fn icon(mut self, icon: Category) -> Self {
        self.icon = Some(icon);
        self
    }

    /// Nests the folder under `parent`.
    pub fn parent(mut self, parent: FolderId) -> Self {
        self.parent = Some(parent);
        self
    }
}

impl NoteService {
    /// Creates a folder, nested under its parent when one is given.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyFolderName`] for a blank name and
    /// [`ValidationError::UnknownFolder`] if the parent does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use lore::{Category, Database, NewFolder, NoteService};
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let service = NoteService::new(Database::in_memory()?);
    /// let coast = service.create_folder(NewFolder::new("Sword Coast").icon(Category::Location))?;
    /// let city = service.create_folder(NewFolder::new("Baldur's Gate").parent(coast.id))?;
    ///
    /// assert_eq!(city.parent_id, Some(coast.id));
    /// # Ok(())
    /// # }
    /// ```
    pub fn create_folder(&self, new: NewFolder) -> Result<Folder> {
        let name = validate_folder_name(&new.name)?;
        if let Some(parent) = new.parent {
            self.require_folder(parent)?;
        }
        let now = columns::now();

        let conn = self.database().connection();
        conn.execute(
            "INSERT INTO note_folders (name, icon, parent_id, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                name,
                new.icon,
                new.parent.map(FolderId::get),
                columns::to_millis(now)
            ],
        )
        .context("Failed to insert folder")?;

        let id = FolderId::new(conn.last_insert_rowid());
        tracing::info!(folder_id = %id, name, "created folder");

        Ok(Folder {
            id,
            name: name.to_string(),
            icon: new.icon,
            parent_id: new.parent,
            created_at: now,
        })
    }

    /// Retrieves a folder by ID, or `None` if it doesn't exist.
    pub fn get_folder(&self, id: FolderId) -> Result<Option<Folder>> {
        let folder = self
            .database()
            .connection()
            .query_row(
                &format!("SELECT {FOLDER_COLUMNS} FROM note_folders WHERE id = ?1"),
                [id.get()],
                folder_from_row,
            )
            .optional()?;
        Ok(folder)
    }

    /// Renames a folder. Returns `None` if it doesn't exist.
    pub fn rename_folder(&self, id: FolderId, name: &str) -> Result<Option<Folder>> {
        let name = validate_folder_name(name)?;
        let renamed = self.database().connection().execute(
            "UPDATE note_folders SET name = ?1 WHERE id = ?2",
            params![name, id.get()],
        )?;
        if renamed == 0 {
            return Ok(None);
        }

        tracing::info!(folder_id = %id, name, "renamed folder");
        self.get_folder(id)
    }

    /// Lists every folder by name. Pass the result to
    /// [`folder_tree`](crate::models::folder_tree) for the nested view.
    pub fn list_folders(&self) -> Result<Vec<Folder>> {
        let conn = self.database().connection();
        let mut stmt = conn.prepare(&format!(
            "SELECT {FOLDER_COLUMNS} FROM note_folders ORDER BY name COLLATE NOCASE, id"
        ))?;
        let rows = stmt.query_map([], folder_from_row)?;

        let mut folders = Vec::new();
        for row_result in rows {
            folders.push(row_result?);
        }
        Ok(folders)
    }

    /// Deletes a folder and every folder nested below it.
    ///
    /// Notes filed anywhere in the removed subtree stay and become unfiled.
    /// Returns the number of folders removed, 0 when `id` does not exist.
    pub fn delete_folder(&self, id: FolderId) -> Result<usize> {
        let removed = self.database().connection().execute(
            "WITH RECURSIVE subtree(id) AS (
                 SELECT id FROM note_folders WHERE id = ?1
                 UNION ALL
                 SELECT f.id FROM note_folders f JOIN subtree s ON f.parent_id = s.id
             )
             DELETE FROM note_folders WHERE id IN (SELECT id FROM subtree)",
            [id.get()],
        )?;

        if removed > 0 {
            tracing::info!(folder_id = %id, removed, "deleted folder");
        }
        Ok(removed)
    }

    pub(super) fn require_folder(&self, id: FolderId) -> Result<()> {
        let exists: bool = self.database().connection().query_row(
            "SELECT EXISTS(SELECT 1 FROM note_folders WHERE id = ?1)",
            [id.get()],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(ValidationError::UnknownFolder(id).into());
        }
        Ok(())
    }
}

fn validate_folder_name(name: &str) -> Result<&str, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyFolderName);
    }
    Ok(trimmed)
}

fn folder_from_row(row: &Row<'_>) -> rusqlite::Result<Folder> {
    Ok(Folder {
        id: FolderId::new(row.get(0)?),
        name: row.get(1)?,
        icon: row.get(2)?,
        parent_id: row.get::<_, Option<i64>>(3)?.map(FolderId::new),
        created_at: columns::timestamp(row, 4)?,
    })
}
