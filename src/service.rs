mod folders;
mod references;

use std::collections::HashSet;

use anyhow::{Context, Result};
use rusqlite::{OptionalExtension, Row, params};
use thiserror::Error;

use crate::db::{Database, columns};
use crate::links::{self, LinkInsertion};
use crate::models::{Category, FolderId, Note, NoteBuilder, NoteId, NoteSummary};

pub use folders::NewFolder;
pub use references::ReferenceError;

const NOTE_COLUMNS: &str = "id, title, content, category, tags, created_at, updated_at, folder_id";

/// Sequences a title may not contain, since they end or split a `[[link]]`.
const RESERVED_TITLE_SEQUENCES: [&str; 3] = ["[[", "]", "|"];

/// Input that the user got wrong, as opposed to a storage failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Titles are link keys and must contain something besides whitespace.
    #[error("Note title cannot be empty")]
    EmptyTitle,

    /// The title would not survive a round trip through `[[Title]]`.
    #[error("Note title cannot contain \"{0}\"")]
    ReservedCharacter(&'static str),

    #[error("Folder name cannot be empty")]
    EmptyFolderName,

    #[error("Folder {0} not found")]
    UnknownFolder(FolderId),
}

/// Fields for a note that does not exist yet.
///
/// # Examples
///
/// ```
/// use lore::{Category, NewNote};
///
/// let note = NewNote::new("Goblin Camp")
///     .content("Smoke over the ridge")
///     .category(Category::Location)
///     .tags(["act-1"]);
/// assert_eq!(note.title, "Goblin Camp");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub category: Category,
    pub tags: Vec<String>,
    pub folder: Option<FolderId>,
}

impl NewNote {
    /// Starts a note with the given title and everything else defaulted.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Sets the content.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Sets the category.
    pub fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Sets the tags.
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Files the note in a folder.
    pub fn folder(mut self, folder: FolderId) -> Self {
        self.folder = Some(folder);
        self
    }
}

/// Partial update for an existing note. `None` fields are left unchanged.
///
/// `folder: Some(None)` moves the note out of any folder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<Category>,
    pub tags: Option<Vec<String>>,
    pub folder: Option<Option<FolderId>>,
}

impl NoteUpdate {
    /// Whether the update would change nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.category.is_none()
            && self.tags.is_none()
            && self.folder.is_none()
    }
}

/// Service layer providing note and reference management.
///
/// `NoteService` owns the `Database` it is given; nothing in the crate reaches
/// for a global connection. CLI and TUI front ends both go through it.
///
/// # Examples
///
/// ```
/// use lore::{Database, NoteService};
///
/// # fn main() -> anyhow::Result<()> {
/// let db = Database::in_memory()?;
/// let service = NoteService::new(db);
/// # Ok(())
/// # }
/// ```
pub struct NoteService {
    db: Database,
}

impl NoteService {
    /// Creates a new `NoteService` with the given database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Returns a reference to the underlying database.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Creates a note and returns it with its assigned ID.
    ///
    /// The title is trimmed; tags are trimmed and de-duplicated ignoring case,
    /// keeping the first spelling.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyTitle`] for a blank title,
    /// [`ValidationError::ReservedCharacter`] for a title that cannot be
    /// linked, [`ValidationError::UnknownFolder`] for a missing folder, or a
    /// database error.
    ///
    /// # Examples
    ///
    /// ```
    /// use lore::{Database, NewNote, NoteService};
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let service = NoteService::new(Database::in_memory()?);
    ///
    /// let note = service.create_note(NewNote::new("Goblin Camp"))?;
    /// assert!(note.id().get() > 0);
    /// assert_eq!(note.title(), "Goblin Camp");
    /// # Ok(())
    /// # }
    /// ```
    pub fn create_note(&self, new: NewNote) -> Result<Note> {
        let title = validate_title(&new.title)?;
        if let Some(folder) = new.folder {
            self.require_folder(folder)?;
        }
        let tags = normalize_tags(&new.tags);
        let now = columns::now();

        let conn = self.db.connection();
        conn.execute(
            "INSERT INTO notes (title, content, category, tags, folder_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                title,
                new.content,
                new.category,
                columns::tags_to_sql(&tags)?,
                new.folder.map(FolderId::get),
                columns::to_millis(now),
            ],
        )
        .context("Failed to insert note")?;

        let id = NoteId::new(conn.last_insert_rowid());
        tracing::info!(note_id = %id, title, "created note");

        Ok(NoteBuilder::new()
            .id(id)
            .title(title)
            .content(new.content)
            .category(new.category)
            .tags(tags)
            .folder(new.folder)
            .created_at(now)
            .updated_at(now)
            .build())
    }

    /// Retrieves a note by ID, or `None` if it doesn't exist.
    pub fn get_note(&self, id: NoteId) -> Result<Option<Note>> {
        let note = self
            .db
            .connection()
            .query_row(
                &format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?1"),
                [id.get()],
                note_from_row,
            )
            .optional()?;
        Ok(note)
    }

    /// Applies a partial update and refreshes `updated_at`.
    ///
    /// Returns `None` if the note doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the update sets a blank or unlinkable
    /// title or names a missing folder, or a database error.
    pub fn update_note(&self, id: NoteId, update: NoteUpdate) -> Result<Option<Note>> {
        let Some(existing) = self.get_note(id)? else {
            return Ok(None);
        };

        let title = match update.title.as_deref() {
            Some(title) => validate_title(title)?.to_string(),
            None => existing.title().to_string(),
        };
        let content = update
            .content
            .unwrap_or_else(|| existing.content().to_string());
        let category = update.category.unwrap_or(existing.category());
        let tags = match update.tags {
            Some(tags) => normalize_tags(&tags),
            None => existing.tags().to_vec(),
        };
        let folder = match update.folder {
            Some(Some(folder)) => {
                self.require_folder(folder)?;
                Some(folder)
            }
            Some(None) => None,
            None => existing.folder_id(),
        };
        let now = columns::now();

        self.db
            .connection()
            .execute(
                "UPDATE notes
                 SET title = ?1, content = ?2, category = ?3, tags = ?4, folder_id = ?5,
                     updated_at = ?6
                 WHERE id = ?7",
                params![
                    title,
                    content,
                    category,
                    columns::tags_to_sql(&tags)?,
                    folder.map(FolderId::get),
                    columns::to_millis(now),
                    id.get(),
                ],
            )
            .context("Failed to update note")?;

        tracing::info!(note_id = %id, "updated note");

        Ok(Some(
            NoteBuilder::new()
                .id(id)
                .title(title)
                .content(content)
                .category(category)
                .tags(tags)
                .folder(folder)
                .created_at(existing.created_at())
                .updated_at(now)
                .build(),
        ))
    }

    /// Deletes a note by ID. Returns whether a note was removed.
    ///
    /// Deleting a missing note is not an error. Reference edges naming the
    /// note on either end are removed with it.
    pub fn delete_note(&self, id: NoteId) -> Result<bool> {
        let removed = self
            .db
            .connection()
            .execute("DELETE FROM notes WHERE id = ?1", [id.get()])?;

        if removed > 0 {
            tracing::info!(note_id = %id, "deleted note");
        }
        Ok(removed > 0)
    }

    /// Lists notes ordered by last update, filtered by `options`.
    ///
    /// # Examples
    ///
    /// ```
    /// use lore::{Category, Database, ListNotesOptions, NewNote, NoteService};
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let service = NoteService::new(Database::in_memory()?);
    /// service.create_note(NewNote::new("Grukk").category(Category::Npc))?;
    /// service.create_note(NewNote::new("Goblin Camp").category(Category::Location))?;
    ///
    /// let npcs = service.list_notes(ListNotesOptions {
    ///     category: Some(Category::Npc),
    ///     ..Default::default()
    /// })?;
    /// assert_eq!(npcs.len(), 1);
    /// # Ok(())
    /// # }
    /// ```
    pub fn list_notes(&self, options: ListNotesOptions) -> Result<Vec<Note>> {
        let folder = options.folder.map(FolderId::get);
        let mut clauses = Vec::new();
        let mut params: Vec<&dyn rusqlite::ToSql> = Vec::new();

        if let Some(category) = &options.category {
            params.push(category);
            clauses.push(format!("category = ?{}", params.len()));
        }
        if let Some(tag) = &options.tag {
            params.push(tag);
            clauses.push(format!(
                "EXISTS (SELECT 1 FROM json_each(notes.tags) WHERE json_each.value = ?{})",
                params.len()
            ));
        }
        if let Some(folder) = &folder {
            params.push(folder);
            clauses.push(format!("folder_id = ?{}", params.len()));
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        let order = match options.order {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        };
        let limit_clause = options
            .limit
            .map(|limit| format!(" LIMIT {limit}"))
            .unwrap_or_default();

        let query = format!(
            "SELECT {NOTE_COLUMNS} FROM notes{where_clause}
             ORDER BY updated_at {order}, id {order}{limit_clause}"
        );

        let conn = self.db.connection();
        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(params), note_from_row)?;

        let mut notes = Vec::new();
        for row_result in rows {
            notes.push(row_result?);
        }
        Ok(notes)
    }

    /// Loads every note in creation order.
    ///
    /// This is the snapshot that link resolution runs against, so when two
    /// notes share a title the older one wins.
    pub fn notes_snapshot(&self) -> Result<Vec<Note>> {
        let conn = self.db.connection();
        let mut stmt = conn.prepare(&format!("SELECT {NOTE_COLUMNS} FROM notes ORDER BY id"))?;
        let rows = stmt.query_map([], note_from_row)?;

        let mut notes = Vec::new();
        for row_result in rows {
            notes.push(row_result?);
        }
        Ok(notes)
    }

    /// Finds the note a `[[title]]` link would resolve to.
    pub fn find_by_title(&self, title: &str) -> Result<Option<Note>> {
        let notes = self.notes_snapshot()?;
        Ok(links::resolve(title, &notes).cloned())
    }

    /// Lists note summaries by title, for picking a link or reference target.
    ///
    /// `exclude` drops one note, usually the one being edited.
    pub fn notes_for_reference(&self, exclude: Option<NoteId>) -> Result<Vec<NoteSummary>> {
        let conn = self.db.connection();
        let mut stmt = conn.prepare(
            "SELECT id, title, category FROM notes
             WHERE ?1 IS NULL OR id != ?1
             ORDER BY title COLLATE NOCASE, id",
        )?;
        let rows = stmt.query_map([exclude.map(NoteId::get)], summary_from_row)?;

        let mut summaries = Vec::new();
        for row_result in rows {
            summaries.push(row_result?);
        }
        Ok(summaries)
    }

    /// Inserts a `[[title]]` link into a stored note's content at `cursor`.
    ///
    /// Returns the updated note and the cursor just past the new link, or
    /// `None` if the note doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns [`crate::links::InsertError`] for an invalid cursor or a title
    /// that cannot be linked, or a
    /// database error.
    pub fn insert_link(
        &self,
        id: NoteId,
        cursor: usize,
        title: &str,
        display: Option<&str>,
    ) -> Result<Option<(Note, usize)>> {
        let Some(note) = self.get_note(id)? else {
            return Ok(None);
        };

        let LinkInsertion { content, cursor } =
            links::insert_link_at_cursor(note.content(), cursor, title, display)?;

        let update = NoteUpdate {
            content: Some(content),
            ..Default::default()
        };
        Ok(self.update_note(id, update)?.map(|note| (note, cursor)))
    }
}

/// Sort order for listing notes by last update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Least recently updated first
    Ascending,
    /// Most recently updated first
    #[default]
    Descending,
}

/// Options for listing notes.
///
/// # Examples
///
/// ```
/// use lore::ListNotesOptions;
///
/// // Every note, most recently updated first
/// let options = ListNotesOptions::default();
///
/// // The ten most recent notes tagged "act-1"
/// let options = ListNotesOptions {
///     limit: Some(10),
///     tag: Some("act-1".to_string()),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListNotesOptions {
    /// Maximum number of notes to return. None means no limit.
    pub limit: Option<usize>,

    /// Only notes in this category.
    pub category: Option<Category>,

    /// Only notes carrying exactly this tag.
    pub tag: Option<String>,

    /// Only notes filed directly in this folder.
    pub folder: Option<FolderId>,

    /// Sort order. Defaults to most recently updated first.
    pub order: SortOrder,
}

fn note_from_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    Ok(NoteBuilder::new()
        .id(NoteId::new(row.get(0)?))
        .title(row.get::<_, String>(1)?)
        .content(row.get::<_, String>(2)?)
        .category(row.get(3)?)
        .tags(columns::tags(row, 4)?)
        .created_at(columns::timestamp(row, 5)?)
        .updated_at(columns::timestamp(row, 6)?)
        .folder(row.get::<_, Option<i64>>(7)?.map(FolderId::new))
        .build())
}

fn summary_from_row(row: &Row<'_>) -> rusqlite::Result<NoteSummary> {
    Ok(NoteSummary {
        id: NoteId::new(row.get(0)?),
        title: row.get(1)?,
        category: row.get(2)?,
    })
}

fn validate_title(title: &str) -> Result<&str, ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    if let Some(reserved) = RESERVED_TITLE_SEQUENCES
        .into_iter()
        .find(|reserved| trimmed.contains(reserved))
    {
        return Err(ValidationError::ReservedCharacter(reserved));
    }
    Ok(trimmed)
}

/// Trims tags, drops empty ones and removes case-insensitive duplicates.
///
/// The first spelling of each tag is kept, in input order.
fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.iter()
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty() && seen.insert(tag.to_lowercase()))
        .map(String::from)
        .collect()
}
