use rusqlite::{OptionalExtension, Row, params};
use thiserror::Error;

use super::NoteService;
use crate::db::columns;
use crate::models::{NoteId, NoteReference, NoteSummary, ReferenceEdge, ReferenceId};

/// Failures from the reference store.
#[derive(Debug, Error)]
pub enum ReferenceError {
    /// One end of the requested edge does not exist.
    #[error("Note {0} not found")]
    NoteNotFound(NoteId),

    #[error("reference store error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl NoteService {
    /// Records that `source` references `target`.
    ///
    /// Adding an edge that already exists returns the stored edge unchanged,
    /// so callers can retry freely.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceError::NoteNotFound`] if either note is missing.
    ///
    /// # Examples
    ///
    /// ```
    /// use lore::{Database, NewNote, NoteService};
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let service = NoteService::new(Database::in_memory()?);
    /// let camp = service.create_note(NewNote::new("Goblin Camp"))?;
    /// let grukk = service.create_note(NewNote::new("Grukk"))?;
    ///
    /// let first = service.add_reference(camp.id(), grukk.id())?;
    /// let again = service.add_reference(camp.id(), grukk.id())?;
    /// assert_eq!(first.id, again.id);
    /// # Ok(())
    /// # }
    /// ```
    pub fn add_reference(
        &self,
        source: NoteId,
        target: NoteId,
    ) -> Result<NoteReference, ReferenceError> {
        self.require_note(source)?;
        self.require_note(target)?;

        let conn = self.database().connection();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO note_references (source_note_id, target_note_id, created_at)
             VALUES (?1, ?2, ?3)",
            params![source.get(), target.get(), columns::to_millis(columns::now())],
        )?;

        let reference = conn.query_row(
            "SELECT id, source_note_id, target_note_id, created_at
             FROM note_references
             WHERE source_note_id = ?1 AND target_note_id = ?2",
            [source.get(), target.get()],
            reference_from_row,
        )?;

        if inserted > 0 {
            tracing::info!(%source, %target, reference_id = %reference.id, "added reference");
        }
        Ok(reference)
    }

    /// Removes the edge from `source` to `target`.
    ///
    /// Returns the number of edges removed, which is 0 when there was none.
    pub fn remove_reference(&self, source: NoteId, target: NoteId) -> Result<usize, ReferenceError> {
        let removed = self.database().connection().execute(
            "DELETE FROM note_references WHERE source_note_id = ?1 AND target_note_id = ?2",
            [source.get(), target.get()],
        )?;

        if removed > 0 {
            tracing::info!(%source, %target, "removed reference");
        }
        Ok(removed)
    }

    /// Notes that `source` references, ordered by title.
    pub fn list_outgoing(&self, source: NoteId) -> Result<Vec<ReferenceEdge>, ReferenceError> {
        self.edges(
            "SELECT r.id, n.id, n.title, n.category, r.created_at
             FROM note_references r
             JOIN notes n ON n.id = r.target_note_id
             WHERE r.source_note_id = ?1
             ORDER BY n.title COLLATE NOCASE, n.id",
            source,
        )
    }

    /// Notes that reference `target`, ordered by title.
    pub fn list_incoming(&self, target: NoteId) -> Result<Vec<ReferenceEdge>, ReferenceError> {
        self.edges(
            "SELECT r.id, n.id, n.title, n.category, r.created_at
             FROM note_references r
             JOIN notes n ON n.id = r.source_note_id
             WHERE r.target_note_id = ?1
             ORDER BY n.title COLLATE NOCASE, n.id",
            target,
        )
    }

    fn edges(&self, sql: &str, id: NoteId) -> Result<Vec<ReferenceEdge>, ReferenceError> {
        let conn = self.database().connection();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([id.get()], edge_from_row)?;

        let mut edges = Vec::new();
        for row_result in rows {
            edges.push(row_result?);
        }
        Ok(edges)
    }

    fn require_note(&self, id: NoteId) -> Result<(), ReferenceError> {
        let found = self
            .database()
            .connection()
            .query_row("SELECT 1 FROM notes WHERE id = ?1", [id.get()], |_| Ok(()))
            .optional()?;

        found.ok_or(ReferenceError::NoteNotFound(id))
    }
}

fn reference_from_row(row: &Row<'_>) -> rusqlite::Result<NoteReference> {
    Ok(NoteReference {
        id: ReferenceId::new(row.get(0)?),
        source: NoteId::new(row.get(1)?),
        target: NoteId::new(row.get(2)?),
        created_at: columns::timestamp(row, 3)?,
    })
}

fn edge_from_row(row: &Row<'_>) -> rusqlite::Result<ReferenceEdge> {
    Ok(ReferenceEdge {
        reference: ReferenceId::new(row.get(0)?),
        peer: NoteSummary {
            id: NoteId::new(row.get(1)?),
            title: row.get(2)?,
            category: row.get(3)?,
        },
        created_at: columns::timestamp(row, 4)?,
    })
}
