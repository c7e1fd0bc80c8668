use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{Category, Note, NoteId, ReferenceId};

/// A persisted, directed edge between two notes.
///
/// Reference edges are managed explicitly and are independent of inline
/// `[[Title]]` links in note content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteReference {
    pub id: ReferenceId,
    pub source: NoteId,
    pub target: NoteId,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The parts of a note shown in reference panels and pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSummary {
    pub id: NoteId,
    pub title: String,
    pub category: Category,
}

impl From<&Note> for NoteSummary {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id(),
            title: note.title().to_string(),
            category: note.category(),
        }
    }
}

/// One edge seen from a particular note, with the note on the other end.
///
/// For outgoing edges the peer is the target; for incoming edges it is the
/// source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEdge {
    pub reference: ReferenceId,
    pub peer: NoteSummary,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
