//! Campaign notes with `[[wiki-link]]` cross references.
//!
//! Notes live in SQLite behind [`NoteService`]. Inline links in note content
//! are parsed, resolved and rendered by [`links`]; explicit reference edges
//! between notes are kept by the service alongside them.

pub mod config;
pub mod db;
pub mod links;
pub mod logging;
pub mod models;
pub mod search;
pub mod service;
pub mod tui;

pub use db::Database;
pub use models::{
    Category, CategoryParseError, Folder, FolderId, FolderNode, Note, NoteBuilder, NoteId,
    NoteReference, NoteSummary, ReferenceEdge, ReferenceId, folder_tree,
};
pub use service::{
    ListNotesOptions, NewFolder, NewNote, NoteService, NoteUpdate, ReferenceError, SortOrder,
    ValidationError,
};
