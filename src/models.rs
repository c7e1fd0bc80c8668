mod category;
mod folder;
mod ids;
mod note;
mod reference;

pub use category::{Category, CategoryParseError};
pub use folder::{Folder, FolderNode, folder_tree};
pub use ids::{FolderId, NoteId, ReferenceId};
pub use note::{Note, NoteBuilder};
pub use reference::{NoteReference, NoteSummary, ReferenceEdge};
