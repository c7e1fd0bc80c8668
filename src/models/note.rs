use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{Category, FolderId, NoteId};

/// A campaign note.
///
/// Notes are the atomic content unit. The title doubles as the link key for
/// inline `[[Title]]` references, matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    id: NoteId,
    title: String,
    content: String,
    category: Category,
    tags: Vec<String>,
    folder_id: Option<FolderId>,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    updated_at: OffsetDateTime,
}

impl Note {
    /// Returns the note's unique identifier.
    pub fn id(&self) -> NoteId {
        self.id
    }

    /// Returns the note's title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the note's raw content, link syntax included.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the note's category.
    pub fn category(&self) -> Category {
        self.category
    }

    /// Returns the note's tags in display order.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Returns the folder holding this note, if it is filed.
    pub fn folder_id(&self) -> Option<FolderId> {
        self.folder_id
    }

    /// Returns when this note was created.
    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    /// Returns when this note was last updated.
    pub fn updated_at(&self) -> OffsetDateTime {
        self.updated_at
    }
}

/// Builder for constructing `Note` instances with optional fields.
///
/// # Examples
///
/// ```
/// use lore::{Category, NoteBuilder, NoteId};
///
/// let note = NoteBuilder::new()
///     .id(NoteId::new(1))
///     .title("Goblin Camp")
///     .category(Category::Location)
///     .build();
///
/// assert_eq!(note.id(), NoteId::new(1));
/// assert_eq!(note.title(), "Goblin Camp");
/// assert!(note.content().is_empty());
/// assert!(note.tags().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct NoteBuilder {
    id: Option<NoteId>,
    title: Option<String>,
    content: Option<String>,
    category: Option<Category>,
    tags: Option<Vec<String>>,
    folder_id: Option<FolderId>,
    created_at: Option<OffsetDateTime>,
    updated_at: Option<OffsetDateTime>,
}

impl NoteBuilder {
    /// Creates a new `NoteBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the note ID.
    pub fn id(mut self, id: NoteId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the note title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the note content.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Sets the category.
    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Sets the tags.
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Files the note in a folder, or leaves it unfiled with `None`.
    pub fn folder(mut self, folder_id: Option<FolderId>) -> Self {
        self.folder_id = folder_id;
        self
    }

    /// Sets the created timestamp.
    pub fn created_at(mut self, created_at: OffsetDateTime) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Sets the updated timestamp.
    pub fn updated_at(mut self, updated_at: OffsetDateTime) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    /// Builds the `Note`, using defaults for optional fields.
    ///
    /// Content defaults to empty, category to `General`, tags to none and
    /// both timestamps to now.
    ///
    /// # Panics
    ///
    /// Panics if `id` or `title` have not been set.
    pub fn build(self) -> Note {
        let now = OffsetDateTime::now_utc();
        Note {
            id: self.id.expect("id is required"),
            title: self.title.expect("title is required"),
            content: self.content.unwrap_or_default(),
            category: self.category.unwrap_or_default(),
            tags: self.tags.unwrap_or_default(),
            folder_id: self.folder_id,
            created_at: self.created_at.unwrap_or(now),
            updated_at: self.updated_at.unwrap_or(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_applies_defaults() {
        let note = NoteBuilder::new().id(NoteId::new(1)).title("Alpha").build();

        assert_eq!(note.id(), NoteId::new(1));
        assert_eq!(note.title(), "Alpha");
        assert_eq!(note.content(), "");
        assert_eq!(note.category(), Category::General);
        assert!(note.tags().is_empty());
        assert_eq!(note.folder_id(), None);
    }

    #[test]
    fn builder_allows_setting_all_fields() {
        let now = OffsetDateTime::now_utc();

        let note = NoteBuilder::new()
            .id(NoteId::new(42))
            .title("Mirabel")
            .content("Innkeeper at [[The Gilded Goose]]")
            .category(Category::Npc)
            .tags(vec!["ally".to_string(), "waterdeep".to_string()])
            .folder(Some(FolderId::new(5)))
            .created_at(now)
            .updated_at(now)
            .build();

        assert_eq!(note.id(), NoteId::new(42));
        assert_eq!(note.content(), "Innkeeper at [[The Gilded Goose]]");
        assert_eq!(note.category(), Category::Npc);
        assert_eq!(note.tags(), &["ally", "waterdeep"]);
        assert_eq!(note.folder_id(), Some(FolderId::new(5)));
        assert_eq!(note.created_at(), now);
        assert_eq!(note.updated_at(), now);
    }

    #[test]
    fn note_serializes_with_lowercase_category() {
        let note = NoteBuilder::new()
            .id(NoteId::new(3))
            .title("Tiamat")
            .category(Category::Pantheon)
            .build();

        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["category"], "pantheon");
        assert!(json["folder_id"].is_null());
        assert!(json["created_at"].is_string());
    }

    #[test]
    #[should_panic(expected = "title is required")]
    fn builder_panics_without_title() {
        let _ = NoteBuilder::new().id(NoteId::new(1)).build();
    }
}
