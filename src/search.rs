//! In-memory search and filtering over a snapshot of notes.

use std::collections::BTreeSet;

use crate::models::{Category, Note};

/// Criteria for narrowing a note list.
///
/// All criteria are ANDed. Defaults match every note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    /// Case-insensitive substring matched against title, content and tags.
    /// Blank queries match everything.
    pub query: String,
    /// Only notes in this category.
    pub category: Option<Category>,
    /// Only notes carrying exactly this tag.
    pub tag: Option<String>,
}

impl SearchFilters {
    /// Number of active category/tag filters, for status displays.
    pub fn active_filter_count(&self) -> usize {
        usize::from(self.category.is_some()) + usize::from(self.tag.is_some())
    }
}

/// Returns the notes matching `filters`, preserving input order.
///
/// # Examples
///
/// ```
/// use lore::search::{SearchFilters, search_and_filter};
/// use lore::{Category, NoteBuilder, NoteId};
///
/// let notes = vec![
///     NoteBuilder::new().id(NoteId::new(1)).title("Goblin Camp").category(Category::Location).build(),
///     NoteBuilder::new().id(NoteId::new(2)).title("Grukk").category(Category::Npc).build(),
/// ];
///
/// let filters = SearchFilters {
///     query: "g".to_string(),
///     category: Some(Category::Npc),
///     ..Default::default()
/// };
/// let found = search_and_filter(&notes, &filters);
/// assert_eq!(found.len(), 1);
/// assert_eq!(found[0].title(), "Grukk");
/// ```
pub fn search_and_filter<'n>(notes: &'n [Note], filters: &SearchFilters) -> Vec<&'n Note> {
    let query = filters.query.trim().to_lowercase();

    notes
        .iter()
        .filter(|note| query.is_empty() || matches_query(note, &query))
        .filter(|note| filters.category.is_none_or(|category| note.category() == category))
        .filter(|note| {
            filters
                .tag
                .as_deref()
                .is_none_or(|tag| note.tags().iter().any(|t| t == tag))
        })
        .collect()
}

fn matches_query(note: &Note, query: &str) -> bool {
    note.title().to_lowercase().contains(query)
        || note.content().to_lowercase().contains(query)
        || note
            .tags()
            .iter()
            .any(|tag| tag.to_lowercase().contains(query))
}

/// Returns every tag used across `notes`, sorted and de-duplicated.
pub fn available_tags(notes: &[Note]) -> Vec<String> {
    notes
        .iter()
        .flat_map(|note| note.tags().iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Returns notes whose title contains `query`, ignoring case.
///
/// Used when picking a target for a new link; a blank query lists every note.
pub fn link_suggestions<'n>(notes: &'n [Note], query: &str) -> Vec<&'n Note> {
    let query = query.trim().to_lowercase();
    notes
        .iter()
        .filter(|note| note.title().to_lowercase().contains(&query))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NoteBuilder, NoteId};

    fn campaign() -> Vec<Note> {
        vec![
            NoteBuilder::new()
                .id(NoteId::new(1))
                .title("Goblin Camp")
                .content("Smoke rises over the ridge.")
                .category(Category::Location)
                .tags(vec!["act-1".to_string(), "hostile".to_string()])
                .build(),
            NoteBuilder::new()
                .id(NoteId::new(2))
                .title("Grukk")
                .content("Chieftain of the [[Goblin Camp]].")
                .category(Category::Npc)
                .tags(vec!["hostile".to_string()])
                .build(),
            NoteBuilder::new()
                .id(NoteId::new(3))
                .title("Session 1")
                .content("The party met Mirabel.")
                .category(Category::Session)
                .tags(vec!["act-1".to_string()])
                .build(),
        ]
    }

    fn ids(notes: &[&Note]) -> Vec<i64> {
        notes.iter().map(|note| note.id().get()).collect()
    }

    #[test]
    fn default_filters_match_everything() {
        let notes = campaign();
        let found = search_and_filter(&notes, &SearchFilters::default());
        assert_eq!(ids(&found), vec![1, 2, 3]);
    }

    #[test]
    fn query_matches_title_content_and_tags() {
        let notes = campaign();

        let by_title = SearchFilters {
            query: "grukk".to_string(),
            ..Default::default()
        };
        assert_eq!(ids(&search_and_filter(&notes, &by_title)), vec![2]);

        let by_content = SearchFilters {
            query: "MIRABEL".to_string(),
            ..Default::default()
        };
        assert_eq!(ids(&search_and_filter(&notes, &by_content)), vec![3]);

        let by_tag = SearchFilters {
            query: "  hostile ".to_string(),
            ..Default::default()
        };
        assert_eq!(ids(&search_and_filter(&notes, &by_tag)), vec![1, 2]);
    }

    #[test]
    fn category_and_tag_filters_combine() {
        let notes = campaign();
        let filters = SearchFilters {
            query: String::new(),
            category: Some(Category::Location),
            tag: Some("act-1".to_string()),
        };

        assert_eq!(ids(&search_and_filter(&notes, &filters)), vec![1]);
        assert_eq!(filters.active_filter_count(), 2);
    }

    #[test]
    fn tag_filter_is_exact() {
        let notes = campaign();
        let filters = SearchFilters {
            tag: Some("act".to_string()),
            ..Default::default()
        };

        assert!(search_and_filter(&notes, &filters).is_empty());
    }

    #[test]
    fn available_tags_are_sorted_and_unique() {
        let notes = campaign();
        assert_eq!(available_tags(&notes), vec!["act-1", "hostile"]);
        assert!(available_tags(&[]).is_empty());
    }

    #[test]
    fn link_suggestions_match_titles_only() {
        let notes = campaign();

        assert_eq!(ids(&link_suggestions(&notes, "camp")), vec![1]);
        assert!(link_suggestions(&notes, "smoke").is_empty());
        assert_eq!(link_suggestions(&notes, "").len(), 3);
    }
}
