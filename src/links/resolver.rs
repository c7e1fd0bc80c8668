use crate::models::Note;

use super::parser::{LinkOccurrence, parse_links};

/// Finds the note whose title equals `title`, ignoring case.
///
/// When several notes share a title the first one in `notes` wins. A `None`
/// result is a broken link, which is a normal outcome.
///
/// # Examples
///
/// ```
/// use lore::links::resolve;
/// use lore::{NoteBuilder, NoteId};
///
/// let notes = vec![NoteBuilder::new().id(NoteId::new(1)).title("Dragon's Lair").build()];
///
/// assert_eq!(resolve("DRAGON'S LAIR", &notes).map(|n| n.id()), Some(NoteId::new(1)));
/// assert!(resolve("Dragon", &notes).is_none());
/// ```
pub fn resolve<'n>(title: &str, notes: &'n [Note]) -> Option<&'n Note> {
    let wanted = title.to_lowercase();
    notes
        .iter()
        .find(|note| note.title().to_lowercase() == wanted)
}

/// Returns the occurrences in `content` that resolve to no note in `notes`.
pub fn broken_links<'c>(content: &'c str, notes: &[Note]) -> Vec<LinkOccurrence<'c>> {
    parse_links(content)
        .into_iter()
        .filter(|link| resolve(link.note_title, notes).is_none())
        .collect()
}
