use serde::Serialize;

use crate::models::{Note, NoteId};

use super::parser::parse_links;
use super::resolver::resolve;

/// One display unit produced by [`render`] or [`render_lines`].
///
/// Link segments keep a borrow of the note they point at, so activating one
/// can hand that note to a navigation callback without a second lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment<'n> {
    /// Placeholder for a note with no content.
    Empty,
    /// Plain text between links.
    Text { text: String },
    /// A link that resolved to a note.
    Link {
        label: String,
        #[serde(rename = "note_id", serialize_with = "serialize_note_id")]
        note: &'n Note,
    },
    /// A link whose title matched no note.
    BrokenLink { label: String, title: String },
    /// Separator between lines in line mode.
    LineBreak,
}

fn serialize_note_id<S>(note: &&Note, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_i64(note.id().get())
}

impl<'n> Segment<'n> {
    fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// The visible text of this segment.
    ///
    /// Links show their label, line breaks a newline and the empty
    /// placeholder nothing.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Empty => "",
            Self::Text { text } => text,
            Self::Link { label, .. } | Self::BrokenLink { label, .. } => label,
            Self::LineBreak => "\n",
        }
    }

    /// The note a resolved link points at.
    pub fn target(&self) -> Option<&'n Note> {
        match self {
            Self::Link { note, .. } => Some(*note),
            _ => None,
        }
    }

    /// Whether this is a link, resolved or broken.
    pub fn is_link(&self) -> bool {
        matches!(self, Self::Link { .. } | Self::BrokenLink { .. })
    }

    /// Whether this is a link that resolved to nothing.
    pub fn is_broken(&self) -> bool {
        matches!(self, Self::BrokenLink { .. })
    }

    /// Activates the segment, invoking `on_navigate` with the bound note.
    ///
    /// Only resolved links navigate. Returns whether the callback fired.
    ///
    /// # Examples
    ///
    /// ```
    /// use lore::links::render;
    /// use lore::{NoteBuilder, NoteId};
    ///
    /// let notes = vec![NoteBuilder::new().id(NoteId::new(1)).title("Keep").build()];
    /// let segments = render("Go to [[Keep]].", &notes);
    ///
    /// let mut visited = None;
    /// assert!(!segments[0].activate(|note| visited = Some(note.id())));
    /// assert!(segments[1].activate(|note| visited = Some(note.id())));
    /// assert_eq!(visited, Some(NoteId::new(1)));
    /// ```
    pub fn activate<F>(&self, on_navigate: F) -> bool
    where
        F: FnOnce(&'n Note),
    {
        match self.target() {
            Some(note) => {
                on_navigate(note);
                true
            }
            None => false,
        }
    }

    /// ID of the bound note, for callers that only need the key.
    pub fn target_id(&self) -> Option<NoteId> {
        self.target().map(Note::id)
    }
}

/// Renders `content` into display segments, resolving links against `notes`.
///
/// Empty content yields a single [`Segment::Empty`]. Content without links
/// yields a single text segment. Otherwise text gaps and link segments
/// alternate in document order; empty gaps are skipped.
///
/// Rendering never navigates. Callers trigger navigation with
/// [`Segment::activate`].
///
/// # Examples
///
/// ```
/// use lore::links::render;
///
/// let segments = render("See [[Nowhere]].", &[]);
/// assert_eq!(segments.len(), 3);
/// assert!(segments[1].is_broken());
/// assert_eq!(segments[1].as_str(), "Nowhere");
/// ```
pub fn render<'n>(content: &str, notes: &'n [Note]) -> Vec<Segment<'n>> {
    if content.is_empty() {
        return vec![Segment::Empty];
    }
    render_line(content, notes)
}

/// Renders `content` one line at a time.
///
/// Lines split on `\n` or `\r\n` and each non-blank line gets the same
/// treatment as [`render`]. Whitespace-only lines produce no segments, and a
/// [`Segment::LineBreak`] separates consecutive lines.
pub fn render_lines<'n>(content: &str, notes: &'n [Note]) -> Vec<Segment<'n>> {
    if content.is_empty() {
        return vec![Segment::Empty];
    }

    let mut segments = Vec::new();
    for (index, line) in content.split('\n').enumerate() {
        if index > 0 {
            segments.push(Segment::LineBreak);
        }
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.trim().is_empty() {
            continue;
        }
        segments.extend(render_line(line, notes));
    }
    segments
}

fn render_line<'n>(content: &str, notes: &'n [Note]) -> Vec<Segment<'n>> {
    let links = parse_links(content);
    if links.is_empty() {
        return vec![Segment::text(content)];
    }

    let mut segments = Vec::with_capacity(links.len() * 2 + 1);
    let mut last = 0;

    for link in links {
        if link.start > last {
            segments.push(Segment::text(&content[last..link.start]));
        }

        let label = link.display_text.to_string();
        segments.push(match resolve(link.note_title, notes) {
            Some(note) => Segment::Link { label, note },
            None => Segment::BrokenLink {
                label,
                title: link.note_title.to_string(),
            },
        });

        last = link.end;
    }

    if last < content.len() {
        segments.push(Segment::text(&content[last..]));
    }

    segments
}
