use thiserror::Error;

/// Why a link could not be spliced into content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InsertError {
    /// The cursor lies past the end of the content.
    #[error("cursor {cursor} is past the end of the content ({len} bytes)")]
    CursorOutOfRange { cursor: usize, len: usize },

    /// The cursor falls inside a multi-byte character.
    #[error("cursor {cursor} is not on a character boundary")]
    NotCharBoundary { cursor: usize },

    /// The title is blank or contains `]` or `|`, so it would not parse back.
    #[error("cannot link to {title:?}: titles must be non-empty and free of ']' and '|'")]
    UnlinkableTitle { title: String },

    /// The display text contains `]`, which would end the link early.
    #[error("cannot label a link with {display:?}: display text must not contain ']'")]
    UnlinkableDisplay { display: String },
}

/// Content after a link has been inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkInsertion {
    /// The new content.
    pub content: String,
    /// Byte offset just past the inserted link.
    pub cursor: usize,
}

/// Builds the link text for `title`, labelled with `display` when it differs.
///
/// # Examples
///
/// ```
/// use lore::links::link_literal;
///
/// assert_eq!(link_literal("Keep", None), "[[Keep]]");
/// assert_eq!(link_literal("Keep", Some("Keep")), "[[Keep]]");
/// assert_eq!(link_literal("Keep", Some("the keep")), "[[Keep|the keep]]");
/// ```
pub fn link_literal(title: &str, display: Option<&str>) -> String {
    match display {
        Some(label) if !label.is_empty() && label != title => format!("[[{title}|{label}]]"),
        _ => format!("[[{title}]]"),
    }
}

/// Splices a link to `title` into `content` at byte offset `cursor`.
///
/// The title is not checked against existing notes, so linking a note that
/// does not exist yet is fine; it renders broken until the note is created.
///
/// # Errors
///
/// Returns an error if `cursor` is past the end of `content` or does not sit
/// on a UTF-8 character boundary, or if `title` or `display` could not be
/// read back out of the inserted link unchanged.
///
/// # Examples
///
/// ```
/// use lore::links::insert_link_at_cursor;
///
/// let inserted = insert_link_at_cursor("Meet at  tonight", 8, "Keep", None).unwrap();
/// assert_eq!(inserted.content, "Meet at [[Keep]] tonight");
/// assert_eq!(inserted.cursor, 16);
/// ```
pub fn insert_link_at_cursor(
    content: &str,
    cursor: usize,
    title: &str,
    display: Option<&str>,
) -> Result<LinkInsertion, InsertError> {
    if cursor > content.len() {
        return Err(InsertError::CursorOutOfRange {
            cursor,
            len: content.len(),
        });
    }
    if !content.is_char_boundary(cursor) {
        return Err(InsertError::NotCharBoundary { cursor });
    }
    if title.trim().is_empty() || title.contains([']', '|']) {
        return Err(InsertError::UnlinkableTitle {
            title: title.to_string(),
        });
    }
    if let Some(label) = display
        && label.contains(']')
    {
        return Err(InsertError::UnlinkableDisplay {
            display: label.to_string(),
        });
    }

    let literal = link_literal(title, display);
    let mut new_content = String::with_capacity(content.len() + literal.len());
    new_content.push_str(&content[..cursor]);
    new_content.push_str(&literal);
    new_content.push_str(&content[cursor..]);

    Ok(LinkInsertion {
        content: new_content,
        cursor: cursor + literal.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::links::parse_links;

    #[test]
    fn inserts_plain_link_when_display_matches_title() {
        let inserted = insert_link_at_cursor("ab", 1, "T", Some("T")).unwrap();

        assert_eq!(inserted.content, "a[[T]]b");
        assert_eq!(inserted.cursor, 6);
    }

    #[test]
    fn inserts_labelled_link_when_display_differs() {
        let inserted = insert_link_at_cursor("", 0, "Keep", Some("the keep")).unwrap();

        assert_eq!(inserted.content, "[[Keep|the keep]]");
        assert_eq!(inserted.cursor, inserted.content.len());
    }

    #[test]
    fn empty_display_is_treated_as_absent() {
        let inserted = insert_link_at_cursor("x", 1, "Keep", Some("")).unwrap();
        assert_eq!(inserted.content, "x[[Keep]]");
    }

    #[test]
    fn inserted_link_parses_back_at_cursor() {
        let content = "The party rested.";

        for cursor in 0..=content.len() {
            let inserted = insert_link_at_cursor(content, cursor, "T", None).unwrap();

            assert_eq!(&inserted.content[cursor..inserted.cursor], "[[T]]");
            let links = parse_links(&inserted.content);
            assert!(
                links
                    .iter()
                    .any(|link| link.note_title == "T" && link.start == cursor),
                "expected a link to T at {cursor}"
            );
        }
    }

    #[test]
    fn rejects_links_that_would_not_parse_back() {
        for title in ["Either|Or", "Keep]", "", "  "] {
            let err = insert_link_at_cursor("x", 0, title, None).unwrap_err();
            assert_eq!(
                err,
                InsertError::UnlinkableTitle {
                    title: title.to_string()
                }
            );
        }

        let err = insert_link_at_cursor("x", 0, "Keep", Some("the [keep]")).unwrap_err();
        assert_eq!(
            err,
            InsertError::UnlinkableDisplay {
                display: "the [keep]".to_string()
            }
        );

        // A pipe is fine inside display text.
        let inserted = insert_link_at_cursor("", 0, "Keep", Some("this|that")).unwrap();
        let links = parse_links(&inserted.content);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].note_title, "Keep");
        assert_eq!(links[0].display_text, "this|that");
        assert_eq!(links[0].end, inserted.cursor);
    }

    #[test]
    fn rejects_cursor_past_end() {
        let err = insert_link_at_cursor("abc", 4, "T", None).unwrap_err();
        assert_eq!(err, InsertError::CursorOutOfRange { cursor: 4, len: 3 });
    }

    #[test]
    fn rejects_cursor_inside_multibyte_character() {
        // 'é' occupies bytes 3..5
        let err = insert_link_at_cursor("café", 4, "T", None).unwrap_err();
        assert_eq!(err, InsertError::NotCharBoundary { cursor: 4 });

        assert!(insert_link_at_cursor("café", 5, "T", None).is_ok());
    }
}
