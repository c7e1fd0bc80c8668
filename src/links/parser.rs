use std::collections::HashSet;
use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

// Title: anything but `]` or `|`. Optional display after a pipe: anything but `]`.
static LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\[([^\]|]*)(?:\|([^\]]*))?\]\]").expect("link pattern is valid")
});

/// One `[[...]]` occurrence found in a block of text.
///
/// All string fields borrow from the scanned text. Offsets are byte offsets,
/// `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkOccurrence<'a> {
    /// The exact matched text, brackets included.
    pub full_match: &'a str,
    /// Target title, trimmed. May be empty for `[[]]`.
    pub note_title: &'a str,
    /// Trimmed display text, or the title when none was given.
    pub display_text: &'a str,
    /// Byte offset of the opening `[[`.
    pub start: usize,
    /// Byte offset just past the closing `]]`.
    pub end: usize,
}

impl LinkOccurrence<'_> {
    /// The occurrence's byte range in the scanned text.
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Whether the occurrence carries a label distinct from its title.
    pub fn has_custom_label(&self) -> bool {
        self.display_text != self.note_title
    }
}

/// Extracts every link occurrence from `content` in document order.
///
/// The scan is purely syntactic: titles are not checked against any note.
/// An unterminated `[[` never matches, and the first `]` or `|` ends a title.
///
/// # Examples
///
/// ```
/// use lore::links::parse_links;
///
/// let links = parse_links("Meet at [[Dragon's Lair|the lair]] tonight.");
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].note_title, "Dragon's Lair");
/// assert_eq!(links[0].display_text, "the lair");
/// assert_eq!(links[0].start, 8);
/// ```
pub fn parse_links(content: &str) -> Vec<LinkOccurrence<'_>> {
    LINK_RE
        .captures_iter(content)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let note_title = caps.get(1).map_or("", |m| m.as_str().trim());
            let display_text = caps
                .get(2)
                .map(|m| m.as_str().trim())
                .filter(|label| !label.is_empty())
                .unwrap_or(note_title);

            Some(LinkOccurrence {
                full_match: whole.as_str(),
                note_title,
                display_text,
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

/// Returns the distinct link titles in `content`, first occurrence wins.
///
/// Titles are compared case-insensitively; empty titles are skipped.
pub fn outgoing_titles(content: &str) -> Vec<&str> {
    let mut seen = HashSet::new();
    parse_links(content)
        .into_iter()
        .map(|link| link.note_title)
        .filter(|title| !title.is_empty() && seen.insert(title.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_link() {
        let links = parse_links("[[Dragon's Lair]]");

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].full_match, "[[Dragon's Lair]]");
        assert_eq!(links[0].note_title, "Dragon's Lair");
        assert_eq!(links[0].display_text, "Dragon's Lair");
        assert_eq!(links[0].span(), 0..17);
        assert!(!links[0].has_custom_label());
    }

    #[test]
    fn parses_link_with_display_text() {
        let links = parse_links("[[Dragon's Lair|the lair]]");

        assert_eq!(links[0].note_title, "Dragon's Lair");
        assert_eq!(links[0].display_text, "the lair");
        assert!(links[0].has_custom_label());
    }

    #[test]
    fn trims_title_and_display_text() {
        let links = parse_links("[[  Alpha  |  the first  ]]");

        assert_eq!(links[0].note_title, "Alpha");
        assert_eq!(links[0].display_text, "the first");
    }

    #[test]
    fn empty_display_text_falls_back_to_title() {
        let links = parse_links("[[Alpha|]] and [[Beta|   ]]");

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].display_text, "Alpha");
        assert_eq!(links[1].display_text, "Beta");
    }

    #[test]
    fn empty_brackets_yield_empty_title() {
        let links = parse_links("before [[]] after");

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].note_title, "");
        assert_eq!(links[0].span(), 7..11);
    }

    #[test]
    fn unterminated_brackets_do_not_match() {
        assert!(parse_links("see [[Nowhere").is_empty());
        assert!(parse_links("see [[Nowhere]").is_empty());
        assert!(parse_links("stray ]] here").is_empty());
    }

    #[test]
    fn second_pipe_belongs_to_display_text() {
        let links = parse_links("[[a|b|c]]");

        assert_eq!(links[0].note_title, "a");
        assert_eq!(links[0].display_text, "b|c");
    }

    #[test]
    fn first_closing_bracket_ends_the_link() {
        let links = parse_links("[[Outer [[Inner]] tail]]");

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].note_title, "Outer [[Inner");
        assert_eq!(links[0].full_match, "[[Outer [[Inner]]");
    }

    #[test]
    fn occurrences_are_ordered_and_disjoint() {
        let content = "[[A]][[B]] text [[C|see]] [[D]]";
        let links = parse_links(content);

        assert_eq!(links.len(), 4);
        for pair in links.windows(2) {
            assert!(pair[0].start < pair[1].start);
            assert!(pair[0].end <= pair[1].start);
        }
        for link in &links {
            assert_eq!(&content[link.span()], link.full_match);
        }
    }

    #[test]
    fn parsing_is_repeatable() {
        let content = "Go to [[Goblin Camp]] then [[Keep|the keep]].";
        assert_eq!(parse_links(content), parse_links(content));
    }

    #[test]
    fn offsets_are_byte_offsets_for_multibyte_text() {
        let content = "Café → [[Ünterberg]]";
        let links = parse_links(content);

        assert_eq!(links[0].note_title, "Ünterberg");
        assert_eq!(&content[links[0].start..links[0].end], "[[Ünterberg]]");
    }

    #[test]
    fn outgoing_titles_deduplicates_case_insensitively() {
        let titles = outgoing_titles("[[Keep]] [[keep|it]] [[]] [[Moat]] [[KEEP]]");
        assert_eq!(titles, vec!["Keep", "Moat"]);
    }
}
