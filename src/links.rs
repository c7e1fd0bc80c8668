//! Inline wiki-link engine.
//!
//! Note content may reference other notes with `[[Title]]` or
//! `[[Title|display text]]`. This module parses those occurrences, resolves
//! them against a snapshot of notes, renders content into display segments
//! and splices new links into content at a cursor.
//!
//! Everything here is a pure function over its inputs. Broken links, stray
//! brackets and empty content are ordinary outcomes, never errors.

mod insert;
mod parser;
mod render;
mod resolver;

pub use insert::{InsertError, LinkInsertion, insert_link_at_cursor, link_literal};
pub use parser::{LinkOccurrence, outgoing_titles, parse_links};
pub use render::{Segment, render, render_lines};
pub use resolver::{broken_links, resolve};
