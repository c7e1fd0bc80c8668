use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a note.
///
/// Wraps a database ID to provide type safety and prevent accidental
/// mixing of note and reference IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(i64);

impl NoteId {
    /// Creates a new note ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the underlying ID value.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NoteId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().trim_start_matches('#').parse().map(Self)
    }
}

/// Unique identifier for a persisted reference edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceId(i64);

impl ReferenceId {
    /// Creates a new reference ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the underlying ID value.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a note folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderId(i64);

impl FolderId {
    /// Creates a new folder ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the underlying ID value.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FolderId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().trim_start_matches('#').parse().map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_id_serializes_as_raw_integer() {
        let id = NoteId::new(42);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "42");

        let deserialized: NoteId = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, id);
    }

    #[test]
    fn note_id_parses_with_optional_hash_prefix() {
        assert_eq!("7".parse::<NoteId>().unwrap(), NoteId::new(7));
        assert_eq!("#7".parse::<NoteId>().unwrap(), NoteId::new(7));
        assert_eq!(" 12 ".parse::<NoteId>().unwrap(), NoteId::new(12));
        assert!("seven".parse::<NoteId>().is_err());
    }

    #[test]
    fn folder_id_parses_like_note_id() {
        assert_eq!("#3".parse::<FolderId>().unwrap(), FolderId::new(3));
        assert!("".parse::<FolderId>().is_err());
    }

    #[test]
    fn ids_are_not_interchangeable() {
        // These lines would fail to compile:
        // let note_id: NoteId = ReferenceId::new(1);
        // let reference_id: ReferenceId = NoteId::new(1);

        let note_id = NoteId::new(1);
        let reference_id = ReferenceId::new(1);

        assert_eq!(note_id.get(), reference_id.get());
    }
}
