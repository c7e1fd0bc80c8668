use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Classification of a campaign note.
///
/// The set is closed: every place that needs a glyph or a label matches on
/// the variant, so adding a category is a compile error until every mapping
/// handles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Anything that doesn't fit elsewhere.
    #[default]
    General,
    /// Non-player character.
    Npc,
    /// Place in the world.
    Location,
    /// Quest or plot thread.
    Quest,
    /// Session log.
    Session,
    /// Item or artifact.
    Item,
    /// World lore.
    Lore,
    /// Deity or pantheon.
    Pantheon,
}

impl Category {
    /// Every category in display order.
    pub const ALL: [Category; 8] = [
        Category::General,
        Category::Npc,
        Category::Location,
        Category::Quest,
        Category::Session,
        Category::Item,
        Category::Lore,
        Category::Pantheon,
    ];

    /// Storage and serialization name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Npc => "npc",
            Self::Location => "location",
            Self::Quest => "quest",
            Self::Session => "session",
            Self::Item => "item",
            Self::Lore => "lore",
            Self::Pantheon => "pantheon",
        }
    }

    /// Display glyph shown next to note titles.
    ///
    /// # Examples
    ///
    /// ```
    /// use lore::Category;
    ///
    /// assert_eq!(Category::Location.glyph(), "🏰");
    /// ```
    pub fn glyph(self) -> &'static str {
        match self {
            Self::General => "📝",
            Self::Npc => "🧙",
            Self::Location => "🏰",
            Self::Quest => "⚔️",
            Self::Session => "🎲",
            Self::Item => "⚡",
            Self::Lore => "📚",
            Self::Pantheon => "🛐",
        }
    }

    /// Plural human-readable label used in filters and headings.
    pub fn label(self) -> &'static str {
        match self {
            Self::General => "General",
            Self::Npc => "NPCs",
            Self::Location => "Locations",
            Self::Quest => "Quests",
            Self::Session => "Sessions",
            Self::Item => "Items",
            Self::Lore => "Lore",
            Self::Pantheon => "Pantheon",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a known category.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category '{0}' (expected one of: general, npc, location, quest, session, item, lore, pantheon)")]
pub struct CategoryParseError(pub String);

impl FromStr for Category {
    type Err = CategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CategoryParseError(wanted.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_serializes_lowercase() {
        let json = serde_json::to_string(&Category::Npc).unwrap();
        assert_eq!(json, r#""npc""#);

        let parsed: Category = serde_json::from_str(r#""pantheon""#).unwrap();
        assert_eq!(parsed, Category::Pantheon);
    }

    #[test]
    fn from_str_is_case_insensitive() {
        assert_eq!("NPC".parse::<Category>().unwrap(), Category::Npc);
        assert_eq!(" Location ".parse::<Category>().unwrap(), Category::Location);
    }

    #[test]
    fn from_str_rejects_unknown_names() {
        let err = "dragon".parse::<Category>().unwrap_err();
        assert_eq!(err, CategoryParseError("dragon".to_string()));
        assert!(err.to_string().contains("unknown category"));
    }

    #[test]
    fn display_matches_storage_name() {
        for category in Category::ALL {
            assert_eq!(category.to_string(), category.as_str());
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
    }

    #[test]
    fn every_category_has_a_glyph_and_label() {
        for category in Category::ALL {
            assert!(!category.glyph().is_empty());
            assert!(!category.label().is_empty());
        }
    }

    #[test]
    fn default_is_general() {
        assert_eq!(Category::default(), Category::General);
    }
}
