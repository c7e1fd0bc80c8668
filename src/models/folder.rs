use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{Category, FolderId};

/// A named folder that notes can be filed under.
///
/// Folders nest through `parent_id`. Root folders usually carry a category
/// icon; subfolders fall back to a plain folder glyph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
    pub icon: Option<Category>,
    pub parent_id: Option<FolderId>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Folder {
    /// Whether this folder sits at the top of the tree.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Glyph shown next to the folder name.
    pub fn glyph(&self) -> &'static str {
        self.icon.map_or("📁", Category::glyph)
    }
}

/// A folder together with its subfolders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderNode {
    #[serde(flatten)]
    pub folder: Folder,
    pub children: Vec<FolderNode>,
}

/// Arranges a flat folder list into a forest.
///
/// Sibling order follows the input order. A folder whose parent is missing
/// from `folders` is treated as a root.
pub fn folder_tree(folders: Vec<Folder>) -> Vec<FolderNode> {
    let known: HashSet<FolderId> = folders.iter().map(|folder| folder.id).collect();

    let mut by_parent: HashMap<Option<FolderId>, Vec<Folder>> = HashMap::new();
    for folder in folders {
        let parent = folder.parent_id.filter(|id| known.contains(id));
        by_parent.entry(parent).or_default().push(folder);
    }

    attach(None, &mut by_parent)
}

fn attach(
    parent: Option<FolderId>,
    by_parent: &mut HashMap<Option<FolderId>, Vec<Folder>>,
) -> Vec<FolderNode> {
    let siblings = by_parent.remove(&parent).unwrap_or_default();
    siblings
        .into_iter()
        .map(|folder| {
            let children = attach(Some(folder.id), by_parent);
            FolderNode { folder, children }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder(id: i64, name: &str, parent: Option<i64>) -> Folder {
        Folder {
            id: FolderId::new(id),
            name: name.to_string(),
            icon: None,
            parent_id: parent.map(FolderId::new),
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn names(nodes: &[FolderNode]) -> Vec<&str> {
        nodes.iter().map(|node| node.folder.name.as_str()).collect()
    }

    #[test]
    fn nests_children_under_parents() {
        let tree = folder_tree(vec![
            folder(1, "Sword Coast", None),
            folder(2, "Baldur's Gate", Some(1)),
            folder(3, "Lower City", Some(2)),
            folder(4, "Villains", None),
        ]);

        assert_eq!(names(&tree), vec!["Sword Coast", "Villains"]);
        assert_eq!(names(&tree[0].children), vec!["Baldur's Gate"]);
        assert_eq!(names(&tree[0].children[0].children), vec!["Lower City"]);
        assert!(tree[1].children.is_empty());
    }

    #[test]
    fn orphans_become_roots() {
        let tree = folder_tree(vec![folder(7, "Stray", Some(99))]);

        assert_eq!(names(&tree), vec!["Stray"]);
    }

    #[test]
    fn glyph_prefers_category_icon() {
        let mut root = folder(1, "NPCs", None);
        assert_eq!(root.glyph(), "📁");

        root.icon = Some(Category::Npc);
        assert_eq!(root.glyph(), Category::Npc.glyph());
        assert!(root.is_root());
        assert!(!folder(2, "Sub", Some(1)).is_root());
    }
}
