//! Tag-based filtering of stack members.
//!
//! Filtering only decides membership of the visible sequence; it never
//! reorders items, so layout positions stay a function of the original order.

use serde::{Deserialize, Serialize};

/// Items that carry a set of tags
pub trait Tagged {
    fn tags(&self) -> Vec<String>;
}

/// All tags present across `items`, in first-seen order
pub fn tags_of<T: Tagged>(items: &[T]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for item in items {
        for tag in item.tags() {
            if !seen.contains(&tag) {
                seen.push(tag);
            }
        }
    }
    seen
}

/// Items whose tags intersect `selected`; everything when nothing is selected
pub fn visible<'a, T: Tagged>(items: &'a [T], selected: &TagSelection) -> Vec<&'a T> {
    items
        .iter()
        .filter(|item| selected.matches(&item.tags()))
        .collect()
}

/// The set of tags a user has selected
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSelection {
    selected: Vec<String>,
}

impl TagSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `tag` if absent, remove it otherwise. Returns whether it is now selected.
    pub fn toggle(&mut self, tag: &str) -> bool {
        if let Some(pos) = self.selected.iter().position(|t| t == tag) {
            self.selected.remove(pos);
            false
        } else {
            self.selected.push(tag.to_string());
            true
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.selected.iter().any(|t| t == tag)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }

    /// Whether an item carrying `tags` passes the selection
    pub fn matches(&self, tags: &[String]) -> bool {
        self.is_empty() || tags.iter().any(|tag| self.contains(tag))
    }
}

/// A tag offered for selection, with its current state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagChip {
    pub name: String,
    pub active: bool,
}

/// Chips for every tag in `items`, marked with the selection state
pub fn tag_chips<T: Tagged>(items: &[T], selected: &TagSelection) -> Vec<TagChip> {
    tags_of(items)
        .into_iter()
        .map(|name| TagChip {
            active: selected.contains(&name),
            name,
        })
        .collect()
}
