use crate::config::LayoutConfig;
use crate::filter::{tag_chips, visible, TagChip, TagSelection, Tagged};
use crate::layout::{Keyed, StackIntent, StackLayout, StackLayoutEngine, StackState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Stack state plus tag selection for one stacked list
#[derive(Debug, Clone)]
pub struct StackView {
    engine: StackLayoutEngine,
    selection: TagSelection,
}

/// Everything derived from (items, selection, stack state)
#[derive(Debug, Clone)]
pub struct StackProjection<'a, T> {
    pub tags: Vec<TagChip>,
    pub visible: Vec<&'a T>,
    pub layout: StackLayout,
    pub collapse_all_available: bool,
}

impl StackView {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            engine: StackLayoutEngine::new(config),
            selection: TagSelection::new(),
        }
    }

    pub fn state(&self) -> StackState {
        self.engine.state()
    }

    pub fn selection(&self) -> &TagSelection {
        &self.selection
    }

    pub fn handle_stack(&mut self, intent: StackIntent) -> bool {
        self.engine.handle(intent)
    }

    pub fn toggle_tag(&mut self, tag: &str) -> bool {
        self.selection.toggle(tag)
    }

    /// Recompute the visible sequence and its placements from scratch
    pub fn project<'a, T: Tagged + Keyed>(&self, items: &'a [T]) -> StackProjection<'a, T> {
        let shown = visible(items, &self.selection);
        let layout = self.engine.layout(&shown);
        StackProjection {
            tags: tag_chips(items, &self.selection),
            visible: shown,
            layout,
            collapse_all_available: self.engine.can_collapse_all(),
        }
    }
}

impl Default for StackView {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum DialogState {
    #[default]
    Closed,
    Creating,
    Editing { id: String },
}

impl DialogState {
    pub fn is_open(&self) -> bool {
        !matches!(self, DialogState::Closed)
    }
}

/// Per-card and dialog view flags, keyed by incident id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    open_menus: BTreeSet<String>,
    dialog: DialogState,
}

impl ViewState {
    pub fn is_menu_open(&self, id: &str) -> bool {
        self.open_menus.contains(id)
    }

    pub fn open_menus(&self) -> impl Iterator<Item = &str> {
        self.open_menus.iter().map(String::as_str)
    }

    /// Returns whether the menu is now open
    pub fn toggle_menu(&mut self, id: &str) -> bool {
        if self.open_menus.remove(id) {
            false
        } else {
            self.open_menus.insert(id.to_string());
            true
        }
    }

    pub fn close_menu(&mut self, id: &str) -> bool {
        self.open_menus.remove(id)
    }

    pub fn dialog(&self) -> &DialogState {
        &self.dialog
    }

    pub fn set_dialog(&mut self, dialog: DialogState) -> bool {
        let changed = self.dialog != dialog;
        self.dialog = dialog;
        changed
    }

    /// Drop flags for ids no longer present
    pub fn retain_ids<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        let present: BTreeSet<&str> = ids.into_iter().collect();
        self.open_menus.retain(|id| present.contains(id.as_str()));
        if let DialogState::Editing { id } = &self.dialog {
            if !present.contains(id.as_str()) {
                self.dialog = DialogState::Closed;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::demo_artifacts;

    #[test]
    fn test_projection_follows_filter_and_state() {
        let artifacts = demo_artifacts();
        let mut view = StackView::default();

        let all = view.project(&artifacts);
        assert_eq!(all.visible.len(), 3);
        assert_eq!(all.tags.len(), 6);
        assert!(!all.collapse_all_available);

        view.toggle_tag("monitoring");
        view.handle_stack(StackIntent::ActivateBackground);
        let filtered = view.project(&artifacts);
        assert_eq!(filtered.visible.len(), 1);
        assert_eq!(filtered.layout.placements[0].key, "2");
        assert_eq!(filtered.layout.placements[0].z_rank, 1);
        assert!(filtered.collapse_all_available);
    }

    #[test]
    fn test_menu_flags_keyed_by_id() {
        let mut state = ViewState::default();
        assert!(state.toggle_menu("a"));
        assert!(state.toggle_menu("b"));
        assert!(!state.toggle_menu("a"));
        assert!(!state.is_menu_open("a"));
        assert!(state.is_menu_open("b"));
    }

    #[test]
    fn test_retain_ids_prunes_menus_and_dialog() {
        let mut state = ViewState::default();
        state.toggle_menu("gone");
        state.toggle_menu("kept");
        state.set_dialog(DialogState::Editing {
            id: "gone".to_string(),
        });

        state.retain_ids(["kept"]);
        assert_eq!(state.open_menus().collect::<Vec<_>>(), vec!["kept"]);
        assert_eq!(state.dialog(), &DialogState::Closed);
    }
}
