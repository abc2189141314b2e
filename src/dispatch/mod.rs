//! User intents and their routing.
//!
//! Every interaction is an explicit [`Intent`]. Stack intents go to the layout
//! state machine; card intents go to the card's handler and are never seen by
//! the stack, so a control inside a card cannot expand the stack.

pub mod dashboard;
pub mod timeline;
pub mod view;

pub use dashboard::{Dashboard, DashboardView};
pub use timeline::{ArtifactTimeline, TimelineView};
pub use view::{DialogState, StackProjection, StackView, ViewState};

use crate::error::Operation;
use crate::layout::StackIntent;
use crate::models::{CreateIncidentDto, IncidentStatus, Severity};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Intent {
    /// Addressed to the stack container
    Stack { intent: StackIntent },
    /// Select or deselect a tag chip
    ToggleTag { tag: String },
    /// Issued by a control inside one card
    Card { id: String, action: CardAction },
    /// Issued by the create/edit dialog
    Dialog { action: DialogAction },
}

impl Intent {
    pub fn expand() -> Self {
        Intent::Stack {
            intent: StackIntent::ActivateBackground,
        }
    }

    pub fn collapse_all() -> Self {
        Intent::Stack {
            intent: StackIntent::CollapseAll,
        }
    }

    pub fn toggle_tag(tag: impl Into<String>) -> Self {
        Intent::ToggleTag { tag: tag.into() }
    }

    pub fn card(id: impl Into<String>, action: CardAction) -> Self {
        Intent::Card {
            id: id.into(),
            action,
        }
    }

    pub fn dialog(action: DialogAction) -> Self {
        Intent::Dialog { action }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action", content = "value")]
pub enum CardAction {
    ToggleMenu,
    Edit,
    SetStatus(IncidentStatus),
    SetSeverity(Severity),
    Delete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action", content = "form")]
pub enum DialogAction {
    OpenCreate,
    Cancel,
    /// The form contents; used as a full patch when editing
    Submit(CreateIncidentDto),
}

/// What handling an intent did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Nothing changed
    Unchanged,
    /// View state changed (stack, filter, menu or dialog)
    ViewChanged,
    /// A remote mutation succeeded and was applied
    Applied(Operation),
}

impl Outcome {
    pub fn from_changed(changed: bool) -> Self {
        if changed {
            Outcome::ViewChanged
        } else {
            Outcome::Unchanged
        }
    }
}
