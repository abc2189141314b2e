use super::view::StackView;
use super::{Intent, Outcome};
use crate::config::LayoutConfig;
use crate::filter::TagChip;
use crate::layout::StackLayout;
use crate::models::{demo_artifacts, Artifact};
use serde::{Deserialize, Serialize};

/// Read-only stacked timeline of artifacts
pub struct ArtifactTimeline {
    artifacts: Vec<Artifact>,
    stack: StackView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineView {
    pub tags: Vec<TagChip>,
    pub artifacts: Vec<Artifact>,
    pub layout: StackLayout,
    pub collapse_all_available: bool,
}

impl ArtifactTimeline {
    pub fn new(artifacts: Vec<Artifact>, layout: LayoutConfig) -> Self {
        Self {
            artifacts,
            stack: StackView::new(layout),
        }
    }

    pub fn demo(layout: LayoutConfig) -> Self {
        Self::new(demo_artifacts(), layout)
    }

    /// Artifacts are static, so only stack and filter intents change anything
    pub fn handle(&mut self, intent: &Intent) -> Outcome {
        match intent {
            Intent::Stack { intent } => Outcome::from_changed(self.stack.handle_stack(*intent)),
            Intent::ToggleTag { tag } => {
                self.stack.toggle_tag(tag);
                Outcome::ViewChanged
            }
            Intent::Card { .. } | Intent::Dialog { .. } => Outcome::Unchanged,
        }
    }

    pub fn render(&self) -> TimelineView {
        let projection = self.stack.project(&self.artifacts);
        TimelineView {
            tags: projection.tags,
            artifacts: projection.visible.into_iter().cloned().collect(),
            layout: projection.layout,
            collapse_all_available: projection.collapse_all_available,
        }
    }
}
