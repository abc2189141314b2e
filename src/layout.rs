//! Stacked timeline layout.
//!
//! The stack is either collapsed, with every card peeking out below the one in
//! front of it, or expanded into a plain top-to-bottom list. Placements are
//! recomputed from scratch for every (visible sequence, state) pair and are
//! never patched incrementally.

use crate::config::LayoutConfig;
use serde::{Deserialize, Serialize};
use strum::Display;

/// Items that can be placed on the stack
pub trait Keyed {
    fn key(&self) -> &str;
}

impl<T: Keyed + ?Sized> Keyed for &T {
    fn key(&self) -> &str {
        (**self).key()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StackState {
    #[default]
    Collapsed,
    Expanded,
}

/// Commands addressed to the stack container itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackIntent {
    /// Activation of the stack background region
    ActivateBackground,
    /// The explicit "collapse all" action
    CollapseAll,
}

/// Where a single card is drawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardPlacement {
    pub key: String,
    pub index: usize,
    /// Vertical offset from the top of the stack (collapsed) or from the
    /// card's slot in the flow (expanded)
    pub offset: u32,
    /// Front-to-back rank; larger renders on top
    pub z_rank: usize,
    pub scale: f64,
}

/// Height of the stack container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum StackExtent {
    /// Collapsed: fixed clickable height
    Fixed { height: u32 },
    /// Expanded: natural height of the cards plus the gaps between them
    Natural { gap: u32 },
}

impl StackExtent {
    /// Resolve to a pixel height given the rendered card heights
    pub fn resolve(&self, heights: &[u32]) -> u32 {
        match *self {
            StackExtent::Fixed { height } => height,
            StackExtent::Natural { gap } => {
                let gaps = saturating_u32(heights.len().saturating_sub(1));
                heights
                    .iter()
                    .fold(0u32, |total, h| total.saturating_add(*h))
                    .saturating_add(gaps.saturating_mul(gap))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackLayout {
    pub state: StackState,
    pub placements: Vec<CardPlacement>,
    pub extent: StackExtent,
}

impl StackLayout {
    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn placement(&self, key: &str) -> Option<&CardPlacement> {
        self.placements.iter().find(|p| p.key == key)
    }

    /// Absolute top of every card in the expanded flow.
    ///
    /// In the collapsed state this is just each card's offset.
    pub fn flow_tops(&self, heights: &[u32]) -> Vec<u32> {
        match self.extent {
            StackExtent::Fixed { .. } => self.placements.iter().map(|p| p.offset).collect(),
            StackExtent::Natural { gap } => {
                let mut top: u32 = 0;
                self.placements
                    .iter()
                    .enumerate()
                    .map(|(i, p)| {
                        let current = top.saturating_add(p.offset);
                        top = top
                            .saturating_add(heights.get(i).copied().unwrap_or(0))
                            .saturating_add(gap);
                        current
                    })
                    .collect()
            }
        }
    }
}

/// Collapse/expand state machine plus the placement function
#[derive(Debug, Clone)]
pub struct StackLayoutEngine {
    state: StackState,
    config: LayoutConfig,
}

impl StackLayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            state: StackState::Collapsed,
            config,
        }
    }

    pub fn state(&self) -> StackState {
        self.state
    }

    pub fn is_expanded(&self) -> bool {
        self.state == StackState::Expanded
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// "Collapse all" is only offered while expanded
    pub fn can_collapse_all(&self) -> bool {
        self.is_expanded()
    }

    /// Apply an intent. Returns whether the state changed.
    pub fn handle(&mut self, intent: StackIntent) -> bool {
        let next = match (self.state, intent) {
            (StackState::Collapsed, StackIntent::ActivateBackground) => StackState::Expanded,
            (StackState::Expanded, StackIntent::CollapseAll) => StackState::Collapsed,
            (current, _) => current,
        };

        let changed = next != self.state;
        if changed {
            tracing::debug!(from = %self.state, to = %next, "Stack state changed");
            self.state = next;
        }
        changed
    }

    /// Placements for the visible, ordered `items` in the current state
    pub fn layout<K: Keyed>(&self, items: &[K]) -> StackLayout {
        let n = items.len();
        let expanded = self.is_expanded();

        let placements = items
            .iter()
            .enumerate()
            .map(|(index, item)| CardPlacement {
                key: item.key().to_string(),
                index,
                offset: if expanded {
                    0
                } else {
                    saturating_u32(index).saturating_mul(self.config.unit_step)
                },
                z_rank: n - index,
                scale: if expanded {
                    1.0
                } else {
                    self.config.collapsed_scale
                },
            })
            .collect();

        let extent = if expanded {
            StackExtent::Natural {
                gap: self.config.expanded_gap,
            }
        } else {
            StackExtent::Fixed {
                height: saturating_u32(n)
                    .saturating_mul(self.config.peek_height)
                    .saturating_add(self.config.headroom),
            }
        };

        StackLayout {
            state: self.state,
            placements,
            extent,
        }
    }
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

impl Default for StackLayoutEngine {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}
