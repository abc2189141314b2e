use super::view::{DialogState, StackView, ViewState};
use super::{CardAction, DialogAction, Intent, Outcome};
use crate::config::LayoutConfig;
use crate::error::{Operation, Result};
use crate::filter::TagChip;
use crate::layout::{StackLayout, StackState};
use crate::models::{Incident, UpdateIncidentDto};
use crate::store::{IncidentStore, LoadState};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// The incidents page: store, stack, tag filter and card/dialog state
pub struct Dashboard {
    store: Arc<IncidentStore>,
    stack: StackView,
    view: ViewState,
}

/// What a renderer needs to draw the incidents page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub load_state: LoadState,
    pub tags: Vec<TagChip>,
    /// Visible incidents, in stack order
    pub incidents: Vec<Incident>,
    pub layout: StackLayout,
    pub collapse_all_available: bool,
    pub open_menus: Vec<String>,
    pub dialog: DialogState,
}

impl Dashboard {
    pub fn new(store: Arc<IncidentStore>, layout: LayoutConfig) -> Self {
        Self {
            store,
            stack: StackView::new(layout),
            view: ViewState::default(),
        }
    }

    pub fn store(&self) -> &Arc<IncidentStore> {
        &self.store
    }

    pub fn stack_state(&self) -> StackState {
        self.stack.state()
    }

    pub fn view_state(&self) -> &ViewState {
        &self.view
    }

    /// Initial bulk load
    pub async fn load(&mut self) -> Result<()> {
        let result = self.store.load_all().await;
        self.prune();
        result
    }

    pub async fn dispatch(&mut self, intent: Intent) -> Result<Outcome> {
        debug!(intent = ?intent, "Dispatching intent");
        match intent {
            Intent::Stack { intent } => Ok(Outcome::from_changed(self.stack.handle_stack(intent))),
            Intent::ToggleTag { tag } => {
                self.stack.toggle_tag(&tag);
                Ok(Outcome::ViewChanged)
            }
            Intent::Card { id, action } => self.handle_card(&id, action).await,
            Intent::Dialog { action } => self.handle_dialog(action).await,
        }
    }

    /// Card intents end here and never reach the stack
    async fn handle_card(&mut self, id: &str, action: CardAction) -> Result<Outcome> {
        if self.store.get(id).is_none() {
            warn!(incident_id = %id, action = ?action, "Card intent for unknown incident");
            return Ok(Outcome::Unchanged);
        }

        match action {
            CardAction::ToggleMenu => {
                self.view.toggle_menu(id);
                Ok(Outcome::ViewChanged)
            }
            CardAction::Edit => {
                self.view.close_menu(id);
                self.view.set_dialog(DialogState::Editing { id: id.to_string() });
                Ok(Outcome::ViewChanged)
            }
            CardAction::SetStatus(status) => {
                self.store.update_status(id, status).await?;
                self.view.close_menu(id);
                Ok(Outcome::Applied(Operation::UpdateStatus))
            }
            CardAction::SetSeverity(severity) => {
                self.store.update_severity(id, severity).await?;
                self.view.close_menu(id);
                Ok(Outcome::Applied(Operation::UpdateSeverity))
            }
            CardAction::Delete => {
                self.store.delete(id).await?;
                self.prune();
                Ok(Outcome::Applied(Operation::Delete))
            }
        }
    }

    /// The dialog closes only after a successful submit
    async fn handle_dialog(&mut self, action: DialogAction) -> Result<Outcome> {
        match action {
            DialogAction::OpenCreate => Ok(Outcome::from_changed(
                self.view.set_dialog(DialogState::Creating),
            )),
            DialogAction::Cancel => Ok(Outcome::from_changed(
                self.view.set_dialog(DialogState::Closed),
            )),
            DialogAction::Submit(form) => match self.view.dialog().clone() {
                DialogState::Closed => {
                    warn!("Dialog submitted while closed");
                    Ok(Outcome::Unchanged)
                }
                DialogState::Creating => {
                    self.store.create(form).await?;
                    self.view.set_dialog(DialogState::Closed);
                    Ok(Outcome::Applied(Operation::Create))
                }
                DialogState::Editing { id } => {
                    self.store.update(&id, UpdateIncidentDto::from(form)).await?;
                    self.view.set_dialog(DialogState::Closed);
                    Ok(Outcome::Applied(Operation::Update))
                }
            },
        }
    }

    fn prune(&mut self) {
        let snapshot = self.store.snapshot();
        self.view.retain_ids(snapshot.iter().map(|i| i.id.as_str()));
    }

    /// Recompute the page from the store's current collection
    pub fn render(&self) -> DashboardView {
        let snapshot = self.store.snapshot();
        let projection = self.stack.project(&snapshot);

        DashboardView {
            load_state: self.store.load_state(),
            tags: projection.tags,
            incidents: projection.visible.into_iter().cloned().collect(),
            layout: projection.layout,
            collapse_all_available: projection.collapse_all_available,
            open_menus: self
                .view
                .open_menus()
                .filter(|id| snapshot.iter().any(|i| i.id == *id))
                .map(str::to_string)
                .collect(),
            dialog: self.view.dialog().clone(),
        }
    }
}
