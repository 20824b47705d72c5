//! Static catalog of batch actions offered to the user.

use std::collections::HashSet;

use bulkflow_events::ActionId;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// Visual affordance for an action button.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionVariant {
    /// Regular outline/ghost button.
    #[default]
    Neutral,
    /// Highlighted button.
    Primary,
    /// Red button used for removals.
    Destructive,
}

/// Identity and display metadata shared by every action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSpec {
    /// Stable identifier.
    pub id: ActionId,
    /// Display label (passed through untranslated).
    pub label: String,
    /// Optional icon name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Button variant.
    #[serde(default)]
    pub variant: ActionVariant,
}

/// Text shown by the confirmation dialog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmPrompt {
    /// Dialog title.
    pub title: String,
    /// Dialog body; `{count}` is replaced with the number of selected items.
    pub body: String,
    /// Label of the confirm button.
    pub confirm_label: String,
}

impl ConfirmPrompt {
    /// Build a prompt with the default confirm label.
    #[must_use]
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            confirm_label: "Confirm".to_string(),
        }
    }

    /// Override the confirm button label.
    #[must_use]
    pub fn with_confirm_label(mut self, label: impl Into<String>) -> Self {
        self.confirm_label = label.into();
        self
    }

    /// Body text with the `{count}` placeholder filled in.
    #[must_use]
    pub fn body_for(&self, count: usize) -> String {
        self.body.replace("{count}", &count.to_string())
    }
}

/// One batch operation. Confirmation is part of the variant, not a flag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Runs immediately when chosen.
    Direct(ActionSpec),
    /// Routes through a confirmation dialog before running.
    Confirmed(ActionSpec, ConfirmPrompt),
}

impl Action {
    /// Action that runs without confirmation.
    #[must_use]
    pub fn direct(id: impl Into<ActionId>, label: impl Into<String>) -> Self {
        Self::Direct(ActionSpec {
            id: id.into(),
            label: label.into(),
            icon: None,
            variant: ActionVariant::Neutral,
        })
    }

    /// Action gated by the supplied prompt.
    #[must_use]
    pub fn confirmed(
        id: impl Into<ActionId>,
        label: impl Into<String>,
        prompt: ConfirmPrompt,
    ) -> Self {
        Self::Confirmed(
            ActionSpec {
                id: id.into(),
                label: label.into(),
                icon: None,
                variant: ActionVariant::Neutral,
            },
            prompt,
        )
    }

    /// Attach an icon name.
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.spec_mut().icon = Some(icon.into());
        self
    }

    /// Set the button variant.
    #[must_use]
    pub fn with_variant(mut self, variant: ActionVariant) -> Self {
        self.spec_mut().variant = variant;
        self
    }

    /// Shared metadata.
    #[must_use]
    pub const fn spec(&self) -> &ActionSpec {
        match self {
            Self::Direct(spec) | Self::Confirmed(spec, _) => spec,
        }
    }

    const fn spec_mut(&mut self) -> &mut ActionSpec {
        match self {
            Self::Direct(spec) | Self::Confirmed(spec, _) => spec,
        }
    }

    /// Stable identifier.
    #[must_use]
    pub const fn id(&self) -> &ActionId {
        &self.spec().id
    }

    /// Display label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.spec().label
    }

    /// Confirmation prompt for confirming actions.
    #[must_use]
    pub const fn prompt(&self) -> Option<&ConfirmPrompt> {
        match self {
            Self::Direct(_) => None,
            Self::Confirmed(_, prompt) => Some(prompt),
        }
    }

    /// Whether choosing this action opens a confirmation step.
    #[must_use]
    pub const fn requires_confirmation(&self) -> bool {
        matches!(self, Self::Confirmed(..))
    }
}

/// Ordered, immutable list of actions for one screen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActionCatalog {
    actions: Vec<Action>,
}

impl ActionCatalog {
    /// Build a catalog, rejecting duplicate ids and empty labels.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateAction`] when two actions share an id and
    /// [`CatalogError::EmptyLabel`] when a label is blank.
    pub fn new(actions: Vec<Action>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(actions.len());
        for action in &actions {
            if action.label().trim().is_empty() {
                return Err(CatalogError::EmptyLabel {
                    action: action.id().clone(),
                });
            }
            if !seen.insert(action.id()) {
                return Err(CatalogError::DuplicateAction {
                    action: action.id().clone(),
                });
            }
        }
        Ok(Self { actions })
    }

    /// Look up an action by id.
    #[must_use]
    pub fn get(&self, id: &ActionId) -> Option<&Action> {
        self.actions.iter().find(|action| action.id() == id)
    }

    /// Whether the action exists and needs confirmation.
    #[must_use]
    pub fn requires_confirmation(&self, id: &ActionId) -> bool {
        self.get(id).is_some_and(Action::requires_confirmation)
    }

    /// Iterate actions in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }

    /// Number of actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the catalog has no actions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Split into inline buttons and the overflow menu.
    #[must_use]
    pub fn partition(&self, inline: usize) -> (&[Action], &[Action]) {
        self.actions.split_at(inline.min(self.actions.len()))
    }

    /// Actions to render for the current selection; none when nothing is selected.
    #[must_use]
    pub fn available(&self, selected: usize) -> &[Action] {
        if selected == 0 { &[] } else { &self.actions[..] }
    }
}
