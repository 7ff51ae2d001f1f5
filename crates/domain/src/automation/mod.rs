//! Automation — board-scoped trigger → action rules.
//!
//! An [`AutomationRule`] pairs a [`TriggerType`] (with optional filters) and
//! an [`ActionType`] (with its JSON config). Rules are configuration: the
//! engine reads them but never mutates them.

mod action;
mod trigger;

pub use action::{Action, ActionType};
pub use trigger::{EventData, TriggerConfig, TriggerEvent, TriggerType, matches_trigger};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{KanflowError, ValidationError};
use crate::id::{BoardId, RuleId};

/// A rule that reacts to card events on one board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationRule {
    pub id: RuleId,
    pub board_id: BoardId,
    pub name: String,
    pub trigger_type: TriggerType,
    #[serde(default)]
    pub trigger_config: TriggerConfig,
    pub action_type: ActionType,
    #[serde(default)]
    pub action_config: Map<String, Value>,
    /// Rules run in ascending order for a given event.
    pub execution_order: i32,
    pub is_active: bool,
}

impl AutomationRule {
    /// Create a builder for constructing an [`AutomationRule`].
    #[must_use]
    pub fn builder() -> AutomationRuleBuilder {
        AutomationRuleBuilder::default()
    }

    /// Parse the stored action config into a typed [`Action`].
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming the action type and offending key.
    pub fn action(&self) -> Result<Action, ValidationError> {
        Action::parse(self.action_type, &self.action_config)
    }

    /// Check invariants, including that the action config is well-formed.
    ///
    /// # Errors
    ///
    /// Returns [`KanflowError::Validation`] when the name is empty or the
    /// action config is missing a required key.
    pub fn validate(&self) -> Result<(), KanflowError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        self.action()?;
        Ok(())
    }
}

/// Step-by-step builder for [`AutomationRule`].
///
/// The builder only checks structural invariants; action config is parsed
/// at execution time (or eagerly through [`AutomationRule::validate`]).
#[derive(Debug, Default)]
pub struct AutomationRuleBuilder {
    id: Option<RuleId>,
    board_id: Option<BoardId>,
    name: Option<String>,
    trigger: Option<(TriggerType, TriggerConfig)>,
    action: Option<(ActionType, Map<String, Value>)>,
    execution_order: i32,
    is_active: Option<bool>,
}

impl AutomationRuleBuilder {
    #[must_use]
    pub fn id(mut self, id: RuleId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn board_id(mut self, board_id: BoardId) -> Self {
        self.board_id = Some(board_id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn trigger(mut self, trigger_type: TriggerType, config: TriggerConfig) -> Self {
        self.trigger = Some((trigger_type, config));
        self
    }

    #[must_use]
    pub fn action(mut self, action_type: ActionType, config: Map<String, Value>) -> Self {
        self.action = Some((action_type, config));
        self
    }

    /// Convenience for JSON-literal configs; non-object values become an empty config.
    #[must_use]
    pub fn action_json(self, action_type: ActionType, config: Value) -> Self {
        let map = match config {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self.action(action_type, map)
    }

    #[must_use]
    pub fn execution_order(mut self, order: i32) -> Self {
        self.execution_order = order;
        self
    }

    #[must_use]
    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    /// Consume the builder and return an [`AutomationRule`].
    ///
    /// # Errors
    ///
    /// Returns [`KanflowError::Validation`] when the name is empty or the
    /// trigger or action is missing.
    pub fn build(self) -> Result<AutomationRule, KanflowError> {
        let name = self.name.unwrap_or_default();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        let (trigger_type, trigger_config) = self.trigger.ok_or(ValidationError::MissingTrigger)?;
        let (action_type, action_config) = self.action.ok_or(ValidationError::MissingAction)?;
        Ok(AutomationRule {
            id: self.id.unwrap_or_default(),
            board_id: self.board_id.unwrap_or_default(),
            name,
            trigger_type,
            trigger_config,
            action_type,
            action_config,
            execution_order: self.execution_order,
            is_active: self.is_active.unwrap_or(true),
        })
    }
}
