//! Action — the side effect performed when a rule's trigger matches.
//!
//! Rules are stored as an [`ActionType`] plus a free-form JSON config.
//! [`Action::parse`] turns that pair into a typed [`Action`] and rejects
//! missing or malformed keys with an error naming the action and the key.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::card::Priority;
use crate::error::ValidationError;
use crate::id::UserId;

/// Kinds of actions a rule can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    SetField,
    IncrementField,
    SetPriority,
    AddLabel,
    RemoveLabel,
    CreateActivityLog,
    MoveCard,
    CreateCard,
    AssignUser,
    SendNotification,
}

impl ActionType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SetField => "set_field",
            Self::IncrementField => "increment_field",
            Self::SetPriority => "set_priority",
            Self::AddLabel => "add_label",
            Self::RemoveLabel => "remove_label",
            Self::CreateActivityLog => "create_activity_log",
            Self::MoveCard => "move_card",
            Self::CreateCard => "create_card",
            Self::AssignUser => "assign_user",
            Self::SendNotification => "send_notification",
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActionType {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(Value::String(s.to_string()))
    }
}

/// A fully-validated action, one variant per [`ActionType`].
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Upsert a custom field value on the card.
    SetField { field_name: String, value: Value },
    /// Add `increment_by` to a numeric custom field.
    IncrementField {
        field_name: String,
        increment_by: serde_json::Number,
    },
    SetPriority { priority: Priority },
    AddLabel { label_name: String },
    RemoveLabel { label_name: String },
    /// Append an activity row tagged with the rule.
    CreateActivityLog {
        message: Option<String>,
        metadata: Value,
    },
    /// Move the card's home placement to another list of the same board.
    MoveCard { list_name: String },
    /// Create a new card at the head of a list.
    CreateCard {
        list_name: String,
        title: String,
        description: Option<String>,
        priority: Option<Priority>,
    },
    AssignUser { user_id: UserId },
    /// Placeholder: only logged, nothing is delivered.
    SendNotification {
        message: Option<String>,
        recipient: Option<String>,
    },
}

impl Action {
    /// Build a typed action from a stored `(action_type, action_config)` pair.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingConfig`] when a required key is absent
    /// and [`ValidationError::InvalidConfig`] when a key has the wrong shape.
    pub fn parse(action_type: ActionType, config: &Map<String, Value>) -> Result<Self, ValidationError> {
        let cfg = Config {
            action: action_type,
            map: config,
        };
        let action = match action_type {
            ActionType::SetField => Self::SetField {
                field_name: cfg.required_str("field_name")?,
                value: cfg
                    .map
                    .get("value")
                    .cloned()
                    .ok_or_else(|| cfg.missing("value"))?,
            },
            ActionType::IncrementField => Self::IncrementField {
                field_name: cfg.required_str("field_name")?,
                increment_by: cfg.increment_by()?,
            },
            ActionType::SetPriority => {
                let raw = cfg.required_str("priority")?;
                let priority = raw
                    .parse::<Priority>()
                    .map_err(|reason| cfg.invalid("priority", reason))?;
                Self::SetPriority { priority }
            }
            ActionType::AddLabel => Self::AddLabel {
                label_name: cfg.required_str("label_name")?,
            },
            ActionType::RemoveLabel => Self::RemoveLabel {
                label_name: cfg.required_str("label_name")?,
            },
            ActionType::CreateActivityLog => Self::CreateActivityLog {
                message: cfg.optional_str("message")?,
                metadata: cfg.map.get("metadata").cloned().unwrap_or(Value::Null),
            },
            ActionType::MoveCard => Self::MoveCard {
                list_name: cfg.required_str("list_name")?,
            },
            ActionType::CreateCard => Self::CreateCard {
                list_name: cfg.required_str("list_name")?,
                title: cfg.required_str("title")?,
                description: cfg.optional_str("description")?,
                priority: cfg
                    .optional_str("priority")?
                    .map(|raw| raw.parse::<Priority>())
                    .transpose()
                    .map_err(|reason| cfg.invalid("priority", reason))?,
            },
            ActionType::AssignUser => {
                let raw = cfg.required_str("user_id")?;
                let user_id = raw
                    .parse::<UserId>()
                    .map_err(|err| cfg.invalid("user_id", err.to_string()))?;
                Self::AssignUser { user_id }
            }
            ActionType::SendNotification => Self::SendNotification {
                message: cfg.optional_str("message")?,
                recipient: cfg.optional_str("recipient")?,
            },
        };
        Ok(action)
    }

    /// The [`ActionType`] this action was parsed from.
    #[must_use]
    pub fn action_type(&self) -> ActionType {
        match self {
            Self::SetField { .. } => ActionType::SetField,
            Self::IncrementField { .. } => ActionType::IncrementField,
            Self::SetPriority { .. } => ActionType::SetPriority,
            Self::AddLabel { .. } => ActionType::AddLabel,
            Self::RemoveLabel { .. } => ActionType::RemoveLabel,
            Self::CreateActivityLog { .. } => ActionType::CreateActivityLog,
            Self::MoveCard { .. } => ActionType::MoveCard,
            Self::CreateCard { .. } => ActionType::CreateCard,
            Self::AssignUser { .. } => ActionType::AssignUser,
            Self::SendNotification { .. } => ActionType::SendNotification,
        }
    }
}

struct Config<'a> {
    action: ActionType,
    map: &'a Map<String, Value>,
}

impl Config<'_> {
    fn missing(&self, key: &'static str) -> ValidationError {
        ValidationError::MissingConfig {
            action: self.action,
            key,
        }
    }

    fn invalid(&self, key: &'static str, reason: impl Into<String>) -> ValidationError {
        ValidationError::InvalidConfig {
            action: self.action,
            key,
            reason: reason.into(),
        }
    }

    /// Null and blank strings count as missing.
    fn optional_str(&self, key: &'static str) -> Result<Option<String>, ValidationError> {
        match self.map.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(self.invalid(key, "expected a string")),
        }
    }

    fn required_str(&self, key: &'static str) -> Result<String, ValidationError> {
        self.optional_str(key)?.ok_or_else(|| self.missing(key))
    }

    fn increment_by(&self) -> Result<serde_json::Number, ValidationError> {
        match self.map.get("increment_by") {
            None | Some(Value::Null) => Ok(serde_json::Number::from(1)),
            Some(Value::Number(n)) => Ok(n.clone()),
            Some(Value::String(s)) => {
                let s = s.trim();
                s.parse::<i64>()
                    .map(serde_json::Number::from)
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(serde_json::Number::from_f64))
                    .ok_or_else(|| self.invalid("increment_by", "expected a number"))
            }
            Some(_) => Err(self.invalid("increment_by", "expected a number")),
        }
    }
}
