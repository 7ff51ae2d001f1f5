//! Append-only audit records: automation execution log and card activity.

use serde::{Deserialize, Serialize};

use crate::id::{ActivityId, BoardId, CardId, LogEntryId, RuleId, UserId};
use crate::time::Timestamp;

/// Outcome of one rule execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Success,
    Error,
}

impl ExecutionStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl std::str::FromStr for ExecutionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown execution status `{other}`")),
        }
    }
}

/// One row of the automation execution log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionLogEntry {
    pub id: LogEntryId,
    pub rule_id: RuleId,
    pub board_id: BoardId,
    pub card_id: CardId,
    pub trigger_data: serde_json::Value,
    pub action_result: serde_json::Value,
    pub status: ExecutionStatus,
    pub error_message: Option<String>,
    pub created_at: Timestamp,
}

impl ExecutionLogEntry {
    #[must_use]
    pub fn success(
        rule_id: RuleId,
        board_id: BoardId,
        card_id: CardId,
        trigger_data: serde_json::Value,
        action_result: serde_json::Value,
    ) -> Self {
        Self {
            id: LogEntryId::new(),
            rule_id,
            board_id,
            card_id,
            trigger_data,
            action_result,
            status: ExecutionStatus::Success,
            error_message: None,
            created_at: crate::time::now(),
        }
    }

    #[must_use]
    pub fn error(
        rule_id: RuleId,
        board_id: BoardId,
        card_id: CardId,
        trigger_data: serde_json::Value,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: LogEntryId::new(),
            rule_id,
            board_id,
            card_id,
            trigger_data,
            action_result: serde_json::Value::Null,
            status: ExecutionStatus::Error,
            error_message: Some(message.into()),
            created_at: crate::time::now(),
        }
    }
}

/// One row of the card activity feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: ActivityId,
    pub board_id: BoardId,
    pub card_id: CardId,
    pub user_id: Option<UserId>,
    /// Short machine-readable verb, e.g. `automation` or `card_mirrored`.
    pub action: String,
    pub metadata: serde_json::Value,
    pub created_at: Timestamp,
}

impl ActivityEntry {
    #[must_use]
    pub fn new(
        board_id: BoardId,
        card_id: CardId,
        user_id: Option<UserId>,
        action: impl Into<String>,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            id: ActivityId::new(),
            board_id,
            card_id,
            user_id,
            action: action.into(),
            metadata,
            created_at: crate::time::now(),
        }
    }
}
