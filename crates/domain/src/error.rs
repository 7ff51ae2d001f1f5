//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`KanflowError`] via `#[from]`. Validation and configuration errors are
//! transparent so their message can be written verbatim into the
//! automation execution log.

use crate::automation::ActionType;

/// Top-level error for every fallible operation in kanflow.
#[derive(Debug, thiserror::Error)]
pub enum KanflowError {
    /// A required value was missing or malformed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A rule references a board object (list, label, field) that does not exist.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// A record looked up by identifier does not exist.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// The underlying storage failed to read or write.
    #[error("storage error: {0}")]
    Storage(Box<dyn std::error::Error + Send + Sync>),
}

/// Invariant violations and malformed rule configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("automation rule requires a trigger")]
    MissingTrigger,

    #[error("automation rule requires an action")]
    MissingAction,

    #[error("{action} action requires `{key}` in action_config")]
    MissingConfig {
        action: ActionType,
        key: &'static str,
    },

    #[error("{action} action has invalid `{key}`: {reason}")]
    InvalidConfig {
        action: ActionType,
        key: &'static str,
        reason: String,
    },

    #[error("mirror rule requires a non-empty {0}")]
    EmptyListName(&'static str),
}

/// A rule names a board object that cannot be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("list `{name}` not found on board {board_id}")]
    ListNotFound { board_id: String, name: String },

    #[error("label `{name}` not found on board {board_id}")]
    LabelNotFound { board_id: String, name: String },

    #[error("custom field definition `{name}` not found on board {board_id}")]
    FieldDefinitionNotFound { board_id: String, name: String },
}

/// A record addressed by id is missing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} not found: {id}")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}
