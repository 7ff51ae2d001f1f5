//! Mirror rules — duplicating a card's presence onto another board.
//!
//! A rule pairs a source `(board, list)` with a target `(board, list)`.
//! Forward rules fire when a card enters the source list. Bidirectional
//! rules also fire when a card enters the *target* list, in which case the
//! roles are swapped and the configured source becomes the destination.

use serde::{Deserialize, Serialize};

use crate::card::Card;
use crate::error::{KanflowError, ValidationError};
use crate::id::{BoardId, MirrorRuleId};

/// Which side(s) of a mirror rule react to list transitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MirrorDirection {
    #[default]
    Forward,
    Bidirectional,
}

impl MirrorDirection {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Bidirectional => "bidirectional",
        }
    }
}

impl std::str::FromStr for MirrorDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forward" => Ok(Self::Forward),
            "bidirectional" => Ok(Self::Bidirectional),
            other => Err(format!("unknown mirror direction `{other}`")),
        }
    }
}

/// Board-pair configuration describing when a card is mirrored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorRule {
    pub id: MirrorRuleId,
    pub source_board_id: BoardId,
    pub source_list_name: String,
    pub target_board_id: BoardId,
    pub target_list_name: String,
    pub direction: MirrorDirection,
    /// Optional equality filter against a card column.
    pub condition_field: Option<String>,
    pub condition_value: Option<String>,
    /// Delete the source placement after mirroring ("move" instead of "copy").
    pub remove_from_source: bool,
    pub is_active: bool,
}

/// One applicable evaluation of a mirror rule, with roles already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorRoute<'a> {
    pub rule: &'a MirrorRule,
    pub target_board_id: BoardId,
    pub target_list_name: &'a str,
    /// `true` when a bidirectional rule fired from its target side.
    pub reversed: bool,
}

impl MirrorRule {
    /// A forward, copy-semantics, unconditional rule.
    #[must_use]
    pub fn new(
        source_board_id: BoardId,
        source_list_name: impl Into<String>,
        target_board_id: BoardId,
        target_list_name: impl Into<String>,
    ) -> Self {
        Self {
            id: MirrorRuleId::new(),
            source_board_id,
            source_list_name: source_list_name.into(),
            target_board_id,
            target_list_name: target_list_name.into(),
            direction: MirrorDirection::Forward,
            condition_field: None,
            condition_value: None,
            remove_from_source: false,
            is_active: true,
        }
    }

    #[must_use]
    pub fn bidirectional(mut self) -> Self {
        self.direction = MirrorDirection::Bidirectional;
        self
    }

    #[must_use]
    pub fn removing_source(mut self) -> Self {
        self.remove_from_source = true;
        self
    }

    #[must_use]
    pub fn with_condition(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.condition_field = Some(field.into());
        self.condition_value = Some(value.into());
        self
    }

    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyListName`] when either list name is blank.
    pub fn validate(&self) -> Result<(), KanflowError> {
        if self.source_list_name.trim().is_empty() {
            return Err(ValidationError::EmptyListName("source_list_name").into());
        }
        if self.target_list_name.trim().is_empty() {
            return Err(ValidationError::EmptyListName("target_list_name").into());
        }
        Ok(())
    }

    /// Resolve where a card entering `(board_id, list_name)` should be mirrored.
    ///
    /// Returns `None` for inactive rules and for lists this rule does not watch.
    /// The forward side wins when a rule's source and target are the same list.
    #[must_use]
    pub fn route_from(&self, board_id: BoardId, list_name: &str) -> Option<MirrorRoute<'_>> {
        if !self.is_active {
            return None;
        }
        if self.source_board_id == board_id && self.source_list_name == list_name {
            return Some(MirrorRoute {
                rule: self,
                target_board_id: self.target_board_id,
                target_list_name: &self.target_list_name,
                reversed: false,
            });
        }
        if self.direction == MirrorDirection::Bidirectional
            && self.target_board_id == board_id
            && self.target_list_name == list_name
        {
            return Some(MirrorRoute {
                rule: self,
                target_board_id: self.source_board_id,
                target_list_name: &self.source_list_name,
                reversed: true,
            });
        }
        None
    }

    /// Evaluate the optional condition against `card`.
    ///
    /// A rule without both a condition field and value always holds. A card
    /// without the named field never satisfies a condition.
    #[must_use]
    pub fn condition_holds(&self, card: &Card) -> bool {
        match (&self.condition_field, &self.condition_value) {
            (Some(field), Some(expected)) => {
                card.field_as_string(field).as_deref() == Some(expected.as_str())
            }
            _ => true,
        }
    }
}
