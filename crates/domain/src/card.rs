//! Cards and their placements in lists.

use serde::{Deserialize, Serialize};

use crate::error::{KanflowError, ValidationError};
use crate::id::{BoardId, CardId, ListId, MirrorRuleId, PlacementId, UserId};
use crate::time::Timestamp;

/// Card priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Urgent];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| {
                let expected: Vec<&str> = Self::ALL.iter().map(|p| p.as_str()).collect();
                format!("expected one of {}, got `{s}`", expected.join(", "))
            })
    }
}

/// A unit of work. A card belongs to its home board and appears in lists
/// through one or more [`CardPlacement`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub board_id: BoardId,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<Timestamp>,
    pub created_by: Option<UserId>,
    pub created_at: Timestamp,
}

impl Card {
    /// Create a builder for constructing a [`Card`].
    #[must_use]
    pub fn builder() -> CardBuilder {
        CardBuilder::default()
    }

    /// Stringified value of a named card column, used by mirror conditions.
    ///
    /// Returns `None` for unknown columns and for null values.
    #[must_use]
    pub fn field_as_string(&self, field: &str) -> Option<String> {
        match field {
            "id" => Some(self.id.to_string()),
            "board_id" => Some(self.board_id.to_string()),
            "title" => Some(self.title.clone()),
            "description" => self.description.clone(),
            "priority" => Some(self.priority.to_string()),
            "due_date" => self.due_date.map(|d| d.to_rfc3339()),
            "created_by" => self.created_by.map(|u| u.to_string()),
            "created_at" => Some(self.created_at.to_rfc3339()),
            _ => None,
        }
    }
}

/// Step-by-step builder for [`Card`].
#[derive(Debug, Default)]
pub struct CardBuilder {
    id: Option<CardId>,
    board_id: Option<BoardId>,
    title: Option<String>,
    description: Option<String>,
    priority: Option<Priority>,
    due_date: Option<Timestamp>,
    created_by: Option<UserId>,
}

impl CardBuilder {
    #[must_use]
    pub fn id(mut self, id: CardId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn board_id(mut self, board_id: BoardId) -> Self {
        self.board_id = Some(board_id);
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    #[must_use]
    pub fn due_date(mut self, due_date: Timestamp) -> Self {
        self.due_date = Some(due_date);
        self
    }

    #[must_use]
    pub fn created_by(mut self, user: UserId) -> Self {
        self.created_by = Some(user);
        self
    }

    /// Consume the builder and return a [`Card`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] when the title is missing or blank.
    pub fn build(self) -> Result<Card, KanflowError> {
        let title = self.title.unwrap_or_default();
        if title.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(Card {
            id: self.id.unwrap_or_default(),
            board_id: self.board_id.unwrap_or_default(),
            title,
            description: self.description,
            priority: self.priority.unwrap_or_default(),
            due_date: self.due_date,
            created_by: self.created_by,
            created_at: crate::time::now(),
        })
    }
}

/// A card's presence in a list.
///
/// Non-mirror placements live on the card's home board. Mirror placements
/// (`is_mirror`) are created by the mirror synchronizer on other boards;
/// `mirror_rule_id` records which rule created them, when known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardPlacement {
    pub id: PlacementId,
    pub card_id: CardId,
    pub list_id: ListId,
    pub position: i64,
    pub is_mirror: bool,
    pub mirror_rule_id: Option<MirrorRuleId>,
}

impl CardPlacement {
    /// A regular placement on the card's home board.
    #[must_use]
    pub fn primary(card_id: CardId, list_id: ListId, position: i64) -> Self {
        Self {
            id: PlacementId::new(),
            card_id,
            list_id,
            position,
            is_mirror: false,
            mirror_rule_id: None,
        }
    }

    /// A mirror placement. Its position is assigned by storage on insert.
    #[must_use]
    pub fn mirror(card_id: CardId, list_id: ListId, rule_id: MirrorRuleId) -> Self {
        Self {
            id: PlacementId::new(),
            card_id,
            list_id,
            position: 0,
            is_mirror: true,
            mirror_rule_id: Some(rule_id),
        }
    }
}

/// A card's home placement changed list.
///
/// Produced by the API layer or by a `move_card` automation and consumed by
/// the mirror synchronizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListChange {
    pub card_id: CardId,
    pub board_id: BoardId,
    /// `None` when the card was just created.
    #[serde(default)]
    pub from_list_name: Option<String>,
    pub to_list_name: String,
    #[serde(default)]
    pub user_id: Option<UserId>,
    /// The placement now sitting in `to_list_name`.
    #[serde(default)]
    pub source_placement_id: Option<PlacementId>,
}

impl ListChange {
    /// `true` when the card left and re-entered the same list.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.from_list_name.as_deref() == Some(self.to_list_name.as_str())
    }
}
