//! Boards and the board-scoped objects rules refer to by name:
//! lists (columns), labels and custom field definitions.

use serde::{Deserialize, Serialize};

use crate::error::{KanflowError, ValidationError};
use crate::id::{BoardId, CardId, FieldDefinitionId, LabelId, ListId};

/// The kind of board, used to pick default automation templates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardType {
    #[default]
    General,
    Software,
    Design,
    Marketing,
}

impl BoardType {
    /// Wire representation used in storage and JSON.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Software => "software",
            Self::Design => "design",
            Self::Marketing => "marketing",
        }
    }
}

impl std::fmt::Display for BoardType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BoardType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "general" => Ok(Self::General),
            "software" => Ok(Self::Software),
            "design" => Ok(Self::Design),
            "marketing" => Ok(Self::Marketing),
            other => Err(format!("unknown board type `{other}`")),
        }
    }
}

/// A board owning lists, labels and custom field definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub name: String,
    pub board_type: BoardType,
}

impl Board {
    /// Create a board with a fresh identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] when `name` is blank.
    pub fn new(name: impl Into<String>, board_type: BoardType) -> Result<Self, KanflowError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(Self {
            id: BoardId::new(),
            name,
            board_type,
        })
    }
}

/// A named lane on a board that holds card placements in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct List {
    pub id: ListId,
    pub board_id: BoardId,
    pub name: String,
    pub position: i64,
}

impl List {
    #[must_use]
    pub fn new(board_id: BoardId, name: impl Into<String>, position: i64) -> Self {
        Self {
            id: ListId::new(),
            board_id,
            name: name.into(),
            position,
        }
    }
}

/// A board-scoped tag that can be attached to cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: LabelId,
    pub board_id: BoardId,
    pub name: String,
    pub color: Option<String>,
}

impl Label {
    #[must_use]
    pub fn new(board_id: BoardId, name: impl Into<String>) -> Self {
        Self {
            id: LabelId::new(),
            board_id,
            name: name.into(),
            color: None,
        }
    }
}

/// Value kind of a custom field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    #[default]
    Text,
    Number,
    Date,
    Checkbox,
}

impl FieldType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Date => "date",
            Self::Checkbox => "checkbox",
        }
    }
}

impl std::str::FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "number" => Ok(Self::Number),
            "date" => Ok(Self::Date),
            "checkbox" => Ok(Self::Checkbox),
            other => Err(format!("unknown field type `{other}`")),
        }
    }
}

/// A named custom field available on every card of a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomFieldDefinition {
    pub id: FieldDefinitionId,
    pub board_id: BoardId,
    pub name: String,
    pub field_type: FieldType,
}

impl CustomFieldDefinition {
    #[must_use]
    pub fn new(board_id: BoardId, name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            id: FieldDefinitionId::new(),
            board_id,
            name: name.into(),
            field_type,
        }
    }
}

/// The value of one custom field on one card, keyed by `(card_id, field_definition_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFieldValue {
    pub card_id: CardId,
    pub field_definition_id: FieldDefinitionId,
    pub value: serde_json::Value,
}

/// Interpret a stored field value as a number.
///
/// Missing, null and non-numeric values count as `0`; numeric strings are parsed.
#[must_use]
pub fn numeric_value(value: Option<&serde_json::Value>) -> serde_json::Number {
    let zero = serde_json::Number::from(0);
    match value {
        Some(serde_json::Value::Number(n)) => n.clone(),
        Some(serde_json::Value::String(s)) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                serde_json::Number::from(i)
            } else {
                s.parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .unwrap_or(zero)
            }
        }
        _ => zero,
    }
}

/// Add `by` to the numeric interpretation of `current`.
///
/// Integer plus integer stays integral; anything else is computed in floating point.
#[must_use]
pub fn add_numeric(current: Option<&serde_json::Value>, by: &serde_json::Number) -> serde_json::Value {
    let base = numeric_value(current);
    if let (Some(a), Some(b)) = (base.as_i64(), by.as_i64()) {
        if let Some(sum) = a.checked_add(b) {
            return serde_json::Value::from(sum);
        }
    }
    let sum = base.as_f64().unwrap_or_default() + by.as_f64().unwrap_or_default();
    serde_json::Number::from_f64(sum).map_or(serde_json::Value::from(0), serde_json::Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn should_reject_board_with_blank_name() {
        let result = Board::new("   ", BoardType::Design);
        assert!(matches!(
            result,
            Err(KanflowError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_parse_board_type_from_wire_name() {
        assert_eq!("design".parse::<BoardType>().unwrap(), BoardType::Design);
        assert!("kanban".parse::<BoardType>().is_err());
    }

    #[test]
    fn should_treat_missing_value_as_zero() {
        assert_eq!(numeric_value(None), serde_json::Number::from(0));
        assert_eq!(numeric_value(Some(&json!(null))), serde_json::Number::from(0));
    }

    #[test]
    fn should_treat_non_numeric_string_as_zero() {
        assert_eq!(numeric_value(Some(&json!("n/a"))), serde_json::Number::from(0));
    }

    #[test]
    fn should_parse_numeric_string() {
        assert_eq!(numeric_value(Some(&json!(" 7 "))), serde_json::Number::from(7));
    }

    #[test]
    fn should_keep_integers_integral_when_adding() {
        let sum = add_numeric(Some(&json!(2)), &serde_json::Number::from(1));
        assert_eq!(sum, json!(3));
    }

    #[test]
    fn should_add_fractional_increment() {
        let by = serde_json::Number::from_f64(0.5).unwrap();
        let sum = add_numeric(Some(&json!("1")), &by);
        assert_eq!(sum.as_f64(), Some(1.5));
    }

    #[test]
    fn should_start_from_zero_when_value_is_missing() {
        let sum = add_numeric(None, &serde_json::Number::from(1));
        assert_eq!(sum, json!(1));
    }
}
