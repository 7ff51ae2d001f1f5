//! Trigger — the card lifecycle event pattern that activates a rule.
//!
//! Matching follows a "present means constrain, absent means wildcard"
//! policy: only the filter keys set in a rule's [`TriggerConfig`] are
//! compared against the incoming [`EventData`].

use serde::{Deserialize, Serialize};

use super::AutomationRule;

/// Kinds of card events a rule can react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    CardMoved,
    CardCreated,
    CardUpdated,
    FieldChanged,
    LabelAdded,
    LabelRemoved,
    DueDatePassed,
    ChecklistCompleted,
}

impl TriggerType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CardMoved => "card_moved",
            Self::CardCreated => "card_created",
            Self::CardUpdated => "card_updated",
            Self::FieldChanged => "field_changed",
            Self::LabelAdded => "label_added",
            Self::LabelRemoved => "label_removed",
            Self::DueDatePassed => "due_date_passed",
            Self::ChecklistCompleted => "checklist_completed",
        }
    }
}

impl std::fmt::Display for TriggerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TriggerType {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_string()))
    }
}

/// Optional filters of a rule's trigger. Unset keys match anything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_list_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_list_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_list_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_list_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_value: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_name: Option<String>,
}

/// Event-specific fields supplied by the caller for one card mutation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_list_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_list_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_list_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_list_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_value: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_name: Option<String>,
}

/// A card event, constructed by the caller per mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerEvent {
    #[serde(rename = "type")]
    pub trigger_type: TriggerType,
    #[serde(default)]
    pub data: EventData,
}

impl TriggerEvent {
    #[must_use]
    pub fn new(trigger_type: TriggerType, data: EventData) -> Self {
        Self { trigger_type, data }
    }

    /// A `card_moved` event between two named lists.
    #[must_use]
    pub fn card_moved(from_list_name: impl Into<String>, to_list_name: impl Into<String>) -> Self {
        Self::new(
            TriggerType::CardMoved,
            EventData {
                from_list_name: Some(from_list_name.into()),
                to_list_name: Some(to_list_name.into()),
                ..EventData::default()
            },
        )
    }

    /// A `label_added` event for the named label.
    #[must_use]
    pub fn label_added(label_name: impl Into<String>) -> Self {
        Self::new(
            TriggerType::LabelAdded,
            EventData {
                label_name: Some(label_name.into()),
                ..EventData::default()
            },
        )
    }

    /// JSON snapshot written to the execution log.
    #[must_use]
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// `true` when the filter is unset or equal to the event's value.
fn constrains<T: PartialEq>(filter: Option<&T>, actual: Option<&T>) -> bool {
    filter.is_none_or(|expected| actual == Some(expected))
}

impl TriggerConfig {
    /// Compare the filters relevant to `trigger_type` against `data`.
    #[must_use]
    pub fn matches(&self, trigger_type: TriggerType, data: &EventData) -> bool {
        match trigger_type {
            TriggerType::CardMoved => {
                constrains(self.from_list_id.as_ref(), data.from_list_id.as_ref())
                    && constrains(self.to_list_id.as_ref(), data.to_list_id.as_ref())
                    && constrains(self.from_list_name.as_ref(), data.from_list_name.as_ref())
                    && constrains(self.to_list_name.as_ref(), data.to_list_name.as_ref())
            }
            TriggerType::CardCreated => {
                constrains(self.list_name.as_ref(), data.list_name.as_ref())
            }
            TriggerType::FieldChanged => {
                constrains(self.field_name.as_ref(), data.field_name.as_ref())
                    && constrains(self.field_value.as_ref(), data.field_value.as_ref())
            }
            TriggerType::LabelAdded | TriggerType::LabelRemoved => {
                constrains(self.label_name.as_ref(), data.label_name.as_ref())
            }
            TriggerType::CardUpdated
            | TriggerType::DueDatePassed
            | TriggerType::ChecklistCompleted => true,
        }
    }
}

/// Does `rule`'s trigger match `event`? Pure and total.
#[must_use]
pub fn matches_trigger(rule: &AutomationRule, event: &TriggerEvent) -> bool {
    rule.trigger_type == event.trigger_type
        && rule.trigger_config.matches(event.trigger_type, &event.data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::ActionType;
    use crate::id::BoardId;
    use serde_json::json;

    fn rule(trigger_type: TriggerType, trigger_config: TriggerConfig) -> AutomationRule {
        AutomationRule::builder()
            .board_id(BoardId::new())
            .name("rule")
            .trigger(trigger_type, trigger_config)
            .action(ActionType::SendNotification, serde_json::Map::new())
            .build()
            .unwrap()
    }

    #[test]
    fn should_not_match_when_type_differs() {
        let r = rule(TriggerType::CardCreated, TriggerConfig::default());
        assert!(!matches_trigger(&r, &TriggerEvent::card_moved("A", "B")));
    }

    #[test]
    fn should_match_any_move_when_config_is_empty() {
        let r = rule(TriggerType::CardMoved, TriggerConfig::default());
        assert!(matches_trigger(&r, &TriggerEvent::card_moved("Todo", "Doing")));
    }

    #[test]
    fn should_match_move_into_list_from_anywhere() {
        let r = rule(
            TriggerType::CardMoved,
            TriggerConfig {
                to_list_name: Some("Revisions".to_string()),
                ..TriggerConfig::default()
            },
        );
        assert!(matches_trigger(&r, &TriggerEvent::card_moved("Review", "Revisions")));
        assert!(matches_trigger(&r, &TriggerEvent::card_moved("Backlog", "Revisions")));
        assert!(!matches_trigger(&r, &TriggerEvent::card_moved("Revisions", "Done")));
    }

    #[test]
    fn should_require_every_present_key_to_match() {
        let r = rule(
            TriggerType::CardMoved,
            TriggerConfig {
                from_list_name: Some("Review".to_string()),
                to_list_name: Some("Done".to_string()),
                ..TriggerConfig::default()
            },
        );
        assert!(matches_trigger(&r, &TriggerEvent::card_moved("Review", "Done")));
        assert!(!matches_trigger(&r, &TriggerEvent::card_moved("Backlog", "Done")));
    }

    #[test]
    fn should_not_match_when_event_lacks_a_constrained_key() {
        let r = rule(
            TriggerType::CardMoved,
            TriggerConfig {
                to_list_id: Some("list-1".to_string()),
                ..TriggerConfig::default()
            },
        );
        assert!(!matches_trigger(&r, &TriggerEvent::card_moved("A", "B")));
    }

    #[test]
    fn should_filter_card_created_by_list_name() {
        let r = rule(
            TriggerType::CardCreated,
            TriggerConfig {
                list_name: Some("Inbox".to_string()),
                ..TriggerConfig::default()
            },
        );
        let inbox = TriggerEvent::new(
            TriggerType::CardCreated,
            EventData {
                list_name: Some("Inbox".to_string()),
                ..EventData::default()
            },
        );
        let other = TriggerEvent::new(
            TriggerType::CardCreated,
            EventData {
                list_name: Some("Later".to_string()),
                ..EventData::default()
            },
        );
        assert!(matches_trigger(&r, &inbox));
        assert!(!matches_trigger(&r, &other));
    }

    #[test]
    fn should_filter_field_changed_by_name_and_exact_value() {
        let r = rule(
            TriggerType::FieldChanged,
            TriggerConfig {
                field_name: Some("Status".to_string()),
                field_value: Some(json!("Blocked")),
                ..TriggerConfig::default()
            },
        );
        let event = |name: &str, value: serde_json::Value| {
            TriggerEvent::new(
                TriggerType::FieldChanged,
                EventData {
                    field_name: Some(name.to_string()),
                    field_value: Some(value),
                    old_value: Some(json!("Open")),
                    ..EventData::default()
                },
            )
        };
        assert!(matches_trigger(&r, &event("Status", json!("Blocked"))));
        assert!(!matches_trigger(&r, &event("Status", json!("Open"))));
        assert!(!matches_trigger(&r, &event("Owner", json!("Blocked"))));
    }

    #[test]
    fn should_filter_label_events_by_label_name() {
        let added = rule(
            TriggerType::LabelAdded,
            TriggerConfig {
                label_name: Some("Urgent".to_string()),
                ..TriggerConfig::default()
            },
        );
        assert!(matches_trigger(&added, &TriggerEvent::label_added("Urgent")));
        assert!(!matches_trigger(&added, &TriggerEvent::label_added("Later")));

        let removed = rule(TriggerType::LabelRemoved, TriggerConfig::default());
        let event = TriggerEvent::new(
            TriggerType::LabelRemoved,
            EventData {
                label_name: Some("Anything".to_string()),
                ..EventData::default()
            },
        );
        assert!(matches_trigger(&removed, &event));
    }

    #[test]
    fn should_always_match_types_without_filters() {
        for trigger_type in [
            TriggerType::CardUpdated,
            TriggerType::DueDatePassed,
            TriggerType::ChecklistCompleted,
        ] {
            let r = rule(
                trigger_type,
                TriggerConfig {
                    label_name: Some("ignored".to_string()),
                    ..TriggerConfig::default()
                },
            );
            assert!(matches_trigger(&r, &TriggerEvent::new(trigger_type, EventData::default())));
        }
    }

    #[test]
    fn should_ignore_unknown_config_keys_when_deserializing() {
        let config: TriggerConfig =
            serde_json::from_value(json!({"to_list_name": "Done", "colour": "red"})).unwrap();
        assert_eq!(config.to_list_name.as_deref(), Some("Done"));
    }

    #[test]
    fn should_deserialize_event_with_type_tag() {
        let event: TriggerEvent = serde_json::from_value(json!({
            "type": "label_added",
            "data": {"label_name": "Urgent"}
        }))
        .unwrap();
        assert_eq!(event, TriggerEvent::label_added("Urgent"));
    }
}
