//! Default automation rules installed when a board is created.
//!
//! Pure static data: nothing here touches storage or the runtime engine.

use serde_json::{Value, json};

use crate::automation::{ActionType, AutomationRule, TriggerConfig, TriggerType};
use crate::board::BoardType;
use crate::id::{BoardId, RuleId};

/// A rule blueprint not yet bound to a board.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleTemplate {
    pub name: &'static str,
    pub trigger_type: TriggerType,
    pub trigger_config: TriggerConfig,
    pub action_type: ActionType,
    pub action_config: Value,
    pub execution_order: i32,
}

impl RuleTemplate {
    /// Bind this template to `board_id` as an active rule.
    #[must_use]
    pub fn into_rule(self, board_id: BoardId) -> AutomationRule {
        let action_config = match self.action_config {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        AutomationRule {
            id: RuleId::new(),
            board_id,
            name: self.name.to_string(),
            trigger_type: self.trigger_type,
            trigger_config: self.trigger_config,
            action_type: self.action_type,
            action_config,
            execution_order: self.execution_order,
            is_active: true,
        }
    }
}

fn moved_to(list: &str) -> TriggerConfig {
    TriggerConfig {
        to_list_name: Some(list.to_string()),
        ..TriggerConfig::default()
    }
}

fn label(name: &str) -> TriggerConfig {
    TriggerConfig {
        label_name: Some(name.to_string()),
        ..TriggerConfig::default()
    }
}

fn urgent_label_raises_priority(order: i32) -> RuleTemplate {
    RuleTemplate {
        name: "Urgent label raises priority",
        trigger_type: TriggerType::LabelAdded,
        trigger_config: label("Urgent"),
        action_type: ActionType::SetPriority,
        action_config: json!({"priority": "high"}),
        execution_order: order,
    }
}

fn log_completion(list: &str, order: i32) -> RuleTemplate {
    RuleTemplate {
        name: "Record completion",
        trigger_type: TriggerType::CardMoved,
        trigger_config: moved_to(list),
        action_type: ActionType::CreateActivityLog,
        action_config: json!({"message": format!("Card reached {list}")}),
        execution_order: order,
    }
}

/// Board-type-specific rule templates.
#[must_use]
pub fn default_automation_rules(board_type: BoardType) -> Vec<RuleTemplate> {
    match board_type {
        BoardType::General => vec![urgent_label_raises_priority(0), log_completion("Done", 1)],
        BoardType::Software => vec![
            RuleTemplate {
                name: "Bugs are high priority",
                trigger_type: TriggerType::LabelAdded,
                trigger_config: label("Bug"),
                action_type: ActionType::SetPriority,
                action_config: json!({"priority": "high"}),
                execution_order: 0,
            },
            RuleTemplate {
                name: "Count review rounds",
                trigger_type: TriggerType::CardMoved,
                trigger_config: moved_to("In Review"),
                action_type: ActionType::IncrementField,
                action_config: json!({"field_name": "Review Rounds", "increment_by": 1}),
                execution_order: 1,
            },
            log_completion("Done", 2),
        ],
        BoardType::Design => vec![
            RuleTemplate {
                name: "Count revisions",
                trigger_type: TriggerType::CardMoved,
                trigger_config: moved_to("Revisions"),
                action_type: ActionType::IncrementField,
                action_config: json!({"field_name": "Revision Count", "increment_by": 1}),
                execution_order: 0,
            },
            urgent_label_raises_priority(1),
            log_completion("Approved", 2),
        ],
        BoardType::Marketing => vec![
            RuleTemplate {
                name: "Overdue campaigns become urgent",
                trigger_type: TriggerType::DueDatePassed,
                trigger_config: TriggerConfig::default(),
                action_type: ActionType::SetPriority,
                action_config: json!({"priority": "urgent"}),
                execution_order: 0,
            },
            RuleTemplate {
                name: "Tag published content",
                trigger_type: TriggerType::CardMoved,
                trigger_config: moved_to("Published"),
                action_type: ActionType::AddLabel,
                action_config: json!({"label_name": "Live"}),
                execution_order: 1,
            },
            RuleTemplate {
                name: "Notify on overdue",
                trigger_type: TriggerType::DueDatePassed,
                trigger_config: TriggerConfig::default(),
                action_type: ActionType::SendNotification,
                action_config: json!({"message": "A campaign is overdue"}),
                execution_order: 2,
            },
        ],
    }
}
