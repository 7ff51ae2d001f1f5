//! In-memory implementations of every port, for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use kanflow_domain::audit::{ActivityEntry, ExecutionLogEntry};
use kanflow_domain::automation::AutomationRule;
use kanflow_domain::board::{
    Board, BoardType, CustomFieldDefinition, CustomFieldValue, FieldType, Label, List, add_numeric,
};
use kanflow_domain::card::{Card, CardPlacement, Priority};
use kanflow_domain::error::KanflowError;
use kanflow_domain::id::{
    BoardId, CardId, FieldDefinitionId, LabelId, ListId, PlacementId, RuleId, UserId,
};
use kanflow_domain::mirror::{MirrorDirection, MirrorRule};

use crate::ports::{
    AuditLog, AutomationRuleRepository, BoardRepository, CardRepository, MirrorRuleRepository,
    PlacementRepository,
};

#[derive(Default)]
pub struct State {
    pub boards: Vec<Board>,
    pub lists: Vec<List>,
    pub labels: Vec<Label>,
    pub field_definitions: Vec<CustomFieldDefinition>,
    pub cards: HashMap<CardId, Card>,
    pub field_values: HashMap<(CardId, FieldDefinitionId), serde_json::Value>,
    pub card_labels: HashSet<(CardId, LabelId)>,
    pub assignees: HashSet<(CardId, UserId)>,
    pub placements: Vec<CardPlacement>,
    pub rules: Vec<AutomationRule>,
    pub mirror_rules: Vec<MirrorRule>,
    pub executions: Vec<ExecutionLogEntry>,
    pub activity: Vec<ActivityEntry>,
    /// Make every audit write fail.
    pub fail_audit: bool,
}

/// Shared in-memory store; clones see the same state.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

fn storage_failure() -> KanflowError {
    KanflowError::Storage("audit log unavailable".into())
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn board(&self, name: &str, lists: &[&str]) -> (Board, Vec<List>) {
        let board = Board::new(name, BoardType::General).unwrap();
        let lists: Vec<List> = lists
            .iter()
            .zip(0..)
            .map(|(list, position)| List::new(board.id, *list, position))
            .collect();
        let mut state = self.state();
        state.boards.push(board.clone());
        state.lists.extend(lists.iter().cloned());
        (board, lists)
    }

    pub fn label(&self, board_id: BoardId, name: &str) -> Label {
        let label = Label::new(board_id, name);
        self.state().labels.push(label.clone());
        label
    }

    pub fn number_field(&self, board_id: BoardId, name: &str) -> CustomFieldDefinition {
        let definition = CustomFieldDefinition::new(board_id, name, FieldType::Number);
        self.state().field_definitions.push(definition.clone());
        definition
    }

    /// A card with a primary placement in `list`.
    pub fn card_in(&self, list: &List, priority: Priority) -> (Card, CardPlacement) {
        let card = Card::builder()
            .board_id(list.board_id)
            .title("Card")
            .priority(priority)
            .build()
            .unwrap();
        let placement = CardPlacement::primary(card.id, list.id, 0);
        let mut state = self.state();
        state.cards.insert(card.id, card.clone());
        state.placements.push(placement.clone());
        (card, placement)
    }

    pub fn add_rule(&self, rule: AutomationRule) {
        self.state().rules.push(rule);
    }

    pub fn add_mirror_rule(&self, rule: MirrorRule) {
        self.state().mirror_rules.push(rule);
    }

    pub fn placements_in(&self, list_id: ListId) -> Vec<CardPlacement> {
        self.state()
            .placements
            .iter()
            .filter(|p| p.list_id == list_id)
            .cloned()
            .collect()
    }

    pub fn priority_of(&self, card_id: CardId) -> Priority {
        self.state().cards[&card_id].priority
    }

    pub fn field_value(&self, card_id: CardId, field: FieldDefinitionId) -> Option<serde_json::Value> {
        self.state().field_values.get(&(card_id, field)).cloned()
    }
}

impl AutomationRuleRepository for InMemoryStore {
    async fn create(&self, rule: AutomationRule) -> Result<AutomationRule, KanflowError> {
        self.state().rules.push(rule.clone());
        Ok(rule)
    }

    async fn list_for_board(&self, board_id: BoardId) -> Result<Vec<AutomationRule>, KanflowError> {
        let mut rules: Vec<AutomationRule> = self
            .state()
            .rules
            .iter()
            .filter(|r| r.board_id == board_id)
            .cloned()
            .collect();
        rules.sort_by_key(|r| r.execution_order);
        Ok(rules)
    }

    async fn list_active_for_board(
        &self,
        board_id: BoardId,
    ) -> Result<Vec<AutomationRule>, KanflowError> {
        let mut rules = AutomationRuleRepository::list_for_board(self, board_id).await?;
        rules.retain(|r| r.is_active);
        Ok(rules)
    }

    async fn delete(&self, id: RuleId) -> Result<bool, KanflowError> {
        let mut state = self.state();
        let before = state.rules.len();
        state.rules.retain(|r| r.id != id);
        Ok(state.rules.len() != before)
    }
}

impl MirrorRuleRepository for InMemoryStore {
    async fn create(&self, rule: MirrorRule) -> Result<MirrorRule, KanflowError> {
        self.state().mirror_rules.push(rule.clone());
        Ok(rule)
    }

    async fn find_by_source(
        &self,
        board_id: BoardId,
        list_name: &str,
    ) -> Result<Vec<MirrorRule>, KanflowError> {
        Ok(self
            .state()
            .mirror_rules
            .iter()
            .filter(|r| {
                r.is_active && r.source_board_id == board_id && r.source_list_name == list_name
            })
            .cloned()
            .collect())
    }

    async fn find_bidirectional_by_target(
        &self,
        board_id: BoardId,
        list_name: &str,
    ) -> Result<Vec<MirrorRule>, KanflowError> {
        Ok(self
            .state()
            .mirror_rules
            .iter()
            .filter(|r| {
                r.is_active
                    && r.direction == MirrorDirection::Bidirectional
                    && r.target_board_id == board_id
                    && r.target_list_name == list_name
            })
            .cloned()
            .collect())
    }

    async fn list_for_board(&self, board_id: BoardId) -> Result<Vec<MirrorRule>, KanflowError> {
        Ok(self
            .state()
            .mirror_rules
            .iter()
            .filter(|r| r.source_board_id == board_id || r.target_board_id == board_id)
            .cloned()
            .collect())
    }
}

impl BoardRepository for InMemoryStore {
    async fn create_board(&self, board: Board) -> Result<Board, KanflowError> {
        self.state().boards.push(board.clone());
        Ok(board)
    }

    async fn create_list(&self, list: List) -> Result<List, KanflowError> {
        self.state().lists.push(list.clone());
        Ok(list)
    }

    async fn create_label(&self, label: Label) -> Result<Label, KanflowError> {
        self.state().labels.push(label.clone());
        Ok(label)
    }

    async fn create_field_definition(
        &self,
        definition: CustomFieldDefinition,
    ) -> Result<CustomFieldDefinition, KanflowError> {
        self.state().field_definitions.push(definition.clone());
        Ok(definition)
    }

    async fn get_board(&self, id: BoardId) -> Result<Option<Board>, KanflowError> {
        Ok(self.state().boards.iter().find(|b| b.id == id).cloned())
    }

    async fn get_list(&self, id: ListId) -> Result<Option<List>, KanflowError> {
        Ok(self.state().lists.iter().find(|l| l.id == id).cloned())
    }

    async fn find_list_by_name(
        &self,
        board_id: BoardId,
        name: &str,
    ) -> Result<Option<List>, KanflowError> {
        Ok(self
            .state()
            .lists
            .iter()
            .find(|l| l.board_id == board_id && l.name == name)
            .cloned())
    }

    async fn find_label_by_name(
        &self,
        board_id: BoardId,
        name: &str,
    ) -> Result<Option<Label>, KanflowError> {
        Ok(self
            .state()
            .labels
            .iter()
            .find(|l| l.board_id == board_id && l.name == name)
            .cloned())
    }

    async fn find_field_definition(
        &self,
        board_id: BoardId,
        name: &str,
    ) -> Result<Option<CustomFieldDefinition>, KanflowError> {
        Ok(self
            .state()
            .field_definitions
            .iter()
            .find(|d| d.board_id == board_id && d.name == name)
            .cloned())
    }
}

impl CardRepository for InMemoryStore {
    async fn create_card(&self, card: Card) -> Result<Card, KanflowError> {
        self.state().cards.insert(card.id, card.clone());
        Ok(card)
    }

    async fn get_card(&self, id: CardId) -> Result<Option<Card>, KanflowError> {
        Ok(self.state().cards.get(&id).cloned())
    }

    async fn set_priority(&self, id: CardId, priority: Priority) -> Result<bool, KanflowError> {
        let mut state = self.state();
        let Some(card) = state.cards.get_mut(&id) else {
            return Ok(false);
        };
        card.priority = priority;
        Ok(true)
    }

    async fn get_field_value(
        &self,
        card_id: CardId,
        field_definition_id: FieldDefinitionId,
    ) -> Result<Option<serde_json::Value>, KanflowError> {
        Ok(self.field_value(card_id, field_definition_id))
    }

    async fn upsert_field_value(&self, value: CustomFieldValue) -> Result<(), KanflowError> {
        self.state()
            .field_values
            .insert((value.card_id, value.field_definition_id), value.value);
        Ok(())
    }

    async fn increment_field_value(
        &self,
        card_id: CardId,
        field_definition_id: FieldDefinitionId,
        by: &serde_json::Number,
    ) -> Result<serde_json::Value, KanflowError> {
        let mut state = self.state();
        let key = (card_id, field_definition_id);
        let next = add_numeric(state.field_values.get(&key), by);
        state.field_values.insert(key, next.clone());
        Ok(next)
    }

    async fn has_label(&self, card_id: CardId, label_id: LabelId) -> Result<bool, KanflowError> {
        Ok(self.state().card_labels.contains(&(card_id, label_id)))
    }

    async fn attach_label(&self, card_id: CardId, label_id: LabelId) -> Result<(), KanflowError> {
        self.state().card_labels.insert((card_id, label_id));
        Ok(())
    }

    async fn detach_label(&self, card_id: CardId, label_id: LabelId) -> Result<bool, KanflowError> {
        Ok(self.state().card_labels.remove(&(card_id, label_id)))
    }

    async fn is_assigned(&self, card_id: CardId, user_id: UserId) -> Result<bool, KanflowError> {
        Ok(self.state().assignees.contains(&(card_id, user_id)))
    }

    async fn assign_user(&self, card_id: CardId, user_id: UserId) -> Result<(), KanflowError> {
        self.state().assignees.insert((card_id, user_id));
        Ok(())
    }
}

impl PlacementRepository for InMemoryStore {
    async fn insert(&self, placement: CardPlacement) -> Result<CardPlacement, KanflowError> {
        self.state().placements.push(placement.clone());
        Ok(placement)
    }

    async fn get(&self, id: PlacementId) -> Result<Option<CardPlacement>, KanflowError> {
        Ok(self.state().placements.iter().find(|p| p.id == id).cloned())
    }

    async fn list_for_card(&self, card_id: CardId) -> Result<Vec<CardPlacement>, KanflowError> {
        Ok(self
            .state()
            .placements
            .iter()
            .filter(|p| p.card_id == card_id)
            .cloned()
            .collect())
    }

    async fn find_primary(
        &self,
        card_id: CardId,
        board_id: BoardId,
    ) -> Result<Option<CardPlacement>, KanflowError> {
        let state = self.state();
        Ok(state
            .placements
            .iter()
            .find(|p| {
                p.card_id == card_id
                    && !p.is_mirror
                    && state
                        .lists
                        .iter()
                        .any(|l| l.id == p.list_id && l.board_id == board_id)
            })
            .cloned())
    }

    async fn move_to_list(&self, id: PlacementId, list_id: ListId) -> Result<bool, KanflowError> {
        let mut state = self.state();
        let Some(placement) = state.placements.iter_mut().find(|p| p.id == id) else {
            return Ok(false);
        };
        placement.list_id = list_id;
        Ok(true)
    }

    async fn find_mirror(
        &self,
        card_id: CardId,
        list_id: ListId,
    ) -> Result<Option<CardPlacement>, KanflowError> {
        Ok(self
            .state()
            .placements
            .iter()
            .find(|p| p.card_id == card_id && p.list_id == list_id && p.is_mirror)
            .cloned())
    }

    async fn insert_mirror(
        &self,
        mut placement: CardPlacement,
    ) -> Result<Option<CardPlacement>, KanflowError> {
        let mut state = self.state();
        let (card_id, list_id) = (placement.card_id, placement.list_id);
        if state
            .placements
            .iter()
            .any(|p| p.card_id == card_id && p.list_id == list_id && p.is_mirror)
        {
            return Ok(None);
        }
        placement.position = state
            .placements
            .iter()
            .filter(|p| p.list_id == list_id)
            .map(|p| p.position)
            .max()
            .map_or(0, |max| max + 1);
        state.placements.push(placement.clone());
        Ok(Some(placement))
    }

    async fn delete(&self, id: PlacementId) -> Result<bool, KanflowError> {
        let mut state = self.state();
        let before = state.placements.len();
        state.placements.retain(|p| p.id != id);
        Ok(state.placements.len() != before)
    }

    async fn delete_mirrors(
        &self,
        card_id: CardId,
        list_id: ListId,
    ) -> Result<Vec<CardPlacement>, KanflowError> {
        let mut state = self.state();
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut state.placements)
            .into_iter()
            .partition(|p| p.card_id == card_id && p.list_id == list_id && p.is_mirror);
        state.placements = kept;
        Ok(removed)
    }
}

impl AuditLog for InMemoryStore {
    async fn append_execution(&self, entry: ExecutionLogEntry) -> Result<(), KanflowError> {
        let mut state = self.state();
        if state.fail_audit {
            return Err(storage_failure());
        }
        state.executions.push(entry);
        Ok(())
    }

    async fn append_activity(&self, entry: ActivityEntry) -> Result<(), KanflowError> {
        let mut state = self.state();
        if state.fail_audit {
            return Err(storage_failure());
        }
        state.activity.push(entry);
        Ok(())
    }

    async fn recent_executions(
        &self,
        board_id: BoardId,
        limit: u32,
    ) -> Result<Vec<ExecutionLogEntry>, KanflowError> {
        Ok(self
            .state()
            .executions
            .iter()
            .rev()
            .filter(|e| e.board_id == board_id)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn activity_for_card(
        &self,
        card_id: CardId,
        limit: u32,
    ) -> Result<Vec<ActivityEntry>, KanflowError> {
        Ok(self
            .state()
            .activity
            .iter()
            .rev()
            .filter(|e| e.card_id == card_id)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}
