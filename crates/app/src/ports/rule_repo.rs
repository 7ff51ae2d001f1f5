//! Rule repository ports — persistence for automation and mirror rules.

use std::future::Future;

use kanflow_domain::automation::AutomationRule;
use kanflow_domain::error::KanflowError;
use kanflow_domain::id::{BoardId, RuleId};
use kanflow_domain::mirror::MirrorRule;

/// Repository for persisting and querying [`AutomationRule`]s.
pub trait AutomationRuleRepository {
    /// Create a new rule in storage.
    fn create(
        &self,
        rule: AutomationRule,
    ) -> impl Future<Output = Result<AutomationRule, KanflowError>> + Send;

    /// All rules of a board, active or not, by ascending `execution_order`.
    fn list_for_board(
        &self,
        board_id: BoardId,
    ) -> impl Future<Output = Result<Vec<AutomationRule>, KanflowError>> + Send;

    /// Active rules of a board by ascending `execution_order`.
    fn list_active_for_board(
        &self,
        board_id: BoardId,
    ) -> impl Future<Output = Result<Vec<AutomationRule>, KanflowError>> + Send;

    /// Delete a rule. Returns `false` when no rule had this id.
    fn delete(&self, id: RuleId) -> impl Future<Output = Result<bool, KanflowError>> + Send;
}

/// Repository for persisting and querying [`MirrorRule`]s.
pub trait MirrorRuleRepository {
    /// Create a new mirror rule in storage.
    fn create(
        &self,
        rule: MirrorRule,
    ) -> impl Future<Output = Result<MirrorRule, KanflowError>> + Send;

    /// Active rules whose source side is `(board_id, list_name)`.
    fn find_by_source(
        &self,
        board_id: BoardId,
        list_name: &str,
    ) -> impl Future<Output = Result<Vec<MirrorRule>, KanflowError>> + Send;

    /// Active bidirectional rules whose target side is `(board_id, list_name)`.
    fn find_bidirectional_by_target(
        &self,
        board_id: BoardId,
        list_name: &str,
    ) -> impl Future<Output = Result<Vec<MirrorRule>, KanflowError>> + Send;

    /// All mirror rules touching a board on either side.
    fn list_for_board(
        &self,
        board_id: BoardId,
    ) -> impl Future<Output = Result<Vec<MirrorRule>, KanflowError>> + Send;
}
