//! Board repository port — boards and the objects rules refer to by name.

use std::future::Future;

use kanflow_domain::board::{Board, CustomFieldDefinition, Label, List};
use kanflow_domain::error::KanflowError;
use kanflow_domain::id::{BoardId, ListId};

/// Repository for boards, lists, labels and custom field definitions.
///
/// Name lookups are exact and board-scoped.
pub trait BoardRepository {
    fn create_board(&self, board: Board)
    -> impl Future<Output = Result<Board, KanflowError>> + Send;

    fn create_list(&self, list: List) -> impl Future<Output = Result<List, KanflowError>> + Send;

    fn create_label(&self, label: Label)
    -> impl Future<Output = Result<Label, KanflowError>> + Send;

    fn create_field_definition(
        &self,
        definition: CustomFieldDefinition,
    ) -> impl Future<Output = Result<CustomFieldDefinition, KanflowError>> + Send;

    fn get_board(
        &self,
        id: BoardId,
    ) -> impl Future<Output = Result<Option<Board>, KanflowError>> + Send;

    fn get_list(&self, id: ListId)
    -> impl Future<Output = Result<Option<List>, KanflowError>> + Send;

    fn find_list_by_name(
        &self,
        board_id: BoardId,
        name: &str,
    ) -> impl Future<Output = Result<Option<List>, KanflowError>> + Send;

    fn find_label_by_name(
        &self,
        board_id: BoardId,
        name: &str,
    ) -> impl Future<Output = Result<Option<Label>, KanflowError>> + Send;

    fn find_field_definition(
        &self,
        board_id: BoardId,
        name: &str,
    ) -> impl Future<Output = Result<Option<CustomFieldDefinition>, KanflowError>> + Send;
}
