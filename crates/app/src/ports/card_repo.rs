//! Card repository port: card rows and their label, assignee and field links.

use std::future::Future;

use kanflow_domain::board::CustomFieldValue;
use kanflow_domain::card::{Card, Priority};
use kanflow_domain::error::KanflowError;
use kanflow_domain::id::{CardId, FieldDefinitionId, LabelId, UserId};

/// Repository for cards and their attached data.
pub trait CardRepository {
    fn create_card(&self, card: Card) -> impl Future<Output = Result<Card, KanflowError>> + Send;

    fn get_card(&self, id: CardId)
    -> impl Future<Output = Result<Option<Card>, KanflowError>> + Send;

    /// Returns `false` when the card does not exist.
    fn set_priority(
        &self,
        id: CardId,
        priority: Priority,
    ) -> impl Future<Output = Result<bool, KanflowError>> + Send;

    fn get_field_value(
        &self,
        card_id: CardId,
        field_definition_id: FieldDefinitionId,
    ) -> impl Future<Output = Result<Option<serde_json::Value>, KanflowError>> + Send;

    /// Insert or replace the value for `(card, field definition)`.
    fn upsert_field_value(
        &self,
        value: CustomFieldValue,
    ) -> impl Future<Output = Result<(), KanflowError>> + Send;

    /// Atomically add `by` to a numeric field value and return the new value.
    ///
    /// A missing or non-numeric current value counts as 0. Concurrent calls
    /// must never lose an increment.
    fn increment_field_value(
        &self,
        card_id: CardId,
        field_definition_id: FieldDefinitionId,
        by: &serde_json::Number,
    ) -> impl Future<Output = Result<serde_json::Value, KanflowError>> + Send;

    fn has_label(
        &self,
        card_id: CardId,
        label_id: LabelId,
    ) -> impl Future<Output = Result<bool, KanflowError>> + Send;

    fn attach_label(
        &self,
        card_id: CardId,
        label_id: LabelId,
    ) -> impl Future<Output = Result<(), KanflowError>> + Send;

    /// Returns `false` when the label was not attached.
    fn detach_label(
        &self,
        card_id: CardId,
        label_id: LabelId,
    ) -> impl Future<Output = Result<bool, KanflowError>> + Send;

    fn is_assigned(
        &self,
        card_id: CardId,
        user_id: UserId,
    ) -> impl Future<Output = Result<bool, KanflowError>> + Send;

    fn assign_user(
        &self,
        card_id: CardId,
        user_id: UserId,
    ) -> impl Future<Output = Result<(), KanflowError>> + Send;
}
