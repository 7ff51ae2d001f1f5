//! Performs the side effect of a single matched rule.
//!
//! Every action resolves names (lists, labels, field definitions) on the
//! rule's board at execution time. A name that does not resolve fails the
//! action with a [`ConfigurationError`]; nothing is silently skipped.

use serde_json::{Value, json};

use kanflow_domain::audit::ActivityEntry;
use kanflow_domain::automation::{Action, AutomationRule};
use kanflow_domain::board::{CustomFieldDefinition, CustomFieldValue, Label, List};
use kanflow_domain::card::{Card, CardPlacement, ListChange};
use kanflow_domain::error::{ConfigurationError, KanflowError, NotFoundError};
use kanflow_domain::id::{BoardId, CardId, UserId};

use crate::ports::{AuditLog, BoardRepository, CardRepository, PlacementRepository};

/// Who and what a rule is being executed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleContext {
    pub board_id: BoardId,
    pub card_id: CardId,
    pub user_id: Option<UserId>,
}

/// Result of one successful action.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    /// Action-specific summary, stored in the execution log.
    pub result: Value,
    /// Set when the action moved the card to another list.
    pub list_change: Option<ListChange>,
}

impl ActionOutcome {
    fn result(result: Value) -> Self {
        Self {
            result,
            list_change: None,
        }
    }
}

/// Executes typed [`Action`]s against the storage ports.
pub struct ActionExecutor<BR, CR, PR, AL> {
    boards: BR,
    cards: CR,
    placements: PR,
    audit: AL,
}

impl<BR, CR, PR, AL> ActionExecutor<BR, CR, PR, AL>
where
    BR: BoardRepository + Sync,
    CR: CardRepository + Sync,
    PR: PlacementRepository + Sync,
    AL: AuditLog + Sync,
{
    pub fn new(boards: BR, cards: CR, placements: PR, audit: AL) -> Self {
        Self {
            boards,
            cards,
            placements,
            audit,
        }
    }

    pub(crate) fn audit(&self) -> &AL {
        &self.audit
    }

    /// Execute the action of `rule` for the card in `ctx`.
    ///
    /// # Errors
    ///
    /// Returns [`KanflowError::Validation`] when the action config is
    /// malformed, [`KanflowError::Configuration`] when a referenced list,
    /// label or field does not exist on the board, [`KanflowError::NotFound`]
    /// when the card has vanished, or a storage error.
    pub async fn execute(
        &self,
        ctx: &RuleContext,
        rule: &AutomationRule,
    ) -> Result<ActionOutcome, KanflowError> {
        match rule.action()? {
            Action::SetField { field_name, value } => {
                let definition = self.field_definition(ctx.board_id, &field_name).await?;
                self.cards
                    .upsert_field_value(CustomFieldValue {
                        card_id: ctx.card_id,
                        field_definition_id: definition.id,
                        value: value.clone(),
                    })
                    .await?;
                Ok(ActionOutcome::result(
                    json!({"field_name": field_name, "value": value}),
                ))
            }
            Action::IncrementField {
                field_name,
                increment_by,
            } => {
                let definition = self.field_definition(ctx.board_id, &field_name).await?;
                let value = self
                    .cards
                    .increment_field_value(ctx.card_id, definition.id, &increment_by)
                    .await?;
                Ok(ActionOutcome::result(
                    json!({"field_name": field_name, "value": value}),
                ))
            }
            Action::SetPriority { priority } => {
                if !self.cards.set_priority(ctx.card_id, priority).await? {
                    return Err(card_not_found(ctx.card_id));
                }
                Ok(ActionOutcome::result(json!({"priority": priority})))
            }
            Action::AddLabel { label_name } => {
                let label = self.label(ctx.board_id, &label_name).await?;
                let added = !self.cards.has_label(ctx.card_id, label.id).await?;
                if added {
                    self.cards.attach_label(ctx.card_id, label.id).await?;
                }
                Ok(ActionOutcome::result(
                    json!({"label_name": label_name, "added": added}),
                ))
            }
            Action::RemoveLabel { label_name } => {
                let label = self.label(ctx.board_id, &label_name).await?;
                let removed = self.cards.detach_label(ctx.card_id, label.id).await?;
                Ok(ActionOutcome::result(
                    json!({"label_name": label_name, "removed": removed}),
                ))
            }
            Action::CreateActivityLog { message, metadata } => {
                let entry = ActivityEntry::new(
                    ctx.board_id,
                    ctx.card_id,
                    ctx.user_id,
                    "automation",
                    json!({
                        "rule_id": rule.id,
                        "rule_name": rule.name,
                        "message": message,
                        "metadata": metadata,
                    }),
                );
                let activity_id = entry.id;
                self.audit.append_activity(entry).await?;
                Ok(ActionOutcome::result(json!({"activity_id": activity_id})))
            }
            Action::MoveCard { list_name } => self.move_card(ctx, &list_name).await,
            Action::CreateCard {
                list_name,
                title,
                description,
                priority,
            } => {
                let list = self.list(ctx.board_id, &list_name).await?;
                let mut builder = Card::builder().board_id(ctx.board_id).title(title);
                if let Some(description) = description {
                    builder = builder.description(description);
                }
                if let Some(priority) = priority {
                    builder = builder.priority(priority);
                }
                if let Some(user_id) = ctx.user_id {
                    builder = builder.created_by(user_id);
                }
                let card = self.cards.create_card(builder.build()?).await?;
                let placement = self
                    .placements
                    .insert(CardPlacement::primary(card.id, list.id, 0))
                    .await?;
                Ok(ActionOutcome::result(json!({
                    "card_id": card.id,
                    "list_id": list.id,
                    "placement_id": placement.id,
                })))
            }
            Action::AssignUser { user_id } => {
                let assigned = !self.cards.is_assigned(ctx.card_id, user_id).await?;
                if assigned {
                    self.cards.assign_user(ctx.card_id, user_id).await?;
                }
                Ok(ActionOutcome::result(
                    json!({"user_id": user_id, "assigned": assigned}),
                ))
            }
            Action::SendNotification { message, recipient } => {
                tracing::info!(
                    card_id = %ctx.card_id,
                    rule_id = %rule.id,
                    recipient = recipient.as_deref().unwrap_or("<none>"),
                    message = message.as_deref().unwrap_or(""),
                    "notification requested"
                );
                Ok(ActionOutcome::result(json!({"delivered": false})))
            }
        }
    }

    async fn move_card(
        &self,
        ctx: &RuleContext,
        list_name: &str,
    ) -> Result<ActionOutcome, KanflowError> {
        let target = self.list(ctx.board_id, list_name).await?;
        let placement = self
            .placements
            .find_primary(ctx.card_id, ctx.board_id)
            .await?
            .ok_or_else(|| NotFoundError {
                entity: "Placement",
                id: ctx.card_id.to_string(),
            })?;
        let from = self.boards.get_list(placement.list_id).await?;
        self.placements.move_to_list(placement.id, target.id).await?;

        let list_change = ListChange {
            card_id: ctx.card_id,
            board_id: ctx.board_id,
            from_list_name: from.map(|list| list.name),
            to_list_name: target.name,
            user_id: ctx.user_id,
            source_placement_id: Some(placement.id),
        };
        Ok(ActionOutcome {
            result: json!({
                "from_list_name": list_change.from_list_name,
                "to_list_name": list_change.to_list_name,
            }),
            list_change: (!list_change.is_noop()).then_some(list_change),
        })
    }

    async fn list(&self, board_id: BoardId, name: &str) -> Result<List, KanflowError> {
        self.boards
            .find_list_by_name(board_id, name)
            .await?
            .ok_or_else(|| {
                ConfigurationError::ListNotFound {
                    board_id: board_id.to_string(),
                    name: name.to_string(),
                }
                .into()
            })
    }

    async fn label(&self, board_id: BoardId, name: &str) -> Result<Label, KanflowError> {
        self.boards
            .find_label_by_name(board_id, name)
            .await?
            .ok_or_else(|| {
                ConfigurationError::LabelNotFound {
                    board_id: board_id.to_string(),
                    name: name.to_string(),
                }
                .into()
            })
    }

    async fn field_definition(
        &self,
        board_id: BoardId,
        name: &str,
    ) -> Result<CustomFieldDefinition, KanflowError> {
        self.boards
            .find_field_definition(board_id, name)
            .await?
            .ok_or_else(|| {
                ConfigurationError::FieldDefinitionNotFound {
                    board_id: board_id.to_string(),
                    name: name.to_string(),
                }
                .into()
            })
    }
}

fn card_not_found(card_id: CardId) -> KanflowError {
    NotFoundError {
        entity: "Card",
        id: card_id.to_string(),
    }
    .into()
}
