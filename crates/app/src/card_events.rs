//! Glue between rule evaluation and mirroring.
//!
//! Two kinds of events reach the engine:
//! - a [`TriggerEvent`] for a card, which runs the board's automation rules;
//! - a [`ListChange`], which removes mirrors for the list the card left and
//!   creates mirrors for the list it entered.
//!
//! A `move_card` action produces a [`ListChange`] that is fed back into the
//! mirror path here. It never re-enters rule evaluation, so rules cannot
//! loop on each other.

use std::future::Future;

use serde_json::{Value, json};

use kanflow_domain::automation::TriggerEvent;
use kanflow_domain::card::{CardPlacement, ListChange};
use kanflow_domain::error::KanflowError;
use kanflow_domain::id::CardId;

use crate::action_executor::RuleContext;
use crate::automation_engine::{AutomationEngine, EvaluationReport};
use crate::mirror_sync::{MirrorOutcome, MirrorSynchronizer};
use crate::ports::{
    AuditLog, AutomationRuleRepository, BoardRepository, CardRepository, MirrorRuleRepository,
    PlacementRepository,
};

/// Work item accepted by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum CardEvent {
    Trigger {
        context: RuleContext,
        event: TriggerEvent,
    },
    ListChanged(ListChange),
}

impl CardEvent {
    #[must_use]
    pub fn card_id(&self) -> CardId {
        match self {
            Self::Trigger { context, .. } => context.card_id,
            Self::ListChanged(change) => change.card_id,
        }
    }

    /// Short name of the event kind, e.g. `card_moved` or `list_changed`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Trigger { event, .. } => event.trigger_type.as_str(),
            Self::ListChanged(_) => "list_changed",
        }
    }

    /// The list, label or field the event is about, when it names one.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Trigger { event, .. } => {
                let data = &event.data;
                data.to_list_name
                    .as_deref()
                    .or(data.list_name.as_deref())
                    .or(data.label_name.as_deref())
                    .or(data.field_name.as_deref())
            }
            Self::ListChanged(change) => Some(&change.to_list_name),
        }
    }

    /// Canonical JSON of the whole event payload.
    ///
    /// Two events share a fingerprint only when every field matches, so a
    /// move into "Blocked" and a move into "Open" never collide.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let value = match self {
            Self::Trigger { context, event } => json!({
                "board_id": context.board_id,
                "user_id": context.user_id,
                "event": event.snapshot(),
            }),
            Self::ListChanged(change) => serde_json::to_value(change).unwrap_or(Value::Null),
        };
        value.to_string()
    }
}

/// Something that can process [`CardEvent`]s one at a time.
pub trait CardEventProcessor {
    fn process(&self, event: CardEvent) -> impl Future<Output = Result<(), KanflowError>> + Send;
}

/// Mirror work done for one list change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListChangeReport {
    pub removed: Vec<CardPlacement>,
    pub mirrors: Vec<MirrorOutcome>,
}

/// Routes card events to the automation engine and the mirror synchronizer.
pub struct CardEventHandler<RR, MR, BR, CR, PR, AL> {
    engine: AutomationEngine<RR, BR, CR, PR, AL>,
    mirrors: MirrorSynchronizer<MR, BR, CR, PR, AL>,
}

impl<RR, MR, BR, CR, PR, AL> CardEventHandler<RR, MR, BR, CR, PR, AL>
where
    RR: AutomationRuleRepository + Sync,
    MR: MirrorRuleRepository + Sync,
    BR: BoardRepository + Sync,
    CR: CardRepository + Sync,
    PR: PlacementRepository + Sync,
    AL: AuditLog + Sync,
{
    pub fn new(
        engine: AutomationEngine<RR, BR, CR, PR, AL>,
        mirrors: MirrorSynchronizer<MR, BR, CR, PR, AL>,
    ) -> Self {
        Self { engine, mirrors }
    }

    /// Evaluate rules, then run the mirror path for every card they moved.
    ///
    /// # Errors
    ///
    /// Returns a storage error if loading the board's rules fails.
    pub async fn on_trigger(
        &self,
        ctx: &RuleContext,
        event: &TriggerEvent,
    ) -> Result<EvaluationReport, KanflowError> {
        let report = self.engine.evaluate_rules(ctx, event).await?;
        for change in &report.list_changes {
            if let Err(err) = self.on_card_list_changed(change).await {
                tracing::error!(card_id = %change.card_id, error = %err, "mirror sync after move failed");
            }
        }
        Ok(report)
    }

    /// Remove mirrors for the list the card left, then mirror into the new one.
    ///
    /// Moving a card to the list it is already in does nothing.
    ///
    /// # Errors
    ///
    /// Returns a storage error if loading mirror rules fails, or
    /// [`KanflowError::NotFound`] when rules apply but the card is gone.
    pub async fn on_card_list_changed(
        &self,
        change: &ListChange,
    ) -> Result<ListChangeReport, KanflowError> {
        if change.is_noop() {
            return Ok(ListChangeReport::default());
        }
        let removed = match &change.from_list_name {
            Some(from) => {
                self.mirrors
                    .cleanup_mirror_placements(change.card_id, change.board_id, from)
                    .await?
            }
            None => Vec::new(),
        };
        let mirrors = self
            .mirrors
            .evaluate_mirror_rules(
                change.card_id,
                change.board_id,
                &change.to_list_name,
                change.user_id,
                change.source_placement_id,
            )
            .await?;
        Ok(ListChangeReport { removed, mirrors })
    }
}

impl<RR, MR, BR, CR, PR, AL> CardEventProcessor for CardEventHandler<RR, MR, BR, CR, PR, AL>
where
    RR: AutomationRuleRepository + Sync,
    MR: MirrorRuleRepository + Sync,
    BR: BoardRepository + Sync,
    CR: CardRepository + Sync,
    PR: PlacementRepository + Sync,
    AL: AuditLog + Sync,
{
    async fn process(&self, event: CardEvent) -> Result<(), KanflowError> {
        match event {
            CardEvent::Trigger { context, event } => {
                let report = self.on_trigger(&context, &event).await?;
                tracing::debug!(
                    card_id = %context.card_id,
                    matched = report.executions.len(),
                    succeeded = report.succeeded(),
                    "card event processed"
                );
            }
            CardEvent::ListChanged(change) => {
                let report = self.on_card_list_changed(&change).await?;
                tracing::debug!(
                    card_id = %change.card_id,
                    removed = report.removed.len(),
                    mirrors = report.mirrors.len(),
                    "list change processed"
                );
            }
        }
        Ok(())
    }
}
