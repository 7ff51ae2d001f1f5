//! Automation engine — evaluates a board's rules against one card event.
//!
//! Active rules are loaded once per event and run sequentially in ascending
//! `execution_order`, so a later rule observes the effects of earlier ones.
//! A failing rule is logged and skipped; it never prevents later rules from
//! running.

use kanflow_domain::audit::{ExecutionLogEntry, ExecutionStatus};
use kanflow_domain::automation::{TriggerEvent, matches_trigger};
use kanflow_domain::card::ListChange;
use kanflow_domain::error::KanflowError;
use kanflow_domain::id::RuleId;

use crate::action_executor::{ActionExecutor, RuleContext};
use crate::ports::{
    AuditLog, AutomationRuleRepository, BoardRepository, CardRepository, PlacementRepository,
};

/// Outcome of one matched rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleExecution {
    pub rule_id: RuleId,
    pub status: ExecutionStatus,
    pub error_message: Option<String>,
}

/// Everything that happened while evaluating one event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationReport {
    /// One entry per matched rule, in execution order.
    pub executions: Vec<RuleExecution>,
    /// List moves performed by `move_card` actions.
    pub list_changes: Vec<ListChange>,
}

impl EvaluationReport {
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.executions
            .iter()
            .filter(|e| e.status == ExecutionStatus::Success)
            .count()
    }
}

/// Rule evaluation and execution for card events.
pub struct AutomationEngine<RR, BR, CR, PR, AL> {
    rules: RR,
    executor: ActionExecutor<BR, CR, PR, AL>,
}

impl<RR, BR, CR, PR, AL> AutomationEngine<RR, BR, CR, PR, AL>
where
    RR: AutomationRuleRepository + Sync,
    BR: BoardRepository + Sync,
    CR: CardRepository + Sync,
    PR: PlacementRepository + Sync,
    AL: AuditLog + Sync,
{
    /// Create a new engine.
    pub fn new(rules: RR, executor: ActionExecutor<BR, CR, PR, AL>) -> Self {
        Self { rules, executor }
    }

    /// Run every active rule of the board whose trigger matches `event`.
    ///
    /// Each matched rule produces exactly one execution log entry. Failing
    /// to write that entry is reported through `tracing` and does not abort
    /// the evaluation.
    ///
    /// # Errors
    ///
    /// Returns a storage error only if loading the board's rules fails.
    #[tracing::instrument(
        skip(self, ctx, event),
        fields(board_id = %ctx.board_id, card_id = %ctx.card_id, trigger = %event.trigger_type)
    )]
    pub async fn evaluate_rules(
        &self,
        ctx: &RuleContext,
        event: &TriggerEvent,
    ) -> Result<EvaluationReport, KanflowError> {
        let mut rules = self.rules.list_active_for_board(ctx.board_id).await?;
        rules.sort_by_key(|rule| rule.execution_order);

        let trigger_data = event.snapshot();
        let mut report = EvaluationReport::default();

        for rule in rules.iter().filter(|rule| matches_trigger(rule, event)) {
            let (entry, execution) = match self.executor.execute(ctx, rule).await {
                Ok(outcome) => {
                    tracing::debug!(rule_id = %rule.id, rule_name = %rule.name, "rule executed");
                    report.list_changes.extend(outcome.list_change);
                    (
                        ExecutionLogEntry::success(
                            rule.id,
                            ctx.board_id,
                            ctx.card_id,
                            trigger_data.clone(),
                            outcome.result,
                        ),
                        RuleExecution {
                            rule_id: rule.id,
                            status: ExecutionStatus::Success,
                            error_message: None,
                        },
                    )
                }
                Err(err) => {
                    let message = err.to_string();
                    tracing::warn!(
                        rule_id = %rule.id,
                        rule_name = %rule.name,
                        error = %message,
                        "automation rule failed"
                    );
                    (
                        ExecutionLogEntry::error(
                            rule.id,
                            ctx.board_id,
                            ctx.card_id,
                            trigger_data.clone(),
                            message.clone(),
                        ),
                        RuleExecution {
                            rule_id: rule.id,
                            status: ExecutionStatus::Error,
                            error_message: Some(message),
                        },
                    )
                }
            };

            if let Err(err) = self.executor.audit().append_execution(entry).await {
                tracing::error!(rule_id = %rule.id, error = %err, "failed to write execution log");
            }
            report.executions.push(execution);
        }

        Ok(report)
    }
}
