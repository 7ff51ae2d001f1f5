//! Rule service — use-cases for managing automation and mirror rules.

use kanflow_domain::automation::AutomationRule;
use kanflow_domain::board::BoardType;
use kanflow_domain::error::{KanflowError, NotFoundError};
use kanflow_domain::id::{BoardId, RuleId};
use kanflow_domain::mirror::MirrorRule;
use kanflow_domain::templates::default_automation_rules;

use crate::ports::{AutomationRuleRepository, MirrorRuleRepository};

/// Application service for rule configuration.
pub struct RuleService<AR, MR> {
    rules: AR,
    mirrors: MR,
}

impl<AR, MR> RuleService<AR, MR>
where
    AR: AutomationRuleRepository,
    MR: MirrorRuleRepository,
{
    /// Create a new service backed by the given repositories.
    pub fn new(rules: AR, mirrors: MR) -> Self {
        Self { rules, mirrors }
    }

    /// Create a rule after validating its name and action config.
    ///
    /// # Errors
    ///
    /// Returns [`KanflowError::Validation`] if the name is blank or the action
    /// config is missing a required key, or a storage error.
    #[tracing::instrument(skip(self, rule), fields(rule_name = %rule.name, board_id = %rule.board_id))]
    pub async fn create_rule(&self, rule: AutomationRule) -> Result<AutomationRule, KanflowError> {
        rule.validate()?;
        self.rules.create(rule).await
    }

    /// List every rule of a board in execution order.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_rules(&self, board_id: BoardId) -> Result<Vec<AutomationRule>, KanflowError> {
        self.rules.list_for_board(board_id).await
    }

    /// Delete a rule by id.
    ///
    /// # Errors
    ///
    /// Returns [`KanflowError::NotFound`] when no rule has this id, or a
    /// storage error.
    #[tracing::instrument(skip(self))]
    pub async fn delete_rule(&self, id: RuleId) -> Result<(), KanflowError> {
        if self.rules.delete(id).await? {
            Ok(())
        } else {
            Err(NotFoundError {
                entity: "AutomationRule",
                id: id.to_string(),
            }
            .into())
        }
    }

    /// Install the default rule set for a freshly created board.
    ///
    /// # Errors
    ///
    /// Returns a storage error; rules created before the failure are kept.
    #[tracing::instrument(skip(self))]
    pub async fn install_default_rules(
        &self,
        board_id: BoardId,
        board_type: BoardType,
    ) -> Result<Vec<AutomationRule>, KanflowError> {
        let mut installed = Vec::new();
        for template in default_automation_rules(board_type) {
            installed.push(self.rules.create(template.into_rule(board_id)).await?);
        }
        tracing::info!(count = installed.len(), "default rules installed");
        Ok(installed)
    }

    /// Create a mirror rule after validating its list names.
    ///
    /// # Errors
    ///
    /// Returns [`KanflowError::Validation`] if a list name is blank, or a
    /// storage error.
    #[tracing::instrument(skip(self, rule), fields(source = %rule.source_list_name, target = %rule.target_list_name))]
    pub async fn create_mirror_rule(&self, rule: MirrorRule) -> Result<MirrorRule, KanflowError> {
        rule.validate()?;
        self.mirrors.create(rule).await
    }

    /// List the mirror rules touching a board on either side.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_mirror_rules(&self, board_id: BoardId) -> Result<Vec<MirrorRule>, KanflowError> {
        self.mirrors.list_for_board(board_id).await
    }
}
