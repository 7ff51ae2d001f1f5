//! `SQLite` implementation of [`AutomationRuleRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use kanflow_app::ports::AutomationRuleRepository;
use kanflow_domain::automation::AutomationRule;
use kanflow_domain::error::KanflowError;
use kanflow_domain::id::{BoardId, RuleId};

use crate::codec::{decode_json, decode_str};
use crate::error::StorageError;

/// Wrapper for converting database rows into domain types without polluting
/// domain structs with database concerns.
struct Wrapper(AutomationRule);

impl Wrapper {
    fn many(values: Vec<Self>) -> Vec<AutomationRule> {
        values.into_iter().map(|w| w.0).collect()
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let trigger_type: String = row.try_get("trigger_type")?;
        let trigger_config: String = row.try_get("trigger_config")?;
        let action_type: String = row.try_get("action_type")?;
        let action_config: String = row.try_get("action_config")?;

        Ok(Self(AutomationRule {
            id: RuleId::from_uuid(row.try_get("id")?),
            board_id: BoardId::from_uuid(row.try_get("board_id")?),
            name: row.try_get("name")?,
            trigger_type: decode_str(&trigger_type)?,
            trigger_config: decode_json(&trigger_config)?,
            action_type: decode_str(&action_type)?,
            action_config: decode_json(&action_config)?,
            execution_order: row.try_get("execution_order")?,
            is_active: row.try_get("is_active")?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO automation_rules
        (id, board_id, name, trigger_type, trigger_config, action_type, action_config,
         execution_order, is_active)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
";

// rowid breaks ties so rules sharing an order run in creation order.
const SELECT_BY_BOARD: &str =
    "SELECT * FROM automation_rules WHERE board_id = ? ORDER BY execution_order, rowid";
const SELECT_ACTIVE_BY_BOARD: &str = r"
    SELECT * FROM automation_rules
    WHERE board_id = ? AND is_active = 1
    ORDER BY execution_order, rowid
";
const DELETE: &str = "DELETE FROM automation_rules WHERE id = ?";

/// `SQLite`-backed automation rule repository.
#[derive(Clone)]
pub struct SqliteAutomationRuleRepository {
    pool: SqlitePool,
}

impl SqliteAutomationRuleRepository {
    /// Create a new repository backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch_by_board(
        &self,
        sql: &'static str,
        board_id: BoardId,
    ) -> Result<Vec<AutomationRule>, KanflowError> {
        let rows: Vec<Wrapper> = sqlx::query_as(sql)
            .bind(board_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::many(rows))
    }
}

impl AutomationRuleRepository for SqliteAutomationRuleRepository {
    async fn create(&self, rule: AutomationRule) -> Result<AutomationRule, KanflowError> {
        let trigger_config = serde_json::to_string(&rule.trigger_config).map_err(StorageError::from)?;
        let action_config = serde_json::to_string(&rule.action_config).map_err(StorageError::from)?;

        sqlx::query(INSERT)
            .bind(rule.id.as_uuid())
            .bind(rule.board_id.as_uuid())
            .bind(&rule.name)
            .bind(rule.trigger_type.as_str())
            .bind(trigger_config)
            .bind(rule.action_type.as_str())
            .bind(action_config)
            .bind(rule.execution_order)
            .bind(rule.is_active)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rule)
    }

    async fn list_for_board(&self, board_id: BoardId) -> Result<Vec<AutomationRule>, KanflowError> {
        self.fetch_by_board(SELECT_BY_BOARD, board_id).await
    }

    async fn list_active_for_board(
        &self,
        board_id: BoardId,
    ) -> Result<Vec<AutomationRule>, KanflowError> {
        self.fetch_by_board(SELECT_ACTIVE_BY_BOARD, board_id).await
    }

    async fn delete(&self, id: RuleId) -> Result<bool, KanflowError> {
        let result = sqlx::query(DELETE)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanflow_domain::automation::{ActionType, TriggerConfig, TriggerType};
    use serde_json::json;

    use crate::test_support::{Seed, memory_pool};

    fn rule(board_id: BoardId, name: &str, order: i32) -> AutomationRule {
        AutomationRule::builder()
            .board_id(board_id)
            .name(name)
            .trigger(
                TriggerType::CardMoved,
                TriggerConfig {
                    to_list_name: Some("Revisions".to_string()),
                    ..TriggerConfig::default()
                },
            )
            .action_json(
                ActionType::IncrementField,
                json!({"field_name": "Revision Count", "increment_by": 1}),
            )
            .execution_order(order)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn should_roundtrip_rule_configs() {
        let pool = memory_pool().await;
        let seed = Seed::design_board(&pool).await;
        let repo = SqliteAutomationRuleRepository::new(pool);
        let created = repo.create(rule(seed.board.id, "Count revisions", 0)).await.unwrap();

        let listed = repo.list_for_board(seed.board.id).await.unwrap();

        assert_eq!(listed, vec![created]);
    }

    #[tokio::test]
    async fn should_list_rules_in_execution_order() {
        let pool = memory_pool().await;
        let seed = Seed::design_board(&pool).await;
        let repo = SqliteAutomationRuleRepository::new(pool);
        repo.create(rule(seed.board.id, "second", 2)).await.unwrap();
        repo.create(rule(seed.board.id, "first", 1)).await.unwrap();
        repo.create(rule(seed.board.id, "also second", 2)).await.unwrap();

        let names: Vec<String> = repo
            .list_for_board(seed.board.id)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();

        assert_eq!(names, ["first", "second", "also second"]);
    }

    #[tokio::test]
    async fn should_skip_inactive_rules_when_listing_active() {
        let pool = memory_pool().await;
        let seed = Seed::design_board(&pool).await;
        let repo = SqliteAutomationRuleRepository::new(pool);
        let mut paused = rule(seed.board.id, "paused", 0);
        paused.is_active = false;
        repo.create(paused).await.unwrap();
        repo.create(rule(seed.board.id, "live", 1)).await.unwrap();

        let active = repo.list_active_for_board(seed.board.id).await.unwrap();

        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "live");
    }

    #[tokio::test]
    async fn should_report_whether_rule_was_deleted() {
        let pool = memory_pool().await;
        let seed = Seed::design_board(&pool).await;
        let repo = SqliteAutomationRuleRepository::new(pool);
        let created = repo.create(rule(seed.board.id, "gone", 0)).await.unwrap();

        assert!(repo.delete(created.id).await.unwrap());
        assert!(!repo.delete(created.id).await.unwrap());
    }
}
