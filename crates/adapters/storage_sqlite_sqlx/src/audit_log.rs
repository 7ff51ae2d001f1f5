//! `SQLite` implementation of [`AuditLog`].
//!
//! Both logs are append-only. Entries are returned newest first; entries
//! written within the same microsecond keep their insertion order.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use kanflow_app::ports::AuditLog;
use kanflow_domain::audit::{ActivityEntry, ExecutionLogEntry};
use kanflow_domain::error::KanflowError;
use kanflow_domain::id::{ActivityId, BoardId, CardId, LogEntryId, RuleId, UserId};

use crate::codec::{decode_json, decode_str, decode_timestamp, encode_timestamp};
use crate::error::StorageError;

struct ExecutionWrapper(ExecutionLogEntry);

impl<'r> FromRow<'r, SqliteRow> for ExecutionWrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let trigger_data: String = row.try_get("trigger_data")?;
        let action_result: String = row.try_get("action_result")?;
        let status: String = row.try_get("status")?;
        let created_at: String = row.try_get("created_at")?;

        Ok(Self(ExecutionLogEntry {
            id: LogEntryId::from_uuid(row.try_get("id")?),
            rule_id: RuleId::from_uuid(row.try_get("rule_id")?),
            board_id: BoardId::from_uuid(row.try_get("board_id")?),
            card_id: CardId::from_uuid(row.try_get("card_id")?),
            trigger_data: decode_json(&trigger_data)?,
            action_result: decode_json(&action_result)?,
            status: decode_str(&status)?,
            error_message: row.try_get("error_message")?,
            created_at: decode_timestamp(&created_at)?,
        }))
    }
}

struct ActivityWrapper(ActivityEntry);

impl<'r> FromRow<'r, SqliteRow> for ActivityWrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let user_id: Option<uuid::Uuid> = row.try_get("user_id")?;
        let metadata: String = row.try_get("metadata")?;
        let created_at: String = row.try_get("created_at")?;

        Ok(Self(ActivityEntry {
            id: ActivityId::from_uuid(row.try_get("id")?),
            board_id: BoardId::from_uuid(row.try_get("board_id")?),
            card_id: CardId::from_uuid(row.try_get("card_id")?),
            user_id: user_id.map(UserId::from_uuid),
            action: row.try_get("action")?,
            metadata: decode_json(&metadata)?,
            created_at: decode_timestamp(&created_at)?,
        }))
    }
}

const INSERT_EXECUTION: &str = r"
    INSERT INTO automation_log
        (id, rule_id, board_id, card_id, trigger_data, action_result, status, error_message, created_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
";

const INSERT_ACTIVITY: &str = r"
    INSERT INTO activity_log (id, board_id, card_id, user_id, action, metadata, created_at)
    VALUES (?, ?, ?, ?, ?, ?, ?)
";

const SELECT_RECENT_EXECUTIONS: &str = r"
    SELECT * FROM automation_log
    WHERE board_id = ?
    ORDER BY created_at DESC, rowid DESC
    LIMIT ?
";

const SELECT_CARD_ACTIVITY: &str = r"
    SELECT * FROM activity_log
    WHERE card_id = ?
    ORDER BY created_at DESC, rowid DESC
    LIMIT ?
";

/// `SQLite`-backed execution and activity log.
#[derive(Clone)]
pub struct SqliteAuditLog {
    pool: SqlitePool,
}

impl SqliteAuditLog {
    /// Create a new audit log backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl AuditLog for SqliteAuditLog {
    async fn append_execution(&self, entry: ExecutionLogEntry) -> Result<(), KanflowError> {
        let trigger_data = serde_json::to_string(&entry.trigger_data).map_err(StorageError::from)?;
        let action_result =
            serde_json::to_string(&entry.action_result).map_err(StorageError::from)?;

        sqlx::query(INSERT_EXECUTION)
            .bind(entry.id.as_uuid())
            .bind(entry.rule_id.as_uuid())
            .bind(entry.board_id.as_uuid())
            .bind(entry.card_id.as_uuid())
            .bind(trigger_data)
            .bind(action_result)
            .bind(entry.status.as_str())
            .bind(&entry.error_message)
            .bind(encode_timestamp(entry.created_at))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }

    async fn append_activity(&self, entry: ActivityEntry) -> Result<(), KanflowError> {
        let metadata = serde_json::to_string(&entry.metadata).map_err(StorageError::from)?;

        sqlx::query(INSERT_ACTIVITY)
            .bind(entry.id.as_uuid())
            .bind(entry.board_id.as_uuid())
            .bind(entry.card_id.as_uuid())
            .bind(entry.user_id.map(UserId::as_uuid))
            .bind(&entry.action)
            .bind(metadata)
            .bind(encode_timestamp(entry.created_at))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }

    async fn recent_executions(
        &self,
        board_id: BoardId,
        limit: u32,
    ) -> Result<Vec<ExecutionLogEntry>, KanflowError> {
        let rows: Vec<ExecutionWrapper> = sqlx::query_as(SELECT_RECENT_EXECUTIONS)
            .bind(board_id.as_uuid())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn activity_for_card(
        &self,
        card_id: CardId,
        limit: u32,
    ) -> Result<Vec<ActivityEntry>, KanflowError> {
        let rows: Vec<ActivityWrapper> = sqlx::query_as(SELECT_CARD_ACTIVITY)
            .bind(card_id.as_uuid())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}
