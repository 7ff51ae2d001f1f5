//! `SQLite` implementation of [`MirrorRuleRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use kanflow_app::ports::MirrorRuleRepository;
use kanflow_domain::error::KanflowError;
use kanflow_domain::id::{BoardId, MirrorRuleId};
use kanflow_domain::mirror::{MirrorDirection, MirrorRule};

use crate::codec::decode_str;
use crate::error::StorageError;

struct Wrapper(MirrorRule);

impl Wrapper {
    fn many(values: Vec<Self>) -> Vec<MirrorRule> {
        values.into_iter().map(|w| w.0).collect()
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let direction: String = row.try_get("direction")?;
        Ok(Self(MirrorRule {
            id: MirrorRuleId::from_uuid(row.try_get("id")?),
            source_board_id: BoardId::from_uuid(row.try_get("source_board_id")?),
            source_list_name: row.try_get("source_list_name")?,
            target_board_id: BoardId::from_uuid(row.try_get("target_board_id")?),
            target_list_name: row.try_get("target_list_name")?,
            direction: decode_str(&direction)?,
            condition_field: row.try_get("condition_field")?,
            condition_value: row.try_get("condition_value")?,
            remove_from_source: row.try_get("remove_from_source")?,
            is_active: row.try_get("is_active")?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO mirror_rules
        (id, source_board_id, source_list_name, target_board_id, target_list_name,
         direction, condition_field, condition_value, remove_from_source, is_active)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
";

const SELECT_BY_SOURCE: &str = r"
    SELECT * FROM mirror_rules
    WHERE source_board_id = ? AND source_list_name = ? AND is_active = 1
    ORDER BY rowid
";

const SELECT_BIDIRECTIONAL_BY_TARGET: &str = r"
    SELECT * FROM mirror_rules
    WHERE target_board_id = ? AND target_list_name = ? AND direction = ? AND is_active = 1
    ORDER BY rowid
";

const SELECT_BY_BOARD: &str = r"
    SELECT * FROM mirror_rules
    WHERE source_board_id = ?1 OR target_board_id = ?1
    ORDER BY rowid
";

/// `SQLite`-backed mirror rule repository.
#[derive(Clone)]
pub struct SqliteMirrorRuleRepository {
    pool: SqlitePool,
}

impl SqliteMirrorRuleRepository {
    /// Create a new repository backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl MirrorRuleRepository for SqliteMirrorRuleRepository {
    async fn create(&self, rule: MirrorRule) -> Result<MirrorRule, KanflowError> {
        sqlx::query(INSERT)
            .bind(rule.id.as_uuid())
            .bind(rule.source_board_id.as_uuid())
            .bind(&rule.source_list_name)
            .bind(rule.target_board_id.as_uuid())
            .bind(&rule.target_list_name)
            .bind(rule.direction.as_str())
            .bind(&rule.condition_field)
            .bind(&rule.condition_value)
            .bind(rule.remove_from_source)
            .bind(rule.is_active)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rule)
    }

    async fn find_by_source(
        &self,
        board_id: BoardId,
        list_name: &str,
    ) -> Result<Vec<MirrorRule>, KanflowError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_SOURCE)
            .bind(board_id.as_uuid())
            .bind(list_name)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::many(rows))
    }

    async fn find_bidirectional_by_target(
        &self,
        board_id: BoardId,
        list_name: &str,
    ) -> Result<Vec<MirrorRule>, KanflowError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BIDIRECTIONAL_BY_TARGET)
            .bind(board_id.as_uuid())
            .bind(list_name)
            .bind(MirrorDirection::Bidirectional.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::many(rows))
    }

    async fn list_for_board(&self, board_id: BoardId) -> Result<Vec<MirrorRule>, KanflowError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_BOARD)
            .bind(board_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::many(rows))
    }
}
