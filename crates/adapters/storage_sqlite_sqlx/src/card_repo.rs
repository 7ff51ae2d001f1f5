//! `SQLite` implementation of [`CardRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use kanflow_app::ports::CardRepository;
use kanflow_domain::board::CustomFieldValue;
use kanflow_domain::card::{Card, Priority};
use kanflow_domain::error::KanflowError;
use kanflow_domain::id::{BoardId, CardId, FieldDefinitionId, LabelId, UserId};

use crate::codec::{decode_json, decode_str, decode_timestamp, encode_timestamp};
use crate::error::StorageError;

struct Wrapper(Card);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Card> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let priority: String = row.try_get("priority")?;
        let due_date: Option<String> = row.try_get("due_date")?;
        let created_by: Option<uuid::Uuid> = row.try_get("created_by")?;
        let created_at: String = row.try_get("created_at")?;

        Ok(Self(Card {
            id: CardId::from_uuid(row.try_get("id")?),
            board_id: BoardId::from_uuid(row.try_get("board_id")?),
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            priority: decode_str(&priority)?,
            due_date: due_date.as_deref().map(decode_timestamp).transpose()?,
            created_by: created_by.map(UserId::from_uuid),
            created_at: decode_timestamp(&created_at)?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO cards (id, board_id, title, description, priority, due_date, created_by, created_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
";

const SELECT_BY_ID: &str = "SELECT * FROM cards WHERE id = ?";
const UPDATE_PRIORITY: &str = "UPDATE cards SET priority = ? WHERE id = ?";

const SELECT_FIELD_VALUE: &str =
    "SELECT value FROM custom_field_values WHERE card_id = ? AND field_definition_id = ?";

const UPSERT_FIELD_VALUE: &str = r"
    INSERT INTO custom_field_values (card_id, field_definition_id, value) VALUES (?, ?, ?)
    ON CONFLICT (card_id, field_definition_id) DO UPDATE SET value = excluded.value
";

// Single statement so concurrent increments never lose an update.
// Non-numeric current values count as zero; numeric strings are coerced.
// Text counts only when the whole trimmed string is a number; "4abc" is 0.
const INCREMENT_FIELD_VALUE: &str = r"
    INSERT INTO custom_field_values (card_id, field_definition_id, value) VALUES (?1, ?2, ?3)
    ON CONFLICT (card_id, field_definition_id) DO UPDATE SET value = CAST(
        CASE json_type(custom_field_values.value)
            WHEN 'integer' THEN json_extract(custom_field_values.value, '$')
            WHEN 'real' THEN json_extract(custom_field_values.value, '$')
            WHEN 'text' THEN
                CASE WHEN json_valid(trim(json_extract(custom_field_values.value, '$')))
                    THEN CASE json_type(trim(json_extract(custom_field_values.value, '$')))
                        WHEN 'integer' THEN json_extract(trim(json_extract(custom_field_values.value, '$')), '$')
                        WHEN 'real' THEN json_extract(trim(json_extract(custom_field_values.value, '$')), '$')
                        ELSE 0
                    END
                    ELSE 0
                END
            ELSE 0
        END + ?4 AS TEXT)
    RETURNING value
";

const SELECT_LABEL: &str = "SELECT 1 FROM card_labels WHERE card_id = ? AND label_id = ?";
const INSERT_LABEL: &str = "INSERT OR IGNORE INTO card_labels (card_id, label_id) VALUES (?, ?)";
const DELETE_LABEL: &str = "DELETE FROM card_labels WHERE card_id = ? AND label_id = ?";

const SELECT_ASSIGNEE: &str = "SELECT 1 FROM card_assignees WHERE card_id = ? AND user_id = ?";
const INSERT_ASSIGNEE: &str =
    "INSERT OR IGNORE INTO card_assignees (card_id, user_id) VALUES (?, ?)";

/// `SQLite`-backed card repository.
#[derive(Clone)]
pub struct SqliteCardRepository {
    pool: SqlitePool,
}

impl SqliteCardRepository {
    /// Create a new repository backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl CardRepository for SqliteCardRepository {
    async fn create_card(&self, card: Card) -> Result<Card, KanflowError> {
        sqlx::query(INSERT)
            .bind(card.id.as_uuid())
            .bind(card.board_id.as_uuid())
            .bind(&card.title)
            .bind(&card.description)
            .bind(card.priority.as_str())
            .bind(card.due_date.map(encode_timestamp))
            .bind(card.created_by.map(UserId::as_uuid))
            .bind(encode_timestamp(card.created_at))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(card)
    }

    async fn get_card(&self, id: CardId) -> Result<Option<Card>, KanflowError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::maybe(row))
    }

    async fn set_priority(&self, id: CardId, priority: Priority) -> Result<bool, KanflowError> {
        let result = sqlx::query(UPDATE_PRIORITY)
            .bind(priority.as_str())
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_field_value(
        &self,
        card_id: CardId,
        field_definition_id: FieldDefinitionId,
    ) -> Result<Option<serde_json::Value>, KanflowError> {
        let raw: Option<String> = sqlx::query_scalar(SELECT_FIELD_VALUE)
            .bind(card_id.as_uuid())
            .bind(field_definition_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        let value = raw
            .as_deref()
            .map(decode_json)
            .transpose()
            .map_err(StorageError::from)?;
        Ok(value)
    }

    async fn upsert_field_value(&self, value: CustomFieldValue) -> Result<(), KanflowError> {
        let encoded = serde_json::to_string(&value.value).map_err(StorageError::from)?;
        sqlx::query(UPSERT_FIELD_VALUE)
            .bind(value.card_id.as_uuid())
            .bind(value.field_definition_id.as_uuid())
            .bind(encoded)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }

    async fn increment_field_value(
        &self,
        card_id: CardId,
        field_definition_id: FieldDefinitionId,
        by: &serde_json::Number,
    ) -> Result<serde_json::Value, KanflowError> {
        let initial = serde_json::to_string(by).map_err(StorageError::from)?;
        let query = sqlx::query_scalar(INCREMENT_FIELD_VALUE)
            .bind(card_id.as_uuid())
            .bind(field_definition_id.as_uuid())
            .bind(initial);
        let query = match by.as_i64() {
            Some(step) => query.bind(step),
            None => query.bind(by.as_f64().unwrap_or(0.0)),
        };
        let raw: String = query
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(serde_json::from_str(&raw).map_err(StorageError::from)?)
    }

    async fn has_label(&self, card_id: CardId, label_id: LabelId) -> Result<bool, KanflowError> {
        let row: Option<i64> = sqlx::query_scalar(SELECT_LABEL)
            .bind(card_id.as_uuid())
            .bind(label_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(row.is_some())
    }

    async fn attach_label(&self, card_id: CardId, label_id: LabelId) -> Result<(), KanflowError> {
        sqlx::query(INSERT_LABEL)
            .bind(card_id.as_uuid())
            .bind(label_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }

    async fn detach_label(&self, card_id: CardId, label_id: LabelId) -> Result<bool, KanflowError> {
        let result = sqlx::query(DELETE_LABEL)
            .bind(card_id.as_uuid())
            .bind(label_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn is_assigned(&self, card_id: CardId, user_id: UserId) -> Result<bool, KanflowError> {
        let row: Option<i64> = sqlx::query_scalar(SELECT_ASSIGNEE)
            .bind(card_id.as_uuid())
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(row.is_some())
    }

    async fn assign_user(&self, card_id: CardId, user_id: UserId) -> Result<(), KanflowError> {
        sqlx::query(INSERT_ASSIGNEE)
            .bind(card_id.as_uuid())
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }
}
