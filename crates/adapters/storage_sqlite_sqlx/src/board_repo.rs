//! `SQLite` implementation of [`BoardRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use kanflow_app::ports::BoardRepository;
use kanflow_domain::board::{Board, CustomFieldDefinition, Label, List};
use kanflow_domain::error::KanflowError;
use kanflow_domain::id::{BoardId, FieldDefinitionId, LabelId, ListId};

use crate::codec::decode_str;
use crate::error::StorageError;

struct BoardRow(Board);

impl<'r> FromRow<'r, SqliteRow> for BoardRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let board_type: String = row.try_get("board_type")?;
        Ok(Self(Board {
            id: BoardId::from_uuid(row.try_get("id")?),
            name: row.try_get("name")?,
            board_type: decode_str(&board_type)?,
        }))
    }
}

struct ListRow(List);

impl<'r> FromRow<'r, SqliteRow> for ListRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(List {
            id: ListId::from_uuid(row.try_get("id")?),
            board_id: BoardId::from_uuid(row.try_get("board_id")?),
            name: row.try_get("name")?,
            position: row.try_get("position")?,
        }))
    }
}

struct LabelRow(Label);

impl<'r> FromRow<'r, SqliteRow> for LabelRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(Label {
            id: LabelId::from_uuid(row.try_get("id")?),
            board_id: BoardId::from_uuid(row.try_get("board_id")?),
            name: row.try_get("name")?,
            color: row.try_get("color")?,
        }))
    }
}

struct FieldDefinitionRow(CustomFieldDefinition);

impl<'r> FromRow<'r, SqliteRow> for FieldDefinitionRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let field_type: String = row.try_get("field_type")?;
        Ok(Self(CustomFieldDefinition {
            id: FieldDefinitionId::from_uuid(row.try_get("id")?),
            board_id: BoardId::from_uuid(row.try_get("board_id")?),
            name: row.try_get("name")?,
            field_type: decode_str(&field_type)?,
        }))
    }
}

/// `SQLite`-backed board repository.
#[derive(Clone)]
pub struct SqliteBoardRepository {
    pool: SqlitePool,
}

impl SqliteBoardRepository {
    /// Create a new repository backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl BoardRepository for SqliteBoardRepository {
    async fn create_board(&self, board: Board) -> Result<Board, KanflowError> {
        sqlx::query("INSERT INTO boards (id, name, board_type) VALUES (?, ?, ?)")
            .bind(board.id.as_uuid())
            .bind(&board.name)
            .bind(board.board_type.as_str())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(board)
    }

    async fn create_list(&self, list: List) -> Result<List, KanflowError> {
        sqlx::query("INSERT INTO lists (id, board_id, name, position) VALUES (?, ?, ?, ?)")
            .bind(list.id.as_uuid())
            .bind(list.board_id.as_uuid())
            .bind(&list.name)
            .bind(list.position)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(list)
    }

    async fn create_label(&self, label: Label) -> Result<Label, KanflowError> {
        sqlx::query("INSERT INTO labels (id, board_id, name, color) VALUES (?, ?, ?, ?)")
            .bind(label.id.as_uuid())
            .bind(label.board_id.as_uuid())
            .bind(&label.name)
            .bind(&label.color)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(label)
    }

    async fn create_field_definition(
        &self,
        definition: CustomFieldDefinition,
    ) -> Result<CustomFieldDefinition, KanflowError> {
        sqlx::query(
            "INSERT INTO custom_field_definitions (id, board_id, name, field_type) VALUES (?, ?, ?, ?)",
        )
        .bind(definition.id.as_uuid())
        .bind(definition.board_id.as_uuid())
        .bind(&definition.name)
        .bind(definition.field_type.as_str())
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;
        Ok(definition)
    }

    async fn get_board(&self, id: BoardId) -> Result<Option<Board>, KanflowError> {
        let row: Option<BoardRow> = sqlx::query_as("SELECT * FROM boards WHERE id = ?")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(row.map(|r| r.0))
    }

    async fn get_list(&self, id: ListId) -> Result<Option<List>, KanflowError> {
        let row: Option<ListRow> = sqlx::query_as("SELECT * FROM lists WHERE id = ?")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(row.map(|r| r.0))
    }

    async fn find_list_by_name(
        &self,
        board_id: BoardId,
        name: &str,
    ) -> Result<Option<List>, KanflowError> {
        let row: Option<ListRow> = sqlx::query_as(
            "SELECT * FROM lists WHERE board_id = ? AND name = ? ORDER BY position LIMIT 1",
        )
        .bind(board_id.as_uuid())
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::from)?;
        Ok(row.map(|r| r.0))
    }

    async fn find_label_by_name(
        &self,
        board_id: BoardId,
        name: &str,
    ) -> Result<Option<Label>, KanflowError> {
        let row: Option<LabelRow> =
            sqlx::query_as("SELECT * FROM labels WHERE board_id = ? AND name = ? LIMIT 1")
                .bind(board_id.as_uuid())
                .bind(name)
                .fetch_optional(&self.pool)
                .await
                .map_err(StorageError::from)?;
        Ok(row.map(|r| r.0))
    }

    async fn find_field_definition(
        &self,
        board_id: BoardId,
        name: &str,
    ) -> Result<Option<CustomFieldDefinition>, KanflowError> {
        let row: Option<FieldDefinitionRow> = sqlx::query_as(
            "SELECT * FROM custom_field_definitions WHERE board_id = ? AND name = ? LIMIT 1",
        )
        .bind(board_id.as_uuid())
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::from)?;
        Ok(row.map(|r| r.0))
    }
}
