//! `SQLite` implementation of [`PlacementRepository`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use kanflow_app::ports::PlacementRepository;
use kanflow_domain::card::CardPlacement;
use kanflow_domain::error::KanflowError;
use kanflow_domain::id::{BoardId, CardId, ListId, MirrorRuleId, PlacementId};

use crate::error::StorageError;

struct Wrapper(CardPlacement);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<CardPlacement> {
        value.map(|w| w.0)
    }

    fn many(values: Vec<Self>) -> Vec<CardPlacement> {
        values.into_iter().map(|w| w.0).collect()
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let mirror_rule_id: Option<uuid::Uuid> = row.try_get("mirror_rule_id")?;
        Ok(Self(CardPlacement {
            id: PlacementId::from_uuid(row.try_get("id")?),
            card_id: CardId::from_uuid(row.try_get("card_id")?),
            list_id: ListId::from_uuid(row.try_get("list_id")?),
            position: row.try_get("position")?,
            is_mirror: row.try_get("is_mirror")?,
            mirror_rule_id: mirror_rule_id.map(MirrorRuleId::from_uuid),
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO card_placements (id, card_id, list_id, position, is_mirror, mirror_rule_id)
    VALUES (?, ?, ?, ?, ?, ?)
";

const SELECT_BY_ID: &str = "SELECT * FROM card_placements WHERE id = ?";
const SELECT_BY_CARD: &str = "SELECT * FROM card_placements WHERE card_id = ? ORDER BY rowid";

const SELECT_PRIMARY: &str = r"
    SELECT p.* FROM card_placements p
    JOIN lists l ON l.id = p.list_id
    WHERE p.card_id = ? AND l.board_id = ? AND p.is_mirror = 0
    ORDER BY p.rowid
    LIMIT 1
";

const UPDATE_LIST: &str = "UPDATE card_placements SET list_id = ? WHERE id = ?";

const SELECT_MIRROR: &str =
    "SELECT * FROM card_placements WHERE card_id = ? AND list_id = ? AND is_mirror = 1";

// The existence check and the insert are one statement, so two concurrent
// evaluations cannot both create a mirror; the partial unique index backs it up.
const INSERT_MIRROR: &str = r"
    INSERT INTO card_placements (id, card_id, list_id, position, is_mirror, mirror_rule_id)
    SELECT ?1, ?2, ?3,
           COALESCE((SELECT MAX(position) FROM card_placements WHERE list_id = ?3), -1) + 1,
           1, ?4
    WHERE NOT EXISTS (
        SELECT 1 FROM card_placements WHERE card_id = ?2 AND list_id = ?3 AND is_mirror = 1
    )
    ON CONFLICT DO NOTHING
    RETURNING position
";

const DELETE_BY_ID: &str = "DELETE FROM card_placements WHERE id = ?";

const DELETE_MIRRORS: &str = r"
    DELETE FROM card_placements
    WHERE card_id = ? AND list_id = ? AND is_mirror = 1
    RETURNING *
";

/// `SQLite`-backed card placement repository.
#[derive(Clone)]
pub struct SqlitePlacementRepository {
    pool: SqlitePool,
}

impl SqlitePlacementRepository {
    /// Create a new repository backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl PlacementRepository for SqlitePlacementRepository {
    async fn insert(&self, placement: CardPlacement) -> Result<CardPlacement, KanflowError> {
        sqlx::query(INSERT)
            .bind(placement.id.as_uuid())
            .bind(placement.card_id.as_uuid())
            .bind(placement.list_id.as_uuid())
            .bind(placement.position)
            .bind(placement.is_mirror)
            .bind(placement.mirror_rule_id.map(MirrorRuleId::as_uuid))
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(placement)
    }

    async fn get(&self, id: PlacementId) -> Result<Option<CardPlacement>, KanflowError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::maybe(row))
    }

    async fn list_for_card(&self, card_id: CardId) -> Result<Vec<CardPlacement>, KanflowError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_CARD)
            .bind(card_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::many(rows))
    }

    async fn find_primary(
        &self,
        card_id: CardId,
        board_id: BoardId,
    ) -> Result<Option<CardPlacement>, KanflowError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_PRIMARY)
            .bind(card_id.as_uuid())
            .bind(board_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::maybe(row))
    }

    async fn move_to_list(&self, id: PlacementId, list_id: ListId) -> Result<bool, KanflowError> {
        let result = sqlx::query(UPDATE_LIST)
            .bind(list_id.as_uuid())
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_mirror(
        &self,
        card_id: CardId,
        list_id: ListId,
    ) -> Result<Option<CardPlacement>, KanflowError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_MIRROR)
            .bind(card_id.as_uuid())
            .bind(list_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::maybe(row))
    }

    async fn insert_mirror(
        &self,
        mut placement: CardPlacement,
    ) -> Result<Option<CardPlacement>, KanflowError> {
        let position: Option<i64> = sqlx::query_scalar(INSERT_MIRROR)
            .bind(placement.id.as_uuid())
            .bind(placement.card_id.as_uuid())
            .bind(placement.list_id.as_uuid())
            .bind(placement.mirror_rule_id.map(MirrorRuleId::as_uuid))
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(position.map(|position| {
            placement.position = position;
            placement.is_mirror = true;
            placement
        }))
    }

    async fn delete(&self, id: PlacementId) -> Result<bool, KanflowError> {
        let result = sqlx::query(DELETE_BY_ID)
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_mirrors(
        &self,
        card_id: CardId,
        list_id: ListId,
    ) -> Result<Vec<CardPlacement>, KanflowError> {
        let rows: Vec<Wrapper> = sqlx::query_as(DELETE_MIRRORS)
            .bind(card_id.as_uuid())
            .bind(list_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::many(rows))
    }
}
