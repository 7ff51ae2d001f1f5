//! Placement repository port.

use std::future::Future;

use kanflow_domain::card::CardPlacement;
use kanflow_domain::error::KanflowError;
use kanflow_domain::id::{BoardId, CardId, ListId, PlacementId};

/// Repository for [`CardPlacement`]s.
pub trait PlacementRepository {
    fn insert(
        &self,
        placement: CardPlacement,
    ) -> impl Future<Output = Result<CardPlacement, KanflowError>> + Send;

    fn get(
        &self,
        id: PlacementId,
    ) -> impl Future<Output = Result<Option<CardPlacement>, KanflowError>> + Send;

    fn list_for_card(
        &self,
        card_id: CardId,
    ) -> impl Future<Output = Result<Vec<CardPlacement>, KanflowError>> + Send;

    /// The card's non-mirror placement in a list of `board_id`.
    fn find_primary(
        &self,
        card_id: CardId,
        board_id: BoardId,
    ) -> impl Future<Output = Result<Option<CardPlacement>, KanflowError>> + Send;

    /// Returns `false` when the placement does not exist.
    fn move_to_list(
        &self,
        id: PlacementId,
        list_id: ListId,
    ) -> impl Future<Output = Result<bool, KanflowError>> + Send;

    fn find_mirror(
        &self,
        card_id: CardId,
        list_id: ListId,
    ) -> impl Future<Output = Result<Option<CardPlacement>, KanflowError>> + Send;

    /// Append a mirror placement at the end of its list.
    ///
    /// The existence check, position computation and insert happen in one
    /// atomic step: returns `None` when a mirror of this card already sits
    /// in the list. The stored position is `max(position) + 1`, or 0.
    fn insert_mirror(
        &self,
        placement: CardPlacement,
    ) -> impl Future<Output = Result<Option<CardPlacement>, KanflowError>> + Send;

    /// Returns `false` when the placement did not exist.
    fn delete(&self, id: PlacementId) -> impl Future<Output = Result<bool, KanflowError>> + Send;

    /// Delete every mirror placement of `card_id` in `list_id` and return them.
    fn delete_mirrors(
        &self,
        card_id: CardId,
        list_id: ListId,
    ) -> impl Future<Output = Result<Vec<CardPlacement>, KanflowError>> + Send;
}
