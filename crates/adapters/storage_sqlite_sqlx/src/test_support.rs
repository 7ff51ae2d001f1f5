//! Fixtures shared by the repository tests.

use sqlx::SqlitePool;

use kanflow_app::ports::{BoardRepository, CardRepository, MirrorRuleRepository, PlacementRepository};
use kanflow_domain::board::{Board, BoardType, CustomFieldDefinition, FieldType, Label, List};
use kanflow_domain::card::{Card, CardPlacement};
use kanflow_domain::id::BoardId;
use kanflow_domain::mirror::MirrorRule;

use crate::pool::Config;
use crate::{
    SqliteBoardRepository, SqliteCardRepository, SqliteMirrorRuleRepository,
    SqlitePlacementRepository,
};

pub(crate) async fn memory_pool() -> SqlitePool {
    Config::new("sqlite::memory:")
        .build()
        .await
        .unwrap()
        .pool()
        .clone()
}

pub(crate) async fn board_with_lists(
    pool: &SqlitePool,
    name: &str,
    lists: &[&str],
) -> (Board, Vec<List>) {
    let repo = SqliteBoardRepository::new(pool.clone());
    let board = repo
        .create_board(Board::new(name, BoardType::General).unwrap())
        .await
        .unwrap();
    let mut created = Vec::new();
    for (position, list) in (0_i64..).zip(lists) {
        created.push(
            repo.create_list(List::new(board.id, *list, position))
                .await
                .unwrap(),
        );
    }
    (board, created)
}

/// Create a card with its primary placement in `list`.
pub(crate) async fn card_in(pool: &SqlitePool, list: &List, position: i64) -> (Card, CardPlacement) {
    let card = SqliteCardRepository::new(pool.clone())
        .create_card(
            Card::builder()
                .board_id(list.board_id)
                .title("Landing page")
                .build()
                .unwrap(),
        )
        .await
        .unwrap();
    let placement = SqlitePlacementRepository::new(pool.clone())
        .insert(CardPlacement::primary(card.id, list.id, position))
        .await
        .unwrap();
    (card, placement)
}

pub(crate) async fn seed_mirror_rule(
    pool: &SqlitePool,
    source: BoardId,
    source_list: &str,
    target: BoardId,
    target_list: &str,
) -> MirrorRule {
    SqliteMirrorRuleRepository::new(pool.clone())
        .create(MirrorRule::new(source, source_list, target, target_list))
        .await
        .unwrap()
}

/// A Design board with two lists, one label, one number field and one card.
pub(crate) struct Seed {
    pub board: Board,
    pub lists: Vec<List>,
    pub label: Label,
    pub field: CustomFieldDefinition,
    pub card: Card,
    pub placement: CardPlacement,
}

impl Seed {
    pub(crate) async fn design_board(pool: &SqlitePool) -> Self {
        let (board, lists) = board_with_lists(pool, "Design", &["Backlog", "Ready"]).await;
        let repo = SqliteBoardRepository::new(pool.clone());
        let label = repo
            .create_label(Label::new(board.id, "Urgent"))
            .await
            .unwrap();
        let field = repo
            .create_field_definition(CustomFieldDefinition::new(
                board.id,
                "Revision Count",
                FieldType::Number,
            ))
            .await
            .unwrap();
        let (card, placement) = card_in(pool, &lists[0], 0).await;
        Self {
            board,
            lists,
            label,
            field,
            card,
            placement,
        }
    }
}
