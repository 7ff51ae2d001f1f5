//! Ingestion endpoints for card events.
//!
//! Both endpoints only enqueue work for the background dispatcher and answer
//! `202 Accepted`; rule and mirror failures surface in the logs, never here.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use kanflow_app::action_executor::RuleContext;
use kanflow_app::card_events::CardEvent;
use kanflow_app::ports::{AuditLog, AutomationRuleRepository, MirrorRuleRepository};
use kanflow_domain::automation::TriggerEvent;
use kanflow_domain::card::ListChange;
use kanflow_domain::error::{KanflowError, ValidationError};
use kanflow_domain::id::{BoardId, CardId, PlacementId, UserId};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for `POST /api/boards/{board_id}/events`.
#[derive(Debug, Deserialize)]
pub struct CardEventRequest {
    pub card_id: CardId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub event: TriggerEvent,
}

/// Request body for `POST /api/boards/{board_id}/cards/{card_id}/list-changes`.
#[derive(Debug, Deserialize)]
pub struct ListChangeRequest {
    #[serde(default)]
    pub from_list_name: Option<String>,
    pub to_list_name: String,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub source_placement_id: Option<PlacementId>,
}

/// Acknowledgement returned once an event is queued.
#[derive(Debug, Serialize)]
pub struct Accepted {
    pub card_id: CardId,
    pub kind: &'static str,
}

/// `202 Accepted` with the queued event's acknowledgement.
type AcceptResponse = (StatusCode, Json<Accepted>);

fn enqueue<AR, MR, AL>(
    state: &AppState<AR, MR, AL>,
    event: CardEvent,
) -> Result<AcceptResponse, ApiError> {
    let accepted = Accepted {
        card_id: event.card_id(),
        kind: event.kind(),
    };
    state.dispatcher.dispatch(event)?;
    Ok((StatusCode::ACCEPTED, Json(accepted)))
}

/// `POST /api/boards/{board_id}/events` — queue a trigger event for rule evaluation.
pub async fn trigger<AR, MR, AL>(
    State(state): State<AppState<AR, MR, AL>>,
    Path(board_id): Path<BoardId>,
    Json(req): Json<CardEventRequest>,
) -> Result<AcceptResponse, ApiError>
where
    AR: AutomationRuleRepository + Send + Sync + 'static,
    MR: MirrorRuleRepository + Send + Sync + 'static,
    AL: AuditLog + Send + Sync + 'static,
{
    let context = RuleContext {
        board_id,
        card_id: req.card_id,
        user_id: req.user_id,
    };
    enqueue(
        &state,
        CardEvent::Trigger {
            context,
            event: req.event,
        },
    )
}

/// `POST /api/boards/{board_id}/cards/{card_id}/list-changes` — queue mirror
/// cleanup and creation for a card that changed list.
pub async fn list_change<AR, MR, AL>(
    State(state): State<AppState<AR, MR, AL>>,
    Path((board_id, card_id)): Path<(BoardId, CardId)>,
    Json(req): Json<ListChangeRequest>,
) -> Result<AcceptResponse, ApiError>
where
    AR: AutomationRuleRepository + Send + Sync + 'static,
    MR: MirrorRuleRepository + Send + Sync + 'static,
    AL: AuditLog + Send + Sync + 'static,
{
    if req.to_list_name.trim().is_empty() {
        return Err(KanflowError::from(ValidationError::EmptyListName("to_list_name")).into());
    }
    enqueue(
        &state,
        CardEvent::ListChanged(ListChange {
            card_id,
            board_id,
            from_list_name: req.from_list_name,
            to_list_name: req.to_list_name,
            user_id: req.user_id,
            source_placement_id: req.source_placement_id,
        }),
    )
}
