//! Read-only views of the execution and activity logs.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use kanflow_app::ports::{AuditLog, AutomationRuleRepository, MirrorRuleRepository};
use kanflow_domain::audit::{ActivityEntry, ExecutionLogEntry};
use kanflow_domain::id::{BoardId, CardId};

use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_LIMIT: u32 = 50;
const MAX_LIMIT: u32 = 500;

/// Query parameters shared by the log endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
    pub limit: Option<u32>,
}

impl LogQuery {
    fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

/// Possible responses from the automation log endpoint.
pub enum AutomationLogResponse {
    Ok(Json<Vec<ExecutionLogEntry>>),
}

impl IntoResponse for AutomationLogResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the activity endpoint.
pub enum ActivityResponse {
    Ok(Json<Vec<ActivityEntry>>),
}

impl IntoResponse for ActivityResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/boards/{board_id}/automation-log` — newest rule executions first.
pub async fn automation_log<AR, MR, AL>(
    State(state): State<AppState<AR, MR, AL>>,
    Path(board_id): Path<BoardId>,
    Query(query): Query<LogQuery>,
) -> Result<AutomationLogResponse, ApiError>
where
    AR: AutomationRuleRepository + Send + Sync + 'static,
    MR: MirrorRuleRepository + Send + Sync + 'static,
    AL: AuditLog + Send + Sync + 'static,
{
    let entries = state
        .audit_log
        .recent_executions(board_id, query.limit())
        .await?;
    Ok(AutomationLogResponse::Ok(Json(entries)))
}

/// `GET /api/cards/{card_id}/activity` — newest activity entries first.
pub async fn activity<AR, MR, AL>(
    State(state): State<AppState<AR, MR, AL>>,
    Path(card_id): Path<CardId>,
    Query(query): Query<LogQuery>,
) -> Result<ActivityResponse, ApiError>
where
    AR: AutomationRuleRepository + Send + Sync + 'static,
    MR: MirrorRuleRepository + Send + Sync + 'static,
    AL: AuditLog + Send + Sync + 'static,
{
    let entries = state
        .audit_log
        .activity_for_card(card_id, query.limit())
        .await?;
    Ok(ActivityResponse::Ok(Json(entries)))
}
