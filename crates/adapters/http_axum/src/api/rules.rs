//! JSON REST handlers for automation and mirror rule configuration.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::{Map, Value};

use kanflow_app::ports::{AuditLog, AutomationRuleRepository, MirrorRuleRepository};
use kanflow_domain::automation::{ActionType, AutomationRule, TriggerConfig, TriggerType};
use kanflow_domain::board::BoardType;
use kanflow_domain::id::{BoardId, RuleId};
use kanflow_domain::mirror::{MirrorDirection, MirrorRule};

use crate::error::ApiError;
use crate::state::AppState;

fn default_active() -> bool {
    true
}

/// Request body for creating an automation rule.
#[derive(Debug, Deserialize)]
pub struct CreateRuleRequest {
    pub name: String,
    pub trigger_type: TriggerType,
    #[serde(default)]
    pub trigger_config: TriggerConfig,
    pub action_type: ActionType,
    #[serde(default)]
    pub action_config: Map<String, Value>,
    #[serde(default)]
    pub execution_order: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// Request body for installing the default rules of a board type.
#[derive(Debug, Deserialize)]
pub struct InstallDefaultsRequest {
    pub board_type: BoardType,
}

/// Request body for creating a mirror rule; the path board is the source.
#[derive(Debug, Deserialize)]
pub struct CreateMirrorRuleRequest {
    pub source_list_name: String,
    pub target_board_id: BoardId,
    pub target_list_name: String,
    #[serde(default)]
    pub direction: MirrorDirection,
    #[serde(default)]
    pub condition_field: Option<String>,
    #[serde(default)]
    pub condition_value: Option<String>,
    #[serde(default)]
    pub remove_from_source: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<AutomationRule>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the create endpoints.
pub enum CreateResponse {
    Created(Json<AutomationRule>),
    CreatedMany(Json<Vec<AutomationRule>>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
            Self::CreatedMany(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the delete endpoint.
pub enum DeleteResponse {
    NoContent,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// Possible responses from the mirror rule endpoints.
pub enum MirrorResponse {
    Ok(Json<Vec<MirrorRule>>),
    Created(Json<MirrorRule>),
}

impl IntoResponse for MirrorResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// `GET /api/boards/{board_id}/rules` — list a board's rules in execution order.
pub async fn list<AR, MR, AL>(
    State(state): State<AppState<AR, MR, AL>>,
    Path(board_id): Path<BoardId>,
) -> Result<ListResponse, ApiError>
where
    AR: AutomationRuleRepository + Send + Sync + 'static,
    MR: MirrorRuleRepository + Send + Sync + 'static,
    AL: AuditLog + Send + Sync + 'static,
{
    let rules = state.rule_service.list_rules(board_id).await?;
    Ok(ListResponse::Ok(Json(rules)))
}

/// `POST /api/boards/{board_id}/rules` — create a rule.
pub async fn create<AR, MR, AL>(
    State(state): State<AppState<AR, MR, AL>>,
    Path(board_id): Path<BoardId>,
    Json(req): Json<CreateRuleRequest>,
) -> Result<CreateResponse, ApiError>
where
    AR: AutomationRuleRepository + Send + Sync + 'static,
    MR: MirrorRuleRepository + Send + Sync + 'static,
    AL: AuditLog + Send + Sync + 'static,
{
    let rule = AutomationRule::builder()
        .board_id(board_id)
        .name(req.name)
        .trigger(req.trigger_type, req.trigger_config)
        .action(req.action_type, req.action_config)
        .execution_order(req.execution_order)
        .active(req.is_active)
        .build()?;
    let created = state.rule_service.create_rule(rule).await?;
    Ok(CreateResponse::Created(Json(created)))
}

/// `POST /api/boards/{board_id}/rules/defaults` — install the default rule set.
pub async fn install_defaults<AR, MR, AL>(
    State(state): State<AppState<AR, MR, AL>>,
    Path(board_id): Path<BoardId>,
    Json(req): Json<InstallDefaultsRequest>,
) -> Result<CreateResponse, ApiError>
where
    AR: AutomationRuleRepository + Send + Sync + 'static,
    MR: MirrorRuleRepository + Send + Sync + 'static,
    AL: AuditLog + Send + Sync + 'static,
{
    let installed = state
        .rule_service
        .install_default_rules(board_id, req.board_type)
        .await?;
    Ok(CreateResponse::CreatedMany(Json(installed)))
}

/// `DELETE /api/rules/{rule_id}` — delete a rule.
pub async fn delete<AR, MR, AL>(
    State(state): State<AppState<AR, MR, AL>>,
    Path(rule_id): Path<RuleId>,
) -> Result<DeleteResponse, ApiError>
where
    AR: AutomationRuleRepository + Send + Sync + 'static,
    MR: MirrorRuleRepository + Send + Sync + 'static,
    AL: AuditLog + Send + Sync + 'static,
{
    state.rule_service.delete_rule(rule_id).await?;
    Ok(DeleteResponse::NoContent)
}

/// `GET /api/boards/{board_id}/mirror-rules` — mirror rules touching the board.
pub async fn list_mirrors<AR, MR, AL>(
    State(state): State<AppState<AR, MR, AL>>,
    Path(board_id): Path<BoardId>,
) -> Result<MirrorResponse, ApiError>
where
    AR: AutomationRuleRepository + Send + Sync + 'static,
    MR: MirrorRuleRepository + Send + Sync + 'static,
    AL: AuditLog + Send + Sync + 'static,
{
    let rules = state.rule_service.list_mirror_rules(board_id).await?;
    Ok(MirrorResponse::Ok(Json(rules)))
}

/// `POST /api/boards/{board_id}/mirror-rules` — create a mirror rule.
pub async fn create_mirror<AR, MR, AL>(
    State(state): State<AppState<AR, MR, AL>>,
    Path(board_id): Path<BoardId>,
    Json(req): Json<CreateMirrorRuleRequest>,
) -> Result<MirrorResponse, ApiError>
where
    AR: AutomationRuleRepository + Send + Sync + 'static,
    MR: MirrorRuleRepository + Send + Sync + 'static,
    AL: AuditLog + Send + Sync + 'static,
{
    let mut rule = MirrorRule::new(
        board_id,
        req.source_list_name,
        req.target_board_id,
        req.target_list_name,
    );
    rule.direction = req.direction;
    rule.condition_field = req.condition_field;
    rule.condition_value = req.condition_value;
    rule.remove_from_source = req.remove_from_source;
    rule.is_active = req.is_active;
    let created = state.rule_service.create_mirror_rule(rule).await?;
    Ok(MirrorResponse::Created(Json(created)))
}
