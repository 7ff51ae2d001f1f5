//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod events;
#[allow(clippy::missing_errors_doc)]
pub mod logs;
#[allow(clippy::missing_errors_doc)]
pub mod rules;

use axum::Router;
use axum::routing::{delete, get, post};

use kanflow_app::ports::{AuditLog, AutomationRuleRepository, MirrorRuleRepository};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<AR, MR, AL>() -> Router<AppState<AR, MR, AL>>
where
    AR: AutomationRuleRepository + Send + Sync + 'static,
    MR: MirrorRuleRepository + Send + Sync + 'static,
    AL: AuditLog + Send + Sync + 'static,
{
    Router::new()
        // Event ingestion
        .route(
            "/boards/{board_id}/events",
            post(events::trigger::<AR, MR, AL>),
        )
        .route(
            "/boards/{board_id}/cards/{card_id}/list-changes",
            post(events::list_change::<AR, MR, AL>),
        )
        // Logs
        .route(
            "/boards/{board_id}/automation-log",
            get(logs::automation_log::<AR, MR, AL>),
        )
        .route("/cards/{card_id}/activity", get(logs::activity::<AR, MR, AL>))
        // Automation rules
        .route(
            "/boards/{board_id}/rules",
            get(rules::list::<AR, MR, AL>).post(rules::create::<AR, MR, AL>),
        )
        .route(
            "/boards/{board_id}/rules/defaults",
            post(rules::install_defaults::<AR, MR, AL>),
        )
        .route("/rules/{rule_id}", delete(rules::delete::<AR, MR, AL>))
        // Mirror rules
        .route(
            "/boards/{board_id}/mirror-rules",
            get(rules::list_mirrors::<AR, MR, AL>).post(rules::create_mirror::<AR, MR, AL>),
        )
}
