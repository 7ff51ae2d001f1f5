//! Append-only execution log and activity feed.

use std::future::Future;

use kanflow_domain::audit::{ActivityEntry, ExecutionLogEntry};
use kanflow_domain::error::KanflowError;
use kanflow_domain::id::{BoardId, CardId};

/// Append-only store for automation executions and card activity.
pub trait AuditLog {
    fn append_execution(
        &self,
        entry: ExecutionLogEntry,
    ) -> impl Future<Output = Result<(), KanflowError>> + Send;

    fn append_activity(
        &self,
        entry: ActivityEntry,
    ) -> impl Future<Output = Result<(), KanflowError>> + Send;

    /// Newest first, at most `limit` entries.
    fn recent_executions(
        &self,
        board_id: BoardId,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<ExecutionLogEntry>, KanflowError>> + Send;

    /// Newest first, at most `limit` entries.
    fn activity_for_card(
        &self,
        card_id: CardId,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<ActivityEntry>, KanflowError>> + Send;
}
