//! Shared application state for axum handlers.

use std::sync::Arc;

use kanflow_app::dispatcher::DispatcherHandle;
use kanflow_app::ports::{AuditLog, AutomationRuleRepository, MirrorRuleRepository};
use kanflow_app::services::rule_service::RuleService;

/// Application state shared across all axum handlers.
///
/// Generic over the rule repositories and the audit log to avoid dynamic
/// dispatch. `Clone` is implemented manually so the underlying types do not
/// need to be `Clone`; only the `Arc` wrappers and the queue handle are cloned.
pub struct AppState<AR, MR, AL> {
    /// Producer side of the background event queue.
    pub dispatcher: DispatcherHandle,
    /// Automation and mirror rule configuration.
    pub rule_service: Arc<RuleService<AR, MR>>,
    /// Read access to the execution and activity logs.
    pub audit_log: Arc<AL>,
}

impl<AR, MR, AL> Clone for AppState<AR, MR, AL> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: self.dispatcher.clone(),
            rule_service: Arc::clone(&self.rule_service),
            audit_log: Arc::clone(&self.audit_log),
        }
    }
}

impl<AR, MR, AL> AppState<AR, MR, AL>
where
    AR: AutomationRuleRepository + Send + Sync + 'static,
    MR: MirrorRuleRepository + Send + Sync + 'static,
    AL: AuditLog + Send + Sync + 'static,
{
    /// Create a new application state.
    pub fn new(
        dispatcher: DispatcherHandle,
        rule_service: RuleService<AR, MR>,
        audit_log: AL,
    ) -> Self {
        Self {
            dispatcher,
            rule_service: Arc::new(rule_service),
            audit_log: Arc::new(audit_log),
        }
    }
}
