//! # kanflow-app
//!
//! Application layer — the automation runtime and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `AutomationRuleRepository` / `MirrorRuleRepository` — rule configuration
//!   - `BoardRepository` — boards, lists, labels, custom field definitions
//!   - `CardRepository` — cards, labels, assignees, custom field values
//!   - `PlacementRepository` — primary and mirror placements
//!   - `AuditLog` — append-only execution log and activity feed
//! - Run the engine:
//!   - `ActionExecutor` — perform one rule's action
//!   - `AutomationEngine` — evaluate a board's rules for an event
//!   - `MirrorSynchronizer` — create and clean up mirror placements
//!   - `CardEventHandler` — route card events and list changes
//!   - `Dispatcher` — bounded background queue in front of the handler
//! - Provide the `RuleService` use-case for rule management
//!
//! ## Dependency rule
//! Depends on `kanflow-domain` only (plus `tokio::sync` for the queue).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod action_executor;
pub mod automation_engine;
pub mod card_events;
pub mod dispatcher;
pub mod mirror_sync;
pub mod ports;
pub mod services;

#[cfg(test)]
mod testing;
