//! # kanflow-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the repository port traits defined in `kanflow-app::ports`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//! - Keep the read-modify-write paths (field increments, mirror inserts)
//!   atomic at the statement level
//!
//! ## Dependency rule
//! Depends on `kanflow-app` (for port traits) and `kanflow-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod codec;

pub mod audit_log;
pub mod board_repo;
pub mod card_repo;
pub mod error;
pub mod mirror_rule_repo;
pub mod placement_repo;
pub mod pool;
pub mod rule_repo;

#[cfg(test)]
mod test_support;

pub use audit_log::SqliteAuditLog;
pub use board_repo::SqliteBoardRepository;
pub use card_repo::SqliteCardRepository;
pub use error::StorageError;
pub use mirror_rule_repo::SqliteMirrorRuleRepository;
pub use placement_repo::SqlitePlacementRepository;
pub use pool::{Config, Database};
pub use rule_repo::SqliteAutomationRuleRepository;
