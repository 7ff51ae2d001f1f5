//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod audit_log;
pub mod board_repo;
pub mod card_repo;
pub mod placement_repo;
pub mod rule_repo;

pub use audit_log::AuditLog;
pub use board_repo::BoardRepository;
pub use card_repo::CardRepository;
pub use placement_repo::PlacementRepository;
pub use rule_repo::{AutomationRuleRepository, MirrorRuleRepository};
