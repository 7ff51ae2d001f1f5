//! # kanflow-domain
//!
//! Pure domain model for the kanflow automation and mirroring engine.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Boards** and the objects rules refer to by name (lists, labels, custom fields)
//! - Define **Cards** and their **Placements** (including mirror placements)
//! - Define **Automation rules** (trigger → action) and the pure trigger matcher
//! - Define **Mirror rules** and forward/reverse route resolution
//! - Define the append-only **audit** records
//! - Provide the static **default rule templates** per board type
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod audit;
pub mod automation;
pub mod board;
pub mod card;
pub mod mirror;
pub mod templates;
