//! # kanflow-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Accept **card events** and **list changes** from the card-mutation layer
//!   and hand them to the background dispatcher (`202 Accepted`)
//! - Serve a small JSON API for rule configuration
//!   (`/api/boards/{id}/rules`, `/api/boards/{id}/mirror-rules`, …)
//! - Expose the execution log and card activity feed read-only
//! - Map application errors into HTTP status codes and JSON bodies
//!
//! ## Dependency rule
//! Depends on `kanflow-app` (for port traits, services and the dispatcher
//! handle) and `kanflow-domain` (for request/response types). Never leaks
//! axum types into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
