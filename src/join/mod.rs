//! Join Module
//!
//! Relationship records keyed by `parent:child`.
//!
//! ## Responsibilities
//! - Rebuild the primary cache and the parent index from `{name}.db`
//! - Reject duplicate composite keys
//! - Keep the parent index in step with every create, update and delete
//! - Answer "all children of parent X" from memory

mod manager;
mod parent_index;

pub use manager::JoinManager;
