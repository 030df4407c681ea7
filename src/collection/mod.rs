//! Collection Module
//!
//! Identity records: one record per manager-minted UUID v7.
//!
//! ## Responsibilities
//! - Rebuild the in-memory cache from `data.db` on open
//! - Mint ids and timestamps on create
//! - Keep cache and file in step on every mutation
//! - Serve all reads from the cache

mod manager;

pub use manager::CollectionManager;
