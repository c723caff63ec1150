//! Durable local cache for synchronized profile data.
//!
//! This module provides the `CacheStore`: one SQLite table per entity
//! kind, keyed by username, with each record stamped by its last
//! successful fetch time. Consumers can take point lookups or live
//! `get_flow` subscriptions that re-emit on every write to the key.

pub mod store;

pub use store::{CacheRecord, CacheStore, EntityKind, StoreError};
