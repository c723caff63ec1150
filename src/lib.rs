//! leetsync - data-sync core for a LeetCode profile dashboard.
//!
//! The crate keeps a durable local cache of public profile data for any
//! set of usernames and reconciles it with the remote GraphQL service:
//!
//! - `api`: anonymous GraphQL client and the `RemoteFetcher` trait
//! - `cache`: SQLite-backed `CacheStore` with live `get_flow` subscriptions
//! - `sync`: TTL-driven `SyncCoordinator` producing `Outcome` values
//! - `paging`: cursor-based `PagingEngine` over the problem catalog
//! - `models`: domain types and their wire-response wrappers
//!
//! All data is fetched anonymously by username; there is no write path
//! to the remote service.

pub mod api;
pub mod cache;
pub mod models;
pub mod outcome;
pub mod paging;
pub mod sync;

pub use api::{ApiError, LeetCodeClient, RemoteFetcher};
pub use cache::{CacheRecord, CacheStore, EntityKind, StoreError};
pub use outcome::Outcome;
pub use paging::{PagingEngine, PagingSnapshot};
pub use sync::{SyncConfig, SyncCoordinator};
