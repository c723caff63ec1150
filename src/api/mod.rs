//! GraphQL client module for the LeetCode query service.
//!
//! This module provides the `RemoteFetcher` abstraction and the
//! `LeetCodeClient` implementation used to fetch profile, activity,
//! contest, and problem-list data.
//!
//! The service is queried anonymously by username; there is no
//! authentication surface.

pub mod client;
pub mod error;
pub mod queries;

pub use client::{LeetCodeClient, RemoteFetcher};
pub use error::ApiError;
