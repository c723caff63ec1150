//! Cache/remote reconciliation.
//!
//! `SyncCoordinator` applies one TTL-driven policy to every entity kind:
//! serve fresh cache without touching the network, otherwise fetch and
//! write through, and degrade to stale cache data when the remote fails
//! while any cached record exists. Storage failures are never swallowed.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::api::{ApiError, RemoteFetcher};
use crate::cache::{CacheRecord, CacheStore, EntityKind, StoreError};
use crate::models::{
    BadgeCollection, ContestRanking, ProfileCalendar, QuestionStatusCounts, RecentSubmissions,
    UserProfile,
};
use crate::outcome::Outcome;

/// Consider cached data stale after 1 hour unless overridden per kind.
/// Balances freshness with reducing unnecessary API calls for
/// slowly-changing data.
const DEFAULT_TTL_MINUTES: u64 = 60;

/// Default number of recent submissions to request.
const DEFAULT_SUBMISSION_LIMIT: u32 = 15;

/// Per-entity-kind TTL configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub default_ttl: Duration,
    pub submission_limit: u32,
    overrides: HashMap<EntityKind, Duration>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(DEFAULT_TTL_MINUTES * 60),
            submission_limit: DEFAULT_SUBMISSION_LIMIT,
            overrides: HashMap::new(),
        }
    }
}

impl SyncConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the TTL for one entity kind.
    pub fn with_ttl(mut self, kind: EntityKind, ttl: Duration) -> Self {
        self.overrides.insert(kind, ttl);
        self
    }

    pub fn ttl(&self, kind: EntityKind) -> Duration {
        self.overrides.get(&kind).copied().unwrap_or(self.default_ttl)
    }

    fn ttl_ms(&self, kind: EntityKind) -> i64 {
        self.ttl(kind).as_millis() as i64
    }
}

/// Outcome of a `clean_expired_cache` sweep. Deletions are attempted
/// independently; failures are collected, never thrown.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub deleted: Vec<(EntityKind, String)>,
    pub failures: Vec<SweepFailure>,
}

#[derive(Debug)]
pub struct SweepFailure {
    pub kind: EntityKind,
    pub user_key: String,
    pub message: String,
}

/// Reconciles the remote query service with the local cache, one entity
/// kind at a time. Calls for different user keys are independent;
/// concurrent misses for the same (kind, key) serialize on a per-key
/// guard so only one remote call and one write-through happen.
pub struct SyncCoordinator<F> {
    fetcher: Arc<F>,
    store: Arc<CacheStore>,
    config: SyncConfig,
    in_flight: Mutex<HashMap<(EntityKind, String), Arc<Mutex<()>>>>,
}

impl<F: RemoteFetcher> SyncCoordinator<F> {
    pub fn new(fetcher: Arc<F>, store: Arc<CacheStore>, config: SyncConfig) -> Self {
        Self {
            fetcher,
            store,
            config,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Direct access to the underlying store, for raw cached snapshots
    /// and `get_flow` subscriptions.
    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    // ===== Per-entity sync operations =====

    pub async fn user_profile(&self, username: &str) -> Outcome<UserProfile> {
        self.sync_entity(EntityKind::UserProfile, username, || {
            self.fetcher.fetch_user_profile(username)
        })
        .await
    }

    pub async fn question_counts(&self, username: &str) -> Outcome<QuestionStatusCounts> {
        self.sync_entity(EntityKind::QuestionStatusCounts, username, || {
            self.fetcher.fetch_question_counts(username)
        })
        .await
    }

    /// Calendars are cached per year: a year-scoped fetch lives under its
    /// own `username#year` record and ages independently.
    pub async fn profile_calendar(
        &self,
        username: &str,
        year: Option<i32>,
    ) -> Outcome<ProfileCalendar> {
        let key = match year {
            Some(year) => format!("{username}#{year}"),
            None => username.to_string(),
        };
        self.sync_entity(EntityKind::ProfileCalendar, &key, || {
            self.fetcher.fetch_profile_calendar(username, year)
        })
        .await
    }

    pub async fn recent_submissions(
        &self,
        username: &str,
        limit: Option<u32>,
    ) -> Outcome<RecentSubmissions> {
        let limit = limit.unwrap_or(self.config.submission_limit);
        self.sync_entity(EntityKind::RecentSubmissions, username, || {
            self.fetcher.fetch_recent_submissions(username, limit)
        })
        .await
    }

    pub async fn contest_ranking(&self, username: &str) -> Outcome<ContestRanking> {
        self.sync_entity(EntityKind::ContestRanking, username, || {
            self.fetcher.fetch_contest_ranking(username)
        })
        .await
    }

    pub async fn badges(&self, username: &str) -> Outcome<BadgeCollection> {
        self.sync_entity(EntityKind::Badges, username, || {
            self.fetcher.fetch_badges(username)
        })
        .await
    }

    // ===== Maintenance =====

    /// Evict one user's records across every entity kind.
    pub fn evict_user(&self, username: &str) -> Result<(), StoreError> {
        self.store.delete_user(username)
    }

    /// Clear the whole cache.
    pub fn clear_cache(&self) -> Result<(), StoreError> {
        self.store.delete_all()
    }

    /// Delete every record older than `threshold_ms` across all entity
    /// kinds. One failed deletion never aborts the rest of the sweep.
    pub fn clean_expired_cache(&self, threshold_ms: i64) -> SweepReport {
        let mut report = SweepReport::default();
        for kind in EntityKind::ALL {
            let keys = match self.store.find_expired(kind, threshold_ms) {
                Ok(keys) => keys,
                Err(e) => {
                    warn!(kind = %kind, error = %e, "Expiry scan failed");
                    report.failures.push(SweepFailure {
                        kind,
                        user_key: "*".to_string(),
                        message: e.to_string(),
                    });
                    continue;
                }
            };
            for key in keys {
                match self.store.delete(kind, &key) {
                    Ok(()) => report.deleted.push((kind, key)),
                    Err(e) => report.failures.push(SweepFailure {
                        kind,
                        user_key: key,
                        message: e.to_string(),
                    }),
                }
            }
        }
        debug!(
            deleted = report.deleted.len(),
            failed = report.failures.len(),
            "Expired cache sweep complete"
        );
        report
    }

    // ===== Core policy =====

    /// The one reconciliation algorithm, instantiated per entity kind:
    /// fresh cache hit short-circuits; a miss or stale record fetches and
    /// writes through; a remote failure degrades to stale cache data when
    /// any record exists. The write commits only after a fully-formed
    /// payload, so a cancelled fetch leaves no partial record behind.
    async fn sync_entity<E, Fut>(
        &self,
        kind: EntityKind,
        user_key: &str,
        fetch: impl FnOnce() -> Fut,
    ) -> Outcome<E>
    where
        E: Serialize + DeserializeOwned + Clone,
        Fut: Future<Output = Result<E, ApiError>>,
    {
        let ttl_ms = self.config.ttl_ms(kind);

        match self.store.get::<E>(kind, user_key) {
            Ok(Some(record)) if record.is_fresh(Utc::now().timestamp_millis(), ttl_ms) => {
                debug!(kind = %kind, user_key, "Cache hit");
                return Outcome::success(record.payload);
            }
            Ok(_) => {}
            Err(e) => return Outcome::error(e.to_string()),
        }

        let guard = self.flight_guard(kind, user_key).await;
        // Every path must fall through to release_guard below, or the
        // in_flight map leaks the (kind, key) entry.
        let outcome = {
            let _held = guard.lock().await;

            // A concurrent call may have refreshed this key while we
            // waited on the guard.
            match self.store.get::<E>(kind, user_key) {
                Err(e) => Outcome::error(e.to_string()),
                Ok(Some(record))
                    if record.is_fresh(Utc::now().timestamp_millis(), ttl_ms) =>
                {
                    Outcome::success(record.payload)
                }
                Ok(cached) => match fetch().await {
                    Ok(payload) => {
                        let record =
                            CacheRecord::new(user_key, payload, Utc::now().timestamp_millis());
                        match self.store.put(kind, &record) {
                            Ok(()) => Outcome::success(record.payload),
                            Err(e) => Outcome::Error {
                                message: e.to_string(),
                                last_known: Some(record.payload),
                            },
                        }
                    }
                    Err(e) => match cached {
                        Some(record) => {
                            warn!(kind = %kind, user_key, error = %e, "Remote failed, serving stale cache");
                            Outcome::stale(record.payload)
                        }
                        None => Outcome::error(e.to_string()),
                    },
                },
            }
        };
        self.release_guard(kind, user_key).await;
        outcome
    }

    async fn flight_guard(&self, kind: EntityKind, user_key: &str) -> Arc<Mutex<()>> {
        let mut map = self.in_flight.lock().await;
        map.entry((kind, user_key.to_string()))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn release_guard(&self, kind: EntityKind, user_key: &str) {
        let mut map = self.in_flight.lock().await;
        let key = (kind, user_key.to_string());
        // Drop the map entry once no other caller holds a clone.
        if map.get(&key).is_some_and(|g| Arc::strong_count(g) <= 2) {
            map.remove(&key);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
