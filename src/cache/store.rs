//! SQLite-backed cache store with live per-key subscriptions.
//!
//! One table per entity kind, each row keyed by username and stamped with
//! the epoch-millis time of the last successful remote fetch. The store is
//! the single source of truth for cached records; the sync layer writes
//! through here and never retains records across calls.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use futures::{Stream, StreamExt};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::debug;

/// The independently cached entity kinds. Each gets its own table and its
/// own staleness clock; a stale record of one kind never invalidates a
/// fresh record of another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    UserProfile,
    QuestionStatusCounts,
    ProfileCalendar,
    RecentSubmissions,
    ContestRanking,
    Badges,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::UserProfile,
        EntityKind::QuestionStatusCounts,
        EntityKind::ProfileCalendar,
        EntityKind::RecentSubmissions,
        EntityKind::ContestRanking,
        EntityKind::Badges,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::UserProfile => "user_profile",
            EntityKind::QuestionStatusCounts => "question_status",
            EntityKind::ProfileCalendar => "profile_calendar",
            EntityKind::RecentSubmissions => "recent_submissions",
            EntityKind::ContestRanking => "contest_ranking",
            EntityKind::Badges => "badges",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.table())
    }
}

/// One cached record: a payload plus the epoch-millis timestamp of the
/// fetch that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRecord<E> {
    pub user_key: String,
    pub payload: E,
    pub last_fetch_ms: i64,
}

impl<E> CacheRecord<E> {
    pub fn new(user_key: impl Into<String>, payload: E, last_fetch_ms: i64) -> Self {
        Self {
            user_key: user_key.into(),
            payload,
            last_fetch_ms,
        }
    }

    /// Age relative to `now_ms`. Clock skew yields zero, not negative.
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        (now_ms - self.last_fetch_ms).max(0)
    }

    pub fn is_fresh(&self, now_ms: i64, ttl_ms: i64) -> bool {
        now_ms - self.last_fetch_ms < ttl_ms
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode cache payload: {0}")]
    Encode(serde_json::Error),

    #[error("Failed to decode cache payload: {0}")]
    Decode(serde_json::Error),

    #[error("Cache lock poisoned")]
    LockPoisoned,

    #[error("Could not determine data directory")]
    NoDataDir,
}

// Row as stored, before payload decoding. This is what watch channels
// carry so one subscription type serves every entity kind.
#[derive(Debug, Clone)]
struct RawRecord {
    user_key: String,
    payload: String,
    last_fetch_ms: i64,
}

type WatcherKey = (EntityKind, String);

/// Durable per-entity-kind cache keyed by username.
pub struct CacheStore {
    conn: Mutex<Connection>,
    watchers: Mutex<HashMap<WatcherKey, watch::Sender<Option<RawRecord>>>>,
}

impl CacheStore {
    /// Open (or create) the cache database at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::from_connection(Connection::open(path)?)
    }

    /// Open the cache at the platform default location.
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(&Self::default_path()?)
    }

    /// Default database path under the platform data directory.
    pub fn default_path() -> Result<PathBuf, StoreError> {
        let data_dir = dirs::data_dir()
            .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
            .ok_or(StoreError::NoDataDir)?;
        Ok(data_dir.join("leetsync").join("cache.db"))
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        let store = Self {
            conn: Mutex::new(conn),
            watchers: Mutex::new(HashMap::new()),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        for kind in EntityKind::ALL {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {t} (
                     user_key TEXT PRIMARY KEY,
                     payload TEXT NOT NULL,
                     last_fetch_ms INTEGER NOT NULL
                 );
                 CREATE INDEX IF NOT EXISTS idx_{t}_last_fetch ON {t}(last_fetch_ms);",
                t = kind.table()
            ))?;
        }
        Ok(())
    }

    // ===== Point lookups =====

    fn get_raw(&self, kind: EntityKind, user_key: &str) -> Result<Option<RawRecord>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT user_key, payload, last_fetch_ms FROM {} WHERE user_key = ?1",
            kind.table()
        ))?;
        let row = stmt
            .query_row(params![user_key], |row| {
                Ok(RawRecord {
                    user_key: row.get(0)?,
                    payload: row.get(1)?,
                    last_fetch_ms: row.get(2)?,
                })
            })
            .optional()?;
        Ok(row)
    }

    /// Point lookup of the cached record for `user_key`, if any.
    pub fn get<E: DeserializeOwned>(
        &self,
        kind: EntityKind,
        user_key: &str,
    ) -> Result<Option<CacheRecord<E>>, StoreError> {
        decode_raw(self.get_raw(kind, user_key)?)
    }

    /// Live subscription to the record for `user_key`.
    ///
    /// The stream immediately yields the current value (possibly absent),
    /// then yields again after every `put`/`delete` that touches the key.
    /// Subscriptions are independent and unbounded; dropping one has no
    /// effect on others.
    pub fn get_flow<E: DeserializeOwned>(
        &self,
        kind: EntityKind,
        user_key: &str,
    ) -> Result<impl Stream<Item = Result<Option<CacheRecord<E>>, StoreError>>, StoreError> {
        // The watchers lock is held across the seeding read so a write
        // landing in between cannot be published to nobody. An existing
        // channel already reflects every committed write.
        let mut watchers = self.watchers.lock().map_err(|_| StoreError::LockPoisoned)?;
        let rx = match watchers.entry((kind, user_key.to_string())) {
            Entry::Occupied(entry) => entry.get().subscribe(),
            Entry::Vacant(entry) => {
                let current = self.get_raw(kind, user_key)?;
                entry.insert(watch::channel(current).0).subscribe()
            }
        };
        Ok(WatchStream::new(rx).map(decode_raw::<E>))
    }

    // ===== Mutations =====

    /// Upsert a record, replacing any prior record for the same key.
    pub fn put<E: Serialize>(
        &self,
        kind: EntityKind,
        record: &CacheRecord<E>,
    ) -> Result<(), StoreError> {
        let payload = serde_json::to_string(&record.payload).map_err(StoreError::Encode)?;
        {
            let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
            conn.execute(
                &format!(
                    "INSERT OR REPLACE INTO {} (user_key, payload, last_fetch_ms)
                     VALUES (?1, ?2, ?3)",
                    kind.table()
                ),
                params![record.user_key, payload, record.last_fetch_ms],
            )?;
        }
        debug!(kind = %kind, user_key = %record.user_key, "Cache write");
        self.publish(
            kind,
            &record.user_key,
            Some(RawRecord {
                user_key: record.user_key.clone(),
                payload,
                last_fetch_ms: record.last_fetch_ms,
            }),
        )
    }

    /// Delete the record for `user_key` in one table.
    pub fn delete(&self, kind: EntityKind, user_key: &str) -> Result<(), StoreError> {
        {
            let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
            conn.execute(
                &format!("DELETE FROM {} WHERE user_key = ?1", kind.table()),
                params![user_key],
            )?;
        }
        self.publish(kind, user_key, None)
    }

    /// Evict one user across every entity table, including per-year
    /// calendar records stored under `username#year` keys.
    pub fn delete_user(&self, user_key: &str) -> Result<(), StoreError> {
        // `_` and `%` are legal username characters but LIKE wildcards,
        // so the composite-key pattern must be escaped.
        let pattern = format!("{}#%", escape_like(user_key));
        {
            let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
            for kind in EntityKind::ALL {
                conn.execute(
                    &format!(
                        "DELETE FROM {} WHERE user_key = ?1 OR user_key LIKE ?2 ESCAPE '\\'",
                        kind.table()
                    ),
                    params![user_key, pattern],
                )?;
            }
        }
        let prefix = format!("{user_key}#");
        let watchers = self.watchers.lock().map_err(|_| StoreError::LockPoisoned)?;
        for ((_, key), sender) in watchers.iter() {
            if key == user_key || key.starts_with(&prefix) {
                sender.send_replace(None);
            }
        }
        Ok(())
    }

    /// Full cache clear across every entity table.
    pub fn delete_all(&self) -> Result<(), StoreError> {
        {
            let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
            for kind in EntityKind::ALL {
                conn.execute(&format!("DELETE FROM {}", kind.table()), [])?;
            }
        }
        let watchers = self.watchers.lock().map_err(|_| StoreError::LockPoisoned)?;
        for sender in watchers.values() {
            sender.send_replace(None);
        }
        Ok(())
    }

    /// Keys in one table whose last fetch predates `threshold_ms`.
    pub fn find_expired(
        &self,
        kind: EntityKind,
        threshold_ms: i64,
    ) -> Result<Vec<String>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT user_key FROM {} WHERE last_fetch_ms < ?1",
            kind.table()
        ))?;
        let keys = stmt
            .query_map(params![threshold_ms], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    // Push a new value to the watcher for (kind, key), if one is open.
    fn publish(
        &self,
        kind: EntityKind,
        user_key: &str,
        value: Option<RawRecord>,
    ) -> Result<(), StoreError> {
        let watchers = self.watchers.lock().map_err(|_| StoreError::LockPoisoned)?;
        if let Some(sender) = watchers.get(&(kind, user_key.to_string())) {
            sender.send_replace(value);
        }
        Ok(())
    }
}

// Escape LIKE metacharacters so a key is matched literally.
fn escape_like(key: &str) -> String {
    key.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn decode_raw<E: DeserializeOwned>(
    raw: Option<RawRecord>,
) -> Result<Option<CacheRecord<E>>, StoreError> {
    raw.map(|r| {
        serde_json::from_str(&r.payload)
            .map(|payload| CacheRecord {
                user_key: r.user_key,
                payload,
                last_fetch_ms: r.last_fetch_ms,
            })
            .map_err(StoreError::Decode)
    })
    .transpose()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Payload {
        score: i64,
    }

    fn record(key: &str, score: i64, at: i64) -> CacheRecord<Payload> {
        CacheRecord::new(key, Payload { score }, at)
    }

    #[test]
    fn test_put_get_roundtrip() {
        let store = CacheStore::open_in_memory().unwrap();
        store
            .put(EntityKind::UserProfile, &record("neal", 7, 1000))
            .unwrap();

        let got: CacheRecord<Payload> = store
            .get(EntityKind::UserProfile, "neal")
            .unwrap()
            .expect("record present");
        assert_eq!(got.payload, Payload { score: 7 });
        assert_eq!(got.last_fetch_ms, 1000);
    }

    #[test]
    fn test_put_replaces_prior_record() {
        let store = CacheStore::open_in_memory().unwrap();
        store
            .put(EntityKind::Badges, &record("neal", 1, 1000))
            .unwrap();
        store
            .put(EntityKind::Badges, &record("neal", 2, 2000))
            .unwrap();

        let got: CacheRecord<Payload> = store.get(EntityKind::Badges, "neal").unwrap().unwrap();
        assert_eq!(got.payload.score, 2);
        assert_eq!(got.last_fetch_ms, 2000);
    }

    #[test]
    fn test_kinds_are_isolated() {
        let store = CacheStore::open_in_memory().unwrap();
        store
            .put(EntityKind::UserProfile, &record("neal", 1, 1000))
            .unwrap();

        let other: Option<CacheRecord<Payload>> =
            store.get(EntityKind::Badges, "neal").unwrap();
        assert!(other.is_none());
    }

    #[test]
    fn test_delete_and_delete_all() {
        let store = CacheStore::open_in_memory().unwrap();
        store
            .put(EntityKind::UserProfile, &record("a", 1, 1000))
            .unwrap();
        store
            .put(EntityKind::UserProfile, &record("b", 2, 1000))
            .unwrap();

        store.delete(EntityKind::UserProfile, "a").unwrap();
        assert!(store
            .get::<Payload>(EntityKind::UserProfile, "a")
            .unwrap()
            .is_none());
        assert!(store
            .get::<Payload>(EntityKind::UserProfile, "b")
            .unwrap()
            .is_some());

        store.delete_all().unwrap();
        assert!(store
            .get::<Payload>(EntityKind::UserProfile, "b")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_delete_user_covers_calendar_year_keys() {
        let store = CacheStore::open_in_memory().unwrap();
        store
            .put(EntityKind::UserProfile, &record("neal", 1, 1000))
            .unwrap();
        store
            .put(EntityKind::ProfileCalendar, &record("neal#2024", 2, 1000))
            .unwrap();
        store
            .put(EntityKind::ProfileCalendar, &record("other#2024", 3, 1000))
            .unwrap();

        store.delete_user("neal").unwrap();

        assert!(store
            .get::<Payload>(EntityKind::UserProfile, "neal")
            .unwrap()
            .is_none());
        assert!(store
            .get::<Payload>(EntityKind::ProfileCalendar, "neal#2024")
            .unwrap()
            .is_none());
        assert!(store
            .get::<Payload>(EntityKind::ProfileCalendar, "other#2024")
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_delete_user_matches_wildcard_usernames_literally() {
        let store = CacheStore::open_in_memory().unwrap();
        store
            .put(EntityKind::ProfileCalendar, &record("john_doe#2024", 1, 1000))
            .unwrap();
        store
            .put(EntityKind::ProfileCalendar, &record("johnxdoe#2024", 2, 1000))
            .unwrap();
        store
            .put(EntityKind::ProfileCalendar, &record("100%human#2024", 3, 1000))
            .unwrap();

        // `_` in the username must not match arbitrary characters.
        store.delete_user("john_doe").unwrap();
        assert!(store
            .get::<Payload>(EntityKind::ProfileCalendar, "john_doe#2024")
            .unwrap()
            .is_none());
        assert!(store
            .get::<Payload>(EntityKind::ProfileCalendar, "johnxdoe#2024")
            .unwrap()
            .is_some());

        store.delete_user("100%human").unwrap();
        assert!(store
            .get::<Payload>(EntityKind::ProfileCalendar, "100%human#2024")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_find_expired_threshold_is_exclusive() {
        let store = CacheStore::open_in_memory().unwrap();
        store
            .put(EntityKind::UserProfile, &record("old", 1, 500))
            .unwrap();
        store
            .put(EntityKind::UserProfile, &record("edge", 2, 1000))
            .unwrap();
        store
            .put(EntityKind::UserProfile, &record("fresh", 3, 1500))
            .unwrap();

        let expired = store.find_expired(EntityKind::UserProfile, 1000).unwrap();
        assert_eq!(expired, vec!["old".to_string()]);
    }

    #[tokio::test]
    async fn test_flow_emits_current_then_updates() {
        let store = CacheStore::open_in_memory().unwrap();
        let mut flow = store
            .get_flow::<Payload>(EntityKind::UserProfile, "neal")
            .unwrap();

        // First emission is the current (absent) value.
        let first = flow.next().await.unwrap().unwrap();
        assert!(first.is_none());

        store
            .put(EntityKind::UserProfile, &record("neal", 9, 1000))
            .unwrap();
        let second = flow.next().await.unwrap().unwrap().expect("record");
        assert_eq!(second.payload.score, 9);

        store.delete(EntityKind::UserProfile, "neal").unwrap();
        let third = flow.next().await.unwrap().unwrap();
        assert!(third.is_none());
    }

    #[tokio::test]
    async fn test_late_subscription_starts_from_latest_write() {
        let store = CacheStore::open_in_memory().unwrap();
        let mut a = store
            .get_flow::<Payload>(EntityKind::UserProfile, "neal")
            .unwrap();
        assert!(a.next().await.unwrap().unwrap().is_none());

        store
            .put(EntityKind::UserProfile, &record("neal", 6, 1000))
            .unwrap();

        // A subscription opened after the write must begin at that write,
        // not at the pre-write row.
        let mut b = store
            .get_flow::<Payload>(EntityKind::UserProfile, "neal")
            .unwrap();
        let first = b.next().await.unwrap().unwrap().expect("record");
        assert_eq!(first.payload.score, 6);
    }

    #[tokio::test]
    async fn test_subscriptions_are_independent() {
        let store = CacheStore::open_in_memory().unwrap();
        let mut a = store
            .get_flow::<Payload>(EntityKind::UserProfile, "neal")
            .unwrap();
        let b = store
            .get_flow::<Payload>(EntityKind::UserProfile, "neal")
            .unwrap();

        assert!(a.next().await.unwrap().unwrap().is_none());
        drop(b);

        // Closing one subscription must not affect the other.
        store
            .put(EntityKind::UserProfile, &record("neal", 4, 1000))
            .unwrap();
        let update = a.next().await.unwrap().unwrap().expect("record");
        assert_eq!(update.payload.score, 4);
    }
}
