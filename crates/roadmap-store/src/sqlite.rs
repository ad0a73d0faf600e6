//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend for the roadmap engine. It uses
//! rusqlite with bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::debug;

use roadmap_core::{CreatedOrder, Feature, FeatureId, Title, VoteOutcome, VoterId};

use crate::error::{Result, StoreError};
use crate::migration::{self, now_millis, CREATED_ORDER_COUNTER};
use crate::traits::Store;

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime, and every mutation runs inside an
/// immediate transaction so it lands completely or not at all.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;",
        )?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking operation on the connection off the async runtime.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Unavailable(format!("mutex poisoned: {}", e)))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("spawn_blocking failed: {}", e)))?
    }
}

/// Raw `features` row before validation.
struct FeatureRow {
    id: Vec<u8>,
    title: String,
    score: i64,
    released: bool,
    created_order: i64,
}

const SELECT_FEATURE: &str =
    "SELECT feature_id, title, score, released, created_order FROM features";

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FeatureRow> {
    Ok(FeatureRow {
        id: row.get("feature_id")?,
        title: row.get("title")?,
        score: row.get("score")?,
        released: row.get("released")?,
        created_order: row.get("created_order")?,
    })
}

fn decode_id(bytes: &[u8]) -> Result<FeatureId> {
    FeatureId::try_from(bytes)
        .map_err(|_| StoreError::InvalidData(format!("feature_id has {} bytes", bytes.len())))
}

// Helper to turn a row plus its voters into a Feature
fn build_feature(row: FeatureRow, voters: BTreeSet<VoterId>) -> Result<Feature> {
    let id = decode_id(&row.id)?;

    if row.score < 0 || row.score as usize != voters.len() {
        return Err(StoreError::InvalidData(format!(
            "feature {} has score {} but {} voters",
            id,
            row.score,
            voters.len()
        )));
    }

    let title = Title::parse(row.title)
        .map_err(|e| StoreError::InvalidData(format!("feature {}: {}", id, e)))?;

    let order = u64::try_from(row.created_order).map_err(|_| {
        StoreError::InvalidData(format!(
            "feature {} has negative created_order {}",
            id, row.created_order
        ))
    })?;

    Ok(Feature::restore(
        id,
        title,
        CreatedOrder::from_raw(order),
        row.released,
        voters,
    ))
}

fn load_feature(conn: &Connection, id: &FeatureId) -> Result<Option<Feature>> {
    let row = conn
        .query_row(
            &format!("{SELECT_FEATURE} WHERE feature_id = ?1"),
            params![id.as_bytes().as_slice()],
            read_row,
        )
        .optional()?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut stmt = conn.prepare("SELECT voter FROM feature_voters WHERE feature_id = ?1")?;
    let voters = stmt
        .query_map(params![id.as_bytes().as_slice()], |row| {
            row.get::<_, String>(0)
        })?
        .map(|voter| voter.map(VoterId::from_normalized))
        .collect::<rusqlite::Result<BTreeSet<_>>>()?;

    build_feature(row, voters).map(Some)
}

/// Allocate the next creation order and insert an empty feature row.
fn insert_feature(conn: &Connection, title: &Title) -> Result<FeatureId> {
    conn.execute(
        "UPDATE counters SET value = value + 1 WHERE name = ?1",
        params![CREATED_ORDER_COUNTER],
    )?;
    let order: i64 = conn.query_row(
        "SELECT value FROM counters WHERE name = ?1",
        params![CREATED_ORDER_COUNTER],
        |row| row.get(0),
    )?;

    let mut id = FeatureId::generate();
    while conn
        .query_row(
            "SELECT 1 FROM features WHERE feature_id = ?1",
            params![id.as_bytes().as_slice()],
            |_| Ok(()),
        )
        .optional()?
        .is_some()
    {
        id = FeatureId::generate();
    }

    conn.execute(
        "INSERT INTO features (feature_id, title, score, released, created_order, created_at)
         VALUES (?1, ?2, 0, 0, ?3, ?4)",
        params![id.as_bytes().as_slice(), title.as_str(), order, now_millis()],
    )?;

    Ok(id)
}

/// Set-union-or-noop. Returns whether the voter was new.
fn insert_voter(conn: &Connection, id: &FeatureId, voter: &VoterId) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO feature_voters (feature_id, voter, voted_at) VALUES (?1, ?2, ?3)",
        params![id.as_bytes().as_slice(), voter.as_str(), now_millis()],
    )?;

    if inserted == 0 {
        return Ok(false);
    }

    conn.execute(
        "UPDATE features SET score = score + 1 WHERE feature_id = ?1",
        params![id.as_bytes().as_slice()],
    )?;
    Ok(true)
}

fn feature_exists(conn: &Connection, id: &FeatureId) -> Result<bool> {
    Ok(conn
        .query_row(
            "SELECT 1 FROM features WHERE feature_id = ?1",
            params![id.as_bytes().as_slice()],
            |_| Ok(()),
        )
        .optional()?
        .is_some())
}

/// Re-read a feature that must exist inside the current transaction.
fn reload(conn: &Connection, id: &FeatureId) -> Result<Feature> {
    load_feature(conn, id)?.ok_or(StoreError::NotFound(*id))
}

#[async_trait]
impl Store for SqliteStore {
    async fn create_feature(&self, title: &Title) -> Result<Feature> {
        let title = title.clone();

        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let id = insert_feature(&tx, &title)?;
            let feature = reload(&tx, &id)?;
            tx.commit()?;
            Ok(feature)
        })
        .await
    }

    async fn create_feature_with_vote(&self, title: &Title, creator: &VoterId) -> Result<Feature> {
        let title = title.clone();
        let creator = creator.clone();

        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let id = insert_feature(&tx, &title)?;
            insert_voter(&tx, &id, &creator)?;
            let feature = reload(&tx, &id)?;
            tx.commit()?;
            Ok(feature)
        })
        .await
    }

    async fn get_feature(&self, id: &FeatureId) -> Result<Option<Feature>> {
        let id = *id;

        self.run(move |conn| {
            // The row and its voters must come from the same snapshot; another
            // connection may commit a vote between the two reads.
            let tx = conn.transaction()?;
            let feature = load_feature(&tx, &id)?;
            tx.commit()?;
            Ok(feature)
        })
        .await
    }

    async fn list_features(&self) -> Result<Vec<Feature>> {
        self.run(|conn| {
            // One read transaction so features and voters come from the same snapshot.
            let tx = conn.transaction()?;

            let mut voters: HashMap<Vec<u8>, BTreeSet<VoterId>> = HashMap::new();
            {
                let mut stmt = tx.prepare("SELECT feature_id, voter FROM feature_voters")?;
                let rows = stmt.query_map([], |row| {
                    Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, String>(1)?))
                })?;
                for row in rows {
                    let (feature_id, voter) = row?;
                    voters
                        .entry(feature_id)
                        .or_default()
                        .insert(VoterId::from_normalized(voter));
                }
            }

            let rows = tx
                .prepare(SELECT_FEATURE)?
                .query_map([], read_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            let features = rows
                .into_iter()
                .map(|row| {
                    let set = voters.remove(&row.id).unwrap_or_default();
                    build_feature(row, set)
                })
                .collect::<Result<Vec<_>>>()?;

            tx.commit()?;
            Ok(features)
        })
        .await
    }

    async fn feature_count(&self) -> Result<usize> {
        self.run(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM features", [], |row| row.get(0))?;
            Ok(count as usize)
        })
        .await
    }

    async fn add_voter(&self, id: &FeatureId, voter: &VoterId) -> Result<Option<VoteOutcome>> {
        let id = *id;
        let voter = voter.clone();

        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            if !feature_exists(&tx, &id)? {
                return Ok(None);
            }

            let added = insert_voter(&tx, &id, &voter)?;
            let feature = reload(&tx, &id)?;
            tx.commit()?;

            debug!(feature_id = %id, score = feature.score(), added, "sqlite add_voter");

            Ok(Some(VoteOutcome {
                already_voted: !added,
                feature,
            }))
        })
        .await
    }

    async fn set_released(&self, id: &FeatureId, released: bool) -> Result<Option<Feature>> {
        let id = *id;

        self.run(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let changed = tx.execute(
                "UPDATE features SET released = ?2 WHERE feature_id = ?1",
                params![id.as_bytes().as_slice(), released],
            )?;
            if changed == 0 {
                return Ok(None);
            }

            let feature = reload(&tx, &id)?;
            tx.commit()?;
            Ok(Some(feature))
        })
        .await
    }

    async fn flush_all(&self) -> Result<()> {
        self.run(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            tx.execute("DELETE FROM feature_voters", [])?;
            tx.execute("DELETE FROM features", [])?;
            tx.execute(
                "UPDATE counters SET value = 0 WHERE name = ?1",
                params![CREATED_ORDER_COUNTER],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title(s: &str) -> Title {
        Title::parse(s).unwrap()
    }

    fn voter(s: &str) -> VoterId {
        VoterId::from_normalized(s)
    }

    #[tokio::test]
    async fn test_create_and_get_feature() {
        let store = SqliteStore::open_memory().unwrap();

        let created = store.create_feature(&title("Dark mode")).await.unwrap();
        assert_eq!(created.score(), 0);
        assert!(!created.is_released());
        assert_eq!(created.created_order(), CreatedOrder::FIRST);

        let retrieved = store.get_feature(&created.id()).await.unwrap().unwrap();
        assert_eq!(retrieved, created);
    }

    #[tokio::test]
    async fn test_create_with_vote_is_never_zero() {
        let store = SqliteStore::open_memory().unwrap();

        let f = store
            .create_feature_with_vote(&title("Dark mode"), &voter("10.0.0.1"))
            .await
            .unwrap();
        assert_eq!(f.score(), 1);
        assert!(f.has_voted(&voter("10.0.0.1")));
    }

    #[tokio::test]
    async fn test_idempotent_vote() {
        let store = SqliteStore::open_memory().unwrap();
        let f = store.create_feature(&title("Dark mode")).await.unwrap();

        let first = store.add_voter(&f.id(), &voter("a")).await.unwrap().unwrap();
        assert!(!first.already_voted);
        assert_eq!(first.score(), 1);

        let second = store.add_voter(&f.id(), &voter("a")).await.unwrap().unwrap();
        assert!(second.already_voted);
        assert_eq!(second.score(), 1);

        let third = store.add_voter(&f.id(), &voter("b")).await.unwrap().unwrap();
        assert!(!third.already_voted);
        assert_eq!(third.score(), 2);
    }

    #[tokio::test]
    async fn test_missing_feature() {
        let store = SqliteStore::open_memory().unwrap();
        let id = FeatureId::from_bytes([7; 16]);

        assert!(store.get_feature(&id).await.unwrap().is_none());
        assert!(store.add_voter(&id, &voter("a")).await.unwrap().is_none());
        assert!(store.set_released(&id, true).await.unwrap().is_none());
        assert_eq!(store.feature_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_release_flag() {
        let store = SqliteStore::open_memory().unwrap();
        let f = store.create_feature(&title("Dark mode")).await.unwrap();

        let released = store.set_released(&f.id(), true).await.unwrap().unwrap();
        assert!(released.is_released());
        let again = store.set_released(&f.id(), true).await.unwrap().unwrap();
        assert!(again.is_released());
        let back = store.set_released(&f.id(), false).await.unwrap().unwrap();
        assert!(!back.is_released());
    }

    #[tokio::test]
    async fn test_list_features_includes_voters() {
        let store = SqliteStore::open_memory().unwrap();
        let a = store
            .create_feature_with_vote(&title("a"), &voter("x"))
            .await
            .unwrap();
        let b = store.create_feature(&title("b")).await.unwrap();
        store.add_voter(&a.id(), &voter("y")).await.unwrap();

        let mut all = store.list_features().await.unwrap();
        all.sort_by_key(|f| f.created_order());

        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id(), a.id());
        assert_eq!(all[0].score(), 2);
        assert_eq!(all[1].id(), b.id());
        assert_eq!(all[1].score(), 0);
    }

    #[tokio::test]
    async fn test_flush_resets_counter() {
        let store = SqliteStore::open_memory().unwrap();
        let a = store.create_feature(&title("a")).await.unwrap();
        let b = store.create_feature(&title("b")).await.unwrap();
        assert!(a.created_order() < b.created_order());

        store.flush_all().await.unwrap();
        store.flush_all().await.unwrap();
        assert!(store.list_features().await.unwrap().is_empty());

        let c = store.create_feature(&title("c")).await.unwrap();
        assert_eq!(c.created_order(), CreatedOrder::FIRST);
        assert_ne!(c.id(), a.id());
        assert_ne!(c.id(), b.id());
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roadmap.db");

        let id = {
            let store = SqliteStore::open(&path).unwrap();
            let f = store
                .create_feature_with_vote(&title("Persist me"), &voter("a"))
                .await
                .unwrap();
            store.create_feature(&title("second")).await.unwrap();
            f.id()
        };

        let store = SqliteStore::open(&path).unwrap();
        let f = store.get_feature(&id).await.unwrap().unwrap();
        assert_eq!(f.title().as_str(), "Persist me");
        assert_eq!(f.score(), 1);

        // Counter continues rather than restarting on reopen.
        let third = store.create_feature(&title("third")).await.unwrap();
        assert_eq!(third.created_order(), CreatedOrder::from_raw(3));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_get_feature_is_consistent_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roadmap.db");

        let writer = SqliteStore::open(&path).unwrap();
        let reader = SqliteStore::open(&path).unwrap();

        let f = writer
            .create_feature_with_vote(&title("Contended"), &voter("creator"))
            .await
            .unwrap();
        let id = f.id();

        const VOTES: usize = 500;
        let votes = tokio::spawn(async move {
            for i in 0..VOTES {
                writer
                    .add_voter(&id, &voter(&format!("10.0.{}.{}", i / 256, i % 256)))
                    .await
                    .unwrap();
            }
        });

        let mut last = 0;
        while !votes.is_finished() {
            let seen = reader.get_feature(&id).await.unwrap().unwrap();
            assert!(seen.score() >= last);
            last = seen.score();
        }
        votes.await.unwrap();

        let done = reader.get_feature(&id).await.unwrap().unwrap();
        assert_eq!(done.score(), VOTES as u64 + 1);
    }
}
