//! SQLite storage backend.
//!
//! Persists aggregate rows, applied-event markers, and cursors to a single
//! SQLite file. Uses `sqlx` with WAL mode for concurrent read performance.
//! Row payloads are JSON (decimal strings for 256-bit amounts) so totals
//! never lose precision in the database.
//!
//! Each `apply` runs as one transaction: marker check, row merge, marker
//! insert. Correctness of the read-modify-write relies on the
//! single-writer-per-indexer model of the consumer loop.
//!
//! # Usage
//! ```rust,no_run
//! use agoraindex_storage::sqlite::SqliteStorage;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // File-backed (persistent)
//! let store = SqliteStorage::open("./agora.db").await?;
//!
//! // In-memory (tests / ephemeral)
//! let store = SqliteStorage::in_memory().await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use agoraindex_core::{
    AggregateRow, AggregateStore, ApplyOutcome, Cursor, CursorStore, EntityKind, EntityUpsert,
    StoreError,
};

/// SQLite-backed aggregate + cursor storage.
pub struct SqliteStorage {
    pool: SqlitePool,
}

fn map_err(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            StoreError::Connection(e.to_string())
        }
        _ => StoreError::Backend(e.to_string()),
    }
}

impl SqliteStorage {
    /// Open (or create) a SQLite database at `path`.
    ///
    /// The path may be a plain file path (`"./agora.db"`) or a full SQLite
    /// URL (`"sqlite:./agora.db?mode=rwc"`).
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        let url = if path.starts_with("sqlite:") {
            path.to_string()
        } else {
            format!("sqlite:{path}?mode=rwc")
        };

        let pool = SqlitePool::connect(&url).await.map_err(map_err)?;
        let storage = Self { pool };
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Open an in-memory SQLite database.
    ///
    /// All data is lost when the pool is dropped. Ideal for tests.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .map_err(map_err)?;
        let storage = Self { pool };
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Create tables and enable WAL mode.
    async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query("PRAGMA journal_mode=WAL;")
            .execute(&self.pool)
            .await
            .map_err(map_err)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS aggregates (
                entity     TEXT    NOT NULL,
                row_key    TEXT    NOT NULL,
                fields_json TEXT   NOT NULL,
                updated_at INTEGER NOT NULL,
                PRIMARY KEY (entity, row_key)
            );",
        )
        .execute(&self.pool)
        .await
        .map_err(map_err)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS applied_events (
                event_id TEXT NOT NULL,
                entity   TEXT NOT NULL,
                row_key  TEXT NOT NULL,
                PRIMARY KEY (event_id, entity, row_key)
            );",
        )
        .execute(&self.pool)
        .await
        .map_err(map_err)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS cursors (
                indexer_id   TEXT    PRIMARY KEY,
                block_number INTEGER NOT NULL,
                block_hash   TEXT    NOT NULL,
                updated_at   INTEGER NOT NULL
            );",
        )
        .execute(&self.pool)
        .await
        .map_err(map_err)?;

        Ok(())
    }

    /// Total number of materialized rows across all entities.
    pub async fn row_count(&self) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM aggregates")
            .fetch_one(&self.pool)
            .await
            .map_err(map_err)?;
        let cnt: i64 = row.get("cnt");
        Ok(cnt as u64)
    }
}

// ─── AggregateStore impl ─────────────────────────────────────────────────────

#[async_trait]
impl AggregateStore for SqliteStorage {
    async fn apply(&self, upsert: &EntityUpsert) -> Result<ApplyOutcome, StoreError> {
        let event_id = upsert.event_id();
        let entity = upsert.entity.as_str();

        let mut tx = self.pool.begin().await.map_err(map_err)?;

        let seen = sqlx::query(
            "SELECT 1 FROM applied_events
             WHERE event_id = ? AND entity = ? AND row_key = ?",
        )
        .bind(&event_id)
        .bind(entity)
        .bind(&upsert.key)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_err)?;
        if seen.is_some() {
            return Ok(ApplyOutcome::Duplicate);
        }

        let existing = sqlx::query(
            "SELECT fields_json FROM aggregates WHERE entity = ? AND row_key = ?",
        )
        .bind(entity)
        .bind(&upsert.key)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_err)?;

        let mut row: AggregateRow = match existing {
            Some(r) => {
                let json: String = r.get("fields_json");
                serde_json::from_str(&json)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?
            }
            None => AggregateRow::new(),
        };
        row.merge(upsert);
        row.updated_at = chrono::Utc::now().timestamp();

        let json = serde_json::to_string(&row)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        sqlx::query(
            "INSERT INTO aggregates (entity, row_key, fields_json, updated_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT (entity, row_key)
             DO UPDATE SET fields_json = excluded.fields_json,
                           updated_at  = excluded.updated_at",
        )
        .bind(entity)
        .bind(&upsert.key)
        .bind(&json)
        .bind(row.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_err)?;

        sqlx::query(
            "INSERT INTO applied_events (event_id, entity, row_key) VALUES (?, ?, ?)",
        )
        .bind(&event_id)
        .bind(entity)
        .bind(&upsert.key)
        .execute(&mut *tx)
        .await
        .map_err(map_err)?;

        tx.commit().await.map_err(map_err)?;

        debug!(entity, key = %upsert.key, event = %event_id, "upsert applied");
        Ok(ApplyOutcome::Applied)
    }

    async fn fetch(
        &self,
        entity: EntityKind,
        key: &str,
    ) -> Result<Option<AggregateRow>, StoreError> {
        let row = sqlx::query(
            "SELECT fields_json FROM aggregates WHERE entity = ? AND row_key = ?",
        )
        .bind(entity.as_str())
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?;

        match row {
            Some(r) => {
                let json: String = r.get("fields_json");
                let parsed = serde_json::from_str(&json)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }
}

// ─── CursorStore impl ────────────────────────────────────────────────────────

#[async_trait]
impl CursorStore for SqliteStorage {
    async fn load(&self, indexer_id: &str) -> Result<Option<Cursor>, StoreError> {
        let row = sqlx::query(
            "SELECT block_number, block_hash, updated_at
             FROM cursors WHERE indexer_id = ?",
        )
        .bind(indexer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_err)?;

        Ok(row.map(|r| Cursor {
            block_number: r.get::<i64, _>("block_number") as u64,
            block_hash: r.get("block_hash"),
            updated_at: r.get("updated_at"),
        }))
    }

    async fn save(&self, indexer_id: &str, cursor: &Cursor) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT OR REPLACE INTO cursors
             (indexer_id, block_number, block_hash, updated_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(indexer_id)
        .bind(cursor.block_number as i64)
        .bind(&cursor.block_hash)
        .bind(cursor.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_err)?;

        debug!(indexer_id, block = cursor.block_number, "cursor saved");
        Ok(())
    }

    async fn delete(&self, indexer_id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM cursors WHERE indexer_id = ?")
            .bind(indexer_id)
            .execute(&self.pool)
            .await
            .map_err(map_err)?;
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use agoraindex_codec::{EventPosition, U256};
    use agoraindex_core::StoreValue;

    fn deposit(block: u64, idx: u32, amount: u64) -> EntityUpsert {
        EntityUpsert::new(
            EntityKind::ContractState,
            "0xc",
            EventPosition::new(block, idx),
        )
        .add("total_deposited", U256::from_u64(amount))
    }

    // ── AggregateStore ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn apply_and_fetch_roundtrip() {
        let store = SqliteStorage::in_memory().await.unwrap();
        store.apply(&deposit(10, 0, 500)).await.unwrap();
        store.apply(&deposit(10, 1, 300)).await.unwrap();

        let row = store
            .fetch(EntityKind::ContractState, "0xc")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.amount("total_deposited").to_decimal_string(), "800");
        assert_eq!(store.row_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn replayed_upsert_is_a_duplicate() {
        let store = SqliteStorage::in_memory().await.unwrap();
        let up = deposit(10, 0, 500);

        assert_eq!(store.apply(&up).await.unwrap(), ApplyOutcome::Applied);
        assert_eq!(store.apply(&up).await.unwrap(), ApplyOutcome::Duplicate);

        let row = store
            .fetch(EntityKind::ContractState, "0xc")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.amount("total_deposited").to_decimal_string(), "500");
    }

    #[tokio::test]
    async fn set_versions_survive_persistence() {
        let store = SqliteStorage::in_memory().await.unwrap();
        let later = EntityUpsert::new(
            EntityKind::UserProfile,
            "0x5",
            EventPosition::new(20, 0),
        )
        .set("latest_score", StoreValue::Amount(U256::from_u64(90)));
        let earlier = EntityUpsert::new(
            EntityKind::UserProfile,
            "0x5",
            EventPosition::new(10, 0),
        )
        .set("latest_score", StoreValue::Amount(U256::from_u64(40)));

        store.apply(&later).await.unwrap();
        // stale write arrives after a round-trip through the database
        store.apply(&earlier).await.unwrap();

        let row = store
            .fetch(EntityKind::UserProfile, "0x5")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.amount("latest_score").to_decimal_string(), "90");
    }

    #[tokio::test]
    async fn huge_amounts_roundtrip_without_precision_loss() {
        let store = SqliteStorage::in_memory().await.unwrap();
        let big = U256 { low: 5, high: 2 };
        let up = EntityUpsert::new(
            EntityKind::ContractState,
            "0xc",
            EventPosition::new(1, 0),
        )
        .add("total_deposited", big);
        store.apply(&up).await.unwrap();

        let row = store
            .fetch(EntityKind::ContractState, "0xc")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            row.amount("total_deposited").to_decimal_string(),
            big.to_decimal_string()
        );
    }

    #[tokio::test]
    async fn entities_do_not_collide_on_key() {
        let store = SqliteStorage::in_memory().await.unwrap();
        let pos = EventPosition::new(1, 0);
        store
            .apply(
                &EntityUpsert::new(EntityKind::ContractState, "0xsame", pos)
                    .add("total_deposited", U256::from_u64(1)),
            )
            .await
            .unwrap();
        store
            .apply(
                &EntityUpsert::new(EntityKind::UserProfile, "0xsame", pos)
                    .add("total_deposited", U256::from_u64(2)),
            )
            .await
            .unwrap();

        assert_eq!(store.row_count().await.unwrap(), 2);
        let user = store
            .fetch(EntityKind::UserProfile, "0xsame")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.amount("total_deposited").to_decimal_string(), "2");
    }

    // ── CursorStore ───────────────────────────────────────────────────────────

    #[tokio::test]
    async fn cursor_roundtrip() {
        let store = SqliteStorage::in_memory().await.unwrap();
        assert!(store.load("topics").await.unwrap().is_none());

        let cursor = Cursor::new(1_000, "0xabc");
        store.save("topics", &cursor).await.unwrap();

        let loaded = store.load("topics").await.unwrap().unwrap();
        assert_eq!(loaded.block_number, 1_000);
        assert_eq!(loaded.block_hash, "0xabc");
    }

    #[tokio::test]
    async fn cursor_upsert_overwrites() {
        let store = SqliteStorage::in_memory().await.unwrap();
        store.save("idx", &Cursor::new(100, "0xold")).await.unwrap();
        store.save("idx", &Cursor::new(200, "0xnew")).await.unwrap();

        let loaded = store.load("idx").await.unwrap().unwrap();
        assert_eq!(loaded.block_number, 200);
        assert_eq!(loaded.block_hash, "0xnew");
    }

    #[tokio::test]
    async fn cursor_delete() {
        let store = SqliteStorage::in_memory().await.unwrap();
        store.save("idx", &Cursor::new(500, "0xdef")).await.unwrap();
        store.delete("idx").await.unwrap();
        assert!(store.load("idx").await.unwrap().is_none());
    }
}
