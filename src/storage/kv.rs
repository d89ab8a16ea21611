use std::{path::Path, sync::Arc, sync::Mutex};

use rusqlite::{Connection, OptionalExtension, params};

use crate::{
    config,
    storage::{
        error::StoreError,
        schema::{self, columns::*, tables::*},
    },
};

/// A get/put-by-key store with last-write-wins semantics per key.
/// No listing, no transactions, no TTL.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;
}

/// Opens the key-value store described by the config.
pub fn open(config: &config::MetricsStore) -> Result<Arc<dyn KeyValueStore>, StoreError> {
    if config.in_memory {
        Ok(Arc::new(crate::storage::memory::MemoryKv::new()))
    } else {
        let path = config.path.as_ref().ok_or_else(|| {
            StoreError::Unavailable("metrics_store.path is required unless in_memory".into())
        })?;
        Ok(Arc::new(SqliteKv::open(path)?))
    }
}

/// Sqlite-backed key-value store. A single `kv` table, one row per key.
pub struct SqliteKv {
    conn: Mutex<Connection>,
}

impl SqliteKv {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::from_conn(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_conn(Connection::open_in_memory()?)
    }

    fn from_conn(conn: Connection) -> Result<Self, StoreError> {
        schema::init(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("kv connection lock poisoned: {e}")))
    }
}

impl KeyValueStore for SqliteKv {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                &format!("SELECT {VALUE} FROM {KV} WHERE {KEY} = ?1"),
                params![key],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            &format!(
                "INSERT INTO {KV} ({KEY}, {VALUE}) VALUES (?1, ?2) \
                 ON CONFLICT({KEY}) DO UPDATE SET {VALUE} = excluded.{VALUE}"
            ),
            params![key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema;

    #[test]
    fn open_in_memory_kv_initializes_schema() {
        let kv = SqliteKv::open_in_memory().unwrap();

        let conn = kv.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .unwrap();

        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect();

        for table in schema::tables::ALL_TABLES {
            assert!(tables.contains(&table.to_string()));
        }
    }

    #[test]
    fn get_missing_key_returns_none() {
        let kv = SqliteKv::open_in_memory().unwrap();

        assert_eq!(kv.get("nope").unwrap(), None);
    }

    #[test]
    fn put_then_get_roundtrips() {
        let kv = SqliteKv::open_in_memory().unwrap();

        kv.put("track-1", b"hello").unwrap();

        assert_eq!(kv.get("track-1").unwrap(), Some(b"hello".to_vec()));
    }

    #[test]
    fn second_put_wins() {
        let kv = SqliteKv::open_in_memory().unwrap();

        kv.put("track-1", b"first").unwrap();
        kv.put("track-1", b"second").unwrap();

        assert_eq!(kv.get("track-1").unwrap(), Some(b"second".to_vec()));
    }

    #[test]
    fn open_on_disk_persists_across_connections() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("metrics.db");

        {
            let kv = SqliteKv::open(&path)?;
            kv.put("track-1", b"v")?;
        }

        let kv = SqliteKv::open(&path)?;
        assert_eq!(kv.get("track-1")?, Some(b"v".to_vec()));

        Ok(())
    }
}
