// ============================================================================
// RedbStorage — durable key/value tier (redb)
// ============================================================================
// One table, one write transaction per mutation. Values are UTF-8 payloads
// stored as bytes.
// Default path: ~/.modbot/memory.redb (override via MODBOT_DB_PATH env var)
// ============================================================================

use redb::{Database, ReadableTable, TableDefinition};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::StorageAdapter;
use crate::types::{MemoryError, MemoryResult};

const KV: TableDefinition<&str, &[u8]> = TableDefinition::new("kv");

/// Environment variable overriding the database location
pub const DEFAULT_DB_PATH_ENV: &str = "MODBOT_DB_PATH";

/// File name used under ~/.modbot when no path is given
pub const DEFAULT_DB_FILE: &str = "memory.redb";

/// Durable storage backed by an embedded redb database
pub struct RedbStorage {
    db: Database,
    path: PathBuf,
}

impl RedbStorage {
    /// Open (or create) the database at the given path.
    /// If `path` is None, uses MODBOT_DB_PATH env var or ~/.modbot/memory.redb
    pub fn open(path: Option<&str>) -> MemoryResult<Self> {
        let db_path = if let Some(p) = path {
            PathBuf::from(p)
        } else if let Ok(env_path) = std::env::var(DEFAULT_DB_PATH_ENV) {
            PathBuf::from(env_path)
        } else {
            let home = dirs::home_dir()
                .ok_or_else(|| MemoryError::storage("Cannot determine home directory"))?;
            let modbot_dir = home.join(".modbot");
            std::fs::create_dir_all(&modbot_dir).map_err(|e| {
                MemoryError::storage(format!("Failed to create .modbot directory: {}", e))
            })?;
            modbot_dir.join(DEFAULT_DB_FILE)
        };

        Self::open_at(db_path)
    }

    /// Open (or create) the database at an explicit location
    pub fn open_at(path: impl AsRef<Path>) -> MemoryResult<Self> {
        let db_path = path.as_ref().to_path_buf();
        info!("Opening memory database at: {}", db_path.display());

        let db = Database::create(&db_path)
            .map_err(|e| MemoryError::storage(format!("Failed to open database: {}", e)))?;

        // Ensure the table exists so first reads don't fail
        let write_txn = db
            .begin_write()
            .map_err(|e| MemoryError::storage(format!("Failed to begin write: {}", e)))?;
        {
            let _ = write_txn
                .open_table(KV)
                .map_err(|e| MemoryError::storage(format!("Failed to create kv table: {}", e)))?;
        }
        write_txn
            .commit()
            .map_err(|e| MemoryError::storage(format!("Failed to commit init: {}", e)))?;

        Ok(Self { db, path: db_path })
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StorageAdapter for RedbStorage {
    fn get(&self, key: &str) -> MemoryResult<Option<String>> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| MemoryError::storage(format!("Failed to begin read: {}", e)))?;
        let table = read_txn
            .open_table(KV)
            .map_err(|e| MemoryError::storage(format!("Failed to open kv table: {}", e)))?;

        let bytes = match table
            .get(key)
            .map_err(|e| MemoryError::storage(format!("Failed to get {}: {}", key, e)))?
        {
            Some(value) => value.value().to_vec(),
            None => return Ok(None),
        };

        String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| MemoryError::malformed(format!("Value for {} is not UTF-8: {}", key, e)))
    }

    fn set(&self, key: &str, value: &str) -> MemoryResult<()> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| MemoryError::storage(format!("Failed to begin write: {}", e)))?;
        {
            let mut table = write_txn
                .open_table(KV)
                .map_err(|e| MemoryError::storage(format!("Failed to open kv table: {}", e)))?;
            table
                .insert(key, value.as_bytes())
                .map_err(|e| MemoryError::storage(format!("Failed to insert {}: {}", key, e)))?;
        }
        write_txn
            .commit()
            .map_err(|e| MemoryError::storage(format!("Failed to commit: {}", e)))?;

        debug!("Stored {} ({} bytes)", key, value.len());
        Ok(())
    }

    fn remove(&self, key: &str) -> MemoryResult<()> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| MemoryError::storage(format!("Failed to begin write: {}", e)))?;
        let removed;
        {
            let mut table = write_txn
                .open_table(KV)
                .map_err(|e| MemoryError::storage(format!("Failed to open kv table: {}", e)))?;
            removed = table
                .remove(key)
                .map_err(|e| MemoryError::storage(format!("Failed to remove {}: {}", key, e)))?
                .is_some();
        }
        write_txn
            .commit()
            .map_err(|e| MemoryError::storage(format!("Failed to commit delete: {}", e)))?;

        if removed {
            debug!("Removed {}", key);
        }
        Ok(())
    }
}
