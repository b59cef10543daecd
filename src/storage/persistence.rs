//! Store snapshots: a MessagePack image of every collection, written
//! atomically so a crashed save never leaves a torn file behind.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::collection::Collection;
use super::memory::InMemoryStore;
use crate::core::{Result, StoreError};

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub collections: Vec<Collection>,
}

impl StoreSnapshot {
    pub fn new(collections: Vec<Collection>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            created_at: Utc::now(),
            collections,
        }
    }

    pub fn document_count(&self) -> usize {
        self.collections.iter().map(Collection::len).sum()
    }
}

pub struct SnapshotManager {
    snapshot_path: PathBuf,
}

impl SnapshotManager {
    pub fn new<P: AsRef<Path>>(snapshot_path: P) -> Self {
        Self {
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.snapshot_path
    }

    pub fn exists(&self) -> bool {
        self.snapshot_path.exists()
    }

    pub fn save(&self, snapshot: &StoreSnapshot) -> Result<()> {
        let dir = match self.snapshot_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let serialized = rmp_serde::to_vec(snapshot)
            .map_err(|e| StoreError::Serialization(format!("Failed to serialize snapshot: {}", e)))?;

        let mut temp = tempfile::NamedTempFile::new_in(&dir)?;
        temp.write_all(&serialized)?;
        temp.as_file().sync_all()?;
        temp.persist(&self.snapshot_path)
            .map_err(|e| StoreError::IoError(format!("Failed to persist snapshot: {}", e)))?;
        Ok(())
    }

    pub fn load(&self) -> Result<StoreSnapshot> {
        let bytes = std::fs::read(&self.snapshot_path)?;
        let snapshot: StoreSnapshot = rmp_serde::from_slice(&bytes).map_err(|e| {
            StoreError::Serialization(format!("Failed to deserialize snapshot: {}", e))
        })?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StoreError::Serialization(format!(
                "Unsupported snapshot version {} (expected {})",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }
        Ok(snapshot)
    }

    /// Writes the current contents of `store`. Returns the document count.
    pub async fn save_store(&self, store: &InMemoryStore) -> Result<usize> {
        let snapshot = StoreSnapshot::new(store.export().await);
        let count = snapshot.document_count();
        let manager = Self::new(&self.snapshot_path);
        tokio::task::spawn_blocking(move || manager.save(&snapshot))
            .await
            .map_err(|e| StoreError::IoError(format!("Snapshot writer failed: {}", e)))??;
        Ok(count)
    }

    /// Replaces the contents of `store` with the snapshot. Returns the
    /// document count.
    pub async fn load_into(&self, store: &InMemoryStore) -> Result<usize> {
        let manager = Self::new(&self.snapshot_path);
        let snapshot = tokio::task::spawn_blocking(move || manager.load())
            .await
            .map_err(|e| StoreError::IoError(format!("Snapshot reader failed: {}", e)))??;
        let count = snapshot.document_count();
        store.restore(snapshot.collections).await;
        Ok(count)
    }
}
