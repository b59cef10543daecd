use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::collection::{Collection, FindOptions};
use super::engine::DocumentStore;
use super::filter::Filter;
use super::pipeline::{self, Pipeline};
use crate::core::{Document, RecordId, Result, StoreError};

/// In-process document store.
///
/// Every collection sits behind its own lock, so writers to different
/// collections never wait on each other; the outer map lock is only held
/// long enough to resolve a collection handle.
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, Arc<RwLock<Collection>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    async fn existing(&self, name: &str) -> Option<Arc<RwLock<Collection>>> {
        self.collections.read().await.get(name).cloned()
    }

    async fn get_or_create(&self, name: &str) -> Arc<RwLock<Collection>> {
        if let Some(handle) = self.existing(name).await {
            return handle;
        }
        let mut collections = self.collections.write().await;
        collections
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(Collection::new(name))))
            .clone()
    }

    pub async fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Copies out every collection, e.g. for a snapshot.
    pub async fn export(&self) -> Vec<Collection> {
        let handles: Vec<Arc<RwLock<Collection>>> =
            self.collections.read().await.values().cloned().collect();
        let mut out = Vec::with_capacity(handles.len());
        for handle in handles {
            out.push(handle.read().await.clone());
        }
        out.sort_by(|a, b| a.name().cmp(b.name()));
        out
    }

    /// Replaces the store contents with `collections`.
    pub async fn restore(&self, collections: Vec<Collection>) {
        let mut map = self.collections.write().await;
        map.clear();
        for mut collection in collections {
            collection.rebuild_indexes();
            map.insert(
                collection.name().to_string(),
                Arc::new(RwLock::new(collection)),
            );
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn insert_many(&self, collection: &str, documents: Vec<Document>) -> Result<Vec<RecordId>> {
        let handle = self.get_or_create(collection).await;
        let mut guard = handle.write().await;
        guard.insert_many(documents)
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>> {
        let options = FindOptions {
            limit: Some(1),
            ..FindOptions::default()
        };
        Ok(self.find(collection, filter, &options).await?.into_iter().next())
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>> {
        match self.existing(collection).await {
            Some(handle) => handle.read().await.find(filter, options),
            None => Ok(Vec::new()),
        }
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<usize> {
        match self.existing(collection).await {
            Some(handle) => handle.read().await.count(filter),
            None => Ok(0),
        }
    }

    async fn update_one(&self, collection: &str, id: RecordId, set: Document) -> Result<()> {
        let handle = self
            .existing(collection)
            .await
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        let updated = handle.write().await.update(&id, set)?;
        if !updated {
            return Err(StoreError::not_found(collection, id));
        }
        Ok(())
    }

    async fn create_index(&self, collection: &str, field: &str) -> Result<bool> {
        let handle = self.get_or_create(collection).await;
        let created = handle.write().await.create_index(field);
        Ok(created)
    }

    async fn aggregate(&self, collection: &str, pipeline: &Pipeline) -> Result<Vec<Document>> {
        pipeline.validate()?;
        let (leading, rest) = pipeline.split_leading_match();
        let filter = leading.cloned().unwrap_or(Filter::All);

        // Only the filtered set leaves the lock; later stages run unlocked.
        let input = self.find(collection, &filter, &FindOptions::default()).await?;
        pipeline::execute(rest, input)
    }
}
