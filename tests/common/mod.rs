#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use user_game_api::core::{Document, RecordId, Result, StoreError};
use user_game_api::seed::GameTemplate;
use user_game_api::storage::{DocumentStore, Filter, FindOptions, InMemoryStore, Pipeline};
use user_game_api::user::User;

pub const USERS: &str = "users";
pub const GAMES: &str = "user_games";

pub fn users(n: usize) -> Vec<User> {
    (0..n)
        .map(|i| User {
            id: None,
            email: format!("player{i}@example.com"),
            last_name: format!("Player{i}"),
            country: "Ukraine".into(),
            city: "Kyiv".into(),
            gender: if i % 2 == 0 { "Female" } else { "Male" }.into(),
            birth_date: Utc.with_ymd_and_hms(1990, 1, 1 + (i % 28) as u32, 0, 0, 0).unwrap(),
            rating: 0,
        })
        .collect()
}

pub fn templates() -> Vec<GameTemplate> {
    vec![
        GameTemplate {
            points_gained: 10,
            win_status: 1,
            game_type: 1,
            created: "1/5/2021 9:30 AM".into(),
        },
        GameTemplate {
            points_gained: -3,
            win_status: 0,
            game_type: 2,
            created: "6-1-2021".into(),
        },
        GameTemplate {
            points_gained: 25,
            win_status: 1,
            game_type: 3,
            created: "1/7/2021".into(),
        },
    ]
}

/// Wraps an in-memory store and records how many `insert_many` calls
/// overlap. Each insert is held open for `hold` before it runs.
pub struct InstrumentedStore {
    pub inner: InMemoryStore,
    pub hold: Duration,
    pub in_flight: AtomicUsize,
    pub peak: AtomicUsize,
    pub fail_inserts_into: Option<String>,
}

impl InstrumentedStore {
    pub fn new(hold: Duration) -> Self {
        Self {
            inner: InMemoryStore::new(),
            hold,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            fail_inserts_into: None,
        }
    }

    pub fn failing_on(collection: &str) -> Self {
        Self {
            fail_inserts_into: Some(collection.to_string()),
            ..Self::new(Duration::from_millis(1))
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for InstrumentedStore {
    async fn insert_many(&self, collection: &str, documents: Vec<Document>) -> Result<Vec<RecordId>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.hold).await;

        let outcome = if self.fail_inserts_into.as_deref() == Some(collection) {
            Err(StoreError::IoError("disk full".into()))
        } else {
            self.inner.insert_many(collection, documents).await
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>> {
        self.inner.find_one(collection, filter).await
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>> {
        self.inner.find(collection, filter, options).await
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<usize> {
        self.inner.count(collection, filter).await
    }

    async fn update_one(&self, collection: &str, id: RecordId, set: Document) -> Result<()> {
        self.inner.update_one(collection, id, set).await
    }

    async fn create_index(&self, collection: &str, field: &str) -> Result<bool> {
        self.inner.create_index(collection, field).await
    }

    async fn aggregate(&self, collection: &str, pipeline: &Pipeline) -> Result<Vec<Document>> {
        self.inner.aggregate(collection, pipeline).await
    }
}
