use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{Instrument, Span, debug};

use super::model::{LAST_NAME_FIELD, RATING_FIELD, User};
use crate::core::{ID_FIELD, RecordId, Result};
use crate::logging::LogHandle;
use crate::storage::{DocumentStore, Filter, FindOptions, SortOrder, with_deadline};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: RecordId) -> Result<Option<User>>;
    async fn find_by_name(&self, last_name: &str) -> Result<Option<User>>;
    async fn find_all(&self, limit: usize, page: usize) -> Result<Vec<User>>;
    /// Users ordered by rating, highest first.
    async fn find_by_rating(&self, limit: usize, page: usize) -> Result<Vec<User>>;
}

pub struct DocumentUserRepository {
    store: Arc<dyn DocumentStore>,
    collection: String,
    op_timeout: Duration,
    span: Span,
}

impl DocumentUserRepository {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        collection: impl Into<String>,
        op_timeout: Duration,
        log: &LogHandle,
    ) -> Self {
        Self {
            store,
            collection: collection.into(),
            op_timeout,
            span: log.component("user_repository"),
        }
    }

    async fn find_first(&self, filter: Filter) -> Result<Option<User>> {
        let doc = with_deadline(self.op_timeout, self.store.find_one(&self.collection, &filter))
            .instrument(self.span.clone())
            .await?;
        doc.as_ref().map(User::from_document).transpose()
    }

    async fn find_users(&self, options: FindOptions) -> Result<Vec<User>> {
        let docs = with_deadline(
            self.op_timeout,
            self.store.find(&self.collection, &Filter::All, &options),
        )
        .instrument(self.span.clone())
        .await?;
        docs.iter().map(User::from_document).collect()
    }
}

#[async_trait]
impl UserRepository for DocumentUserRepository {
    async fn find_by_id(&self, id: RecordId) -> Result<Option<User>> {
        self.find_first(Filter::eq(ID_FIELD, id)).await
    }

    async fn find_by_name(&self, last_name: &str) -> Result<Option<User>> {
        debug!(parent: &self.span, last_name, "find user by last name");
        self.find_first(Filter::eq(LAST_NAME_FIELD, last_name)).await
    }

    async fn find_all(&self, limit: usize, page: usize) -> Result<Vec<User>> {
        self.find_users(FindOptions::page(limit, page)).await
    }

    async fn find_by_rating(&self, limit: usize, page: usize) -> Result<Vec<User>> {
        self.find_users(FindOptions::page(limit, page).sort_by(RATING_FIELD, SortOrder::Descending))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;
    use chrono::Utc;

    fn user(last_name: &str, rating: i64) -> User {
        User {
            id: None,
            email: format!("{}@example.com", last_name.to_lowercase()),
            last_name: last_name.into(),
            country: "NZ".into(),
            city: "Wellington".into(),
            gender: "Male".into(),
            birth_date: Utc::now(),
            rating,
        }
    }

    async fn seeded_repo() -> DocumentUserRepository {
        let store = Arc::new(InMemoryStore::new());
        store
            .insert_many(
                "users",
                vec![
                    user("Low", 3).into_document(),
                    user("High", 40).into_document(),
                    user("Mid", 12).into_document(),
                ],
            )
            .await
            .unwrap();
        DocumentUserRepository::new(store, "users", Duration::from_secs(1), &LogHandle::disabled())
    }

    #[tokio::test]
    async fn rating_order_is_descending_and_paged() {
        let repo = seeded_repo().await;

        let first: Vec<_> = repo.find_by_rating(2, 0).await.unwrap();
        let names: Vec<_> = first.iter().map(|u| u.last_name.as_str()).collect();
        assert_eq!(names, ["High", "Mid"]);

        let second = repo.find_by_rating(2, 1).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].last_name, "Low");
    }

    #[tokio::test]
    async fn lookups_by_name_and_id() {
        let repo = seeded_repo().await;

        let mid = repo.find_by_name("Mid").await.unwrap().unwrap();
        assert_eq!(mid.rating, 12);

        let id = mid.id.unwrap();
        assert_eq!(repo.find_by_id(id).await.unwrap(), Some(mid));
        assert!(repo.find_by_name("Nobody").await.unwrap().is_none());
        assert!(repo.find_by_id(RecordId::new()).await.unwrap().is_none());
    }
}
