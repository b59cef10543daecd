use std::sync::Arc;

use tracing::{Span, debug};

use super::model::{User, UserRating};
use super::repository::UserRepository;
use crate::core::RecordId;
use crate::logging::LogHandle;
use crate::web::{Result, WebError};

pub struct UserService {
    repo: Arc<dyn UserRepository>,
    span: Span,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>, log: &LogHandle) -> Self {
        Self {
            repo,
            span: log.component("user_service"),
        }
    }

    pub async fn get_by_id(&self, id: RecordId) -> Result<User> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| WebError::not_found("user not found"))
    }

    pub async fn get_by_name(&self, last_name: &str) -> Result<User> {
        let last_name = last_name.trim();
        if last_name.is_empty() {
            return Err(WebError::validation("last_name query parameter is required"));
        }
        self.repo
            .find_by_name(last_name)
            .await?
            .ok_or_else(|| WebError::not_found("user not found"))
    }

    pub async fn get_all(&self, limit: usize, page: usize) -> Result<Vec<User>> {
        let users = self.repo.find_all(limit, page).await?;
        if users.is_empty() {
            return Err(WebError::not_found("no users on this page"));
        }
        Ok(users)
    }

    pub async fn get_rating(&self, limit: usize, page: usize) -> Result<Vec<UserRating>> {
        let users = self.repo.find_by_rating(limit, page).await?;
        if users.is_empty() {
            return Err(WebError::not_found("no users on this page"));
        }
        debug!(parent: &self.span, limit, page, rows = users.len(), "rating page");
        Ok(users.into_iter().map(UserRating::from).collect())
    }
}
