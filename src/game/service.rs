use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{Span, info};

use super::model::{Game, GamesStatistics};
use super::repository::GameRepository;
use crate::core::RecordId;
use crate::logging::LogHandle;
use crate::web::{Result, WebError};

pub struct GameService {
    repo: Arc<dyn GameRepository>,
    span: Span,
}

impl GameService {
    pub fn new(repo: Arc<dyn GameRepository>, log: &LogHandle) -> Self {
        Self {
            repo,
            span: log.component("game_service"),
        }
    }

    pub async fn get_by_id(&self, id: RecordId) -> Result<Game> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| WebError::not_found("game not found"))
    }

    pub async fn get_by_player(&self, user_id: RecordId, limit: usize, page: usize) -> Result<Vec<Game>> {
        let games = self.repo.find_by_player(user_id, limit, page).await?;
        if games.is_empty() {
            return Err(WebError::not_found("no games for this player"));
        }
        Ok(games)
    }

    pub async fn get_all(&self, limit: usize, page: usize) -> Result<Vec<Game>> {
        let games = self.repo.find_all(limit, page).await?;
        if games.is_empty() {
            return Err(WebError::not_found("no games on this page"));
        }
        Ok(games)
    }

    /// An empty aggregation is reported as not found, so callers can tell
    /// "nothing matched" apart from a successful result.
    pub async fn get_statistics(
        &self,
        user_id: RecordId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<GamesStatistics> {
        if start > end {
            return Err(WebError::validation("startDate should not be after endDate"));
        }

        let stats = self.repo.aggregate_statistics(user_id, start, end).await?;
        if stats.is_empty() {
            return Err(WebError::not_found("no games in the requested range"));
        }

        info!(
            parent: &self.span,
            %user_id,
            days = stats.group_by_day.len(),
            games = stats.total_by_day(),
            "games statistics computed"
        );
        Ok(stats)
    }
}
