use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use tracing::{Instrument, Span, debug};

use super::model::{CREATED_FIELD, GAME_TYPE_FIELD, Game, GamesStatistics, USER_ID_FIELD};
use crate::core::{ID_FIELD, RecordId, Result};
use crate::logging::LogHandle;
use crate::storage::{
    DocumentStore, Expr, Filter, FindOptions, Pipeline, SortOrder, Stage, with_deadline,
};

#[async_trait]
pub trait GameRepository: Send + Sync {
    async fn find_by_id(&self, id: RecordId) -> Result<Option<Game>>;
    async fn find_by_player(&self, user_id: RecordId, limit: usize, page: usize) -> Result<Vec<Game>>;
    async fn find_all(&self, limit: usize, page: usize) -> Result<Vec<Game>>;
    async fn aggregate_statistics(
        &self,
        user_id: RecordId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<GamesStatistics>;
}

/// First instant of `start` through the last instant of `end`, in UTC.
/// The last representable day ends at `NaiveDateTime::MAX`.
pub fn day_bounds(start: NaiveDate, end: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let from = start.and_time(NaiveTime::MIN).and_utc();
    let to = end
        .succ_opt()
        .map_or(NaiveDateTime::MAX, |next| {
            next.and_time(NaiveTime::MIN) - TimeDelta::nanoseconds(1)
        })
        .and_utc();
    (from, to)
}

/// Match on owner and inclusive day range, then fan out into the per-day and
/// per-(day, game type) groupings of that one filtered set.
pub fn statistics_pipeline(user_id: RecordId, start: NaiveDate, end: NaiveDate) -> Pipeline {
    let (from, to) = day_bounds(start, end);

    let by_day = vec![
        Stage::Project(vec![(
            GamesStatistics::DATE.to_string(),
            Expr::day_of(CREATED_FIELD),
        )]),
        Stage::Group {
            by: vec![GamesStatistics::DATE.to_string()],
            count_as: GamesStatistics::GAMES_PLAYED.to_string(),
        },
        Stage::Sort(vec![(GamesStatistics::DATE.to_string(), SortOrder::Ascending)]),
    ];

    let with_game_type = vec![
        Stage::Project(vec![
            (GamesStatistics::DATE.to_string(), Expr::day_of(CREATED_FIELD)),
            (GAME_TYPE_FIELD.to_string(), Expr::field(GAME_TYPE_FIELD)),
        ]),
        Stage::Group {
            by: vec![GamesStatistics::DATE.to_string(), GAME_TYPE_FIELD.to_string()],
            count_as: GamesStatistics::GAMES_PLAYED.to_string(),
        },
        Stage::Sort(vec![
            (GamesStatistics::DATE.to_string(), SortOrder::Ascending),
            (GAME_TYPE_FIELD.to_string(), SortOrder::Ascending),
        ]),
    ];

    Pipeline::new()
        .matching(Filter::eq(USER_ID_FIELD, user_id).and(Filter::between(CREATED_FIELD, from, to)))
        .facet([
            (GamesStatistics::GROUP_BY_DAY, by_day),
            (GamesStatistics::WITH_GAME_TYPE, with_game_type),
        ])
}

pub struct DocumentGameRepository {
    store: Arc<dyn DocumentStore>,
    collection: String,
    op_timeout: Duration,
    span: Span,
}

impl DocumentGameRepository {
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
            span: log.component("game_repository"),
        }
    }

    async fn find_games(&self, filter: Filter, options: FindOptions) -> Result<Vec<Game>> {
        let docs = with_deadline(
            self.op_timeout,
            self.store.find(&self.collection, &filter, &options),
        )
        .await?;
        docs.iter().map(Game::from_document).collect()
    }
}

#[async_trait]
impl GameRepository for DocumentGameRepository {
    async fn find_by_id(&self, id: RecordId) -> Result<Option<Game>> {
        async {
            let doc = with_deadline(
                self.op_timeout,
                self.store.find_one(&self.collection, &Filter::eq(ID_FIELD, id)),
            )
            .await?;
            doc.as_ref().map(Game::from_document).transpose()
        }
        .instrument(self.span.clone())
        .await
    }

    async fn find_by_player(&self, user_id: RecordId, limit: usize, page: usize) -> Result<Vec<Game>> {
        debug!(parent: &self.span, %user_id, limit, page, "find games by player");
        self.find_games(Filter::eq(USER_ID_FIELD, user_id), FindOptions::page(limit, page))
            .instrument(self.span.clone())
            .await
    }

    async fn find_all(&self, limit: usize, page: usize) -> Result<Vec<Game>> {
        self.find_games(Filter::All, FindOptions::page(limit, page))
            .instrument(self.span.clone())
            .await
    }

    async fn aggregate_statistics(
        &self,
        user_id: RecordId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<GamesStatistics> {
        debug!(parent: &self.span, %user_id, %start, %end, "aggregate games statistics");
        let pipeline = statistics_pipeline(user_id, start, end);
        let output = with_deadline(
            self.op_timeout,
            self.store.aggregate(&self.collection, &pipeline),
        )
        .instrument(self.span.clone())
        .await?;

        match output.first() {
            Some(facet) => GamesStatistics::from_facet(facet),
            None => Ok(GamesStatistics::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn day_bounds_cover_whole_days() {
        let day = NaiveDate::from_ymd_opt(2021, 6, 9).unwrap();
        let (from, to) = day_bounds(day, day);
        assert_eq!(from.date_naive(), day);
        assert_eq!(to.date_naive(), day);
        assert_eq!(to.hour(), 23);
        assert_eq!(to.nanosecond(), 999_999_999);
    }

    #[test]
    fn day_bounds_clamp_at_the_last_representable_day() {
        let (from, to) = day_bounds(NaiveDate::MIN, NaiveDate::MAX);
        assert_eq!(from.date_naive(), NaiveDate::MIN);
        assert_eq!(to.naive_utc(), NaiveDateTime::MAX);
        assert_eq!(to.date_naive(), NaiveDate::MAX);
    }

    #[test]
    fn statistics_pipeline_matches_then_fans_out() {
        let day = NaiveDate::from_ymd_opt(2021, 6, 9).unwrap();
        let pipeline = statistics_pipeline(RecordId::new(), day, day);
        pipeline.validate().unwrap();

        let (leading, rest) = pipeline.split_leading_match();
        let terms = leading.unwrap().equality_terms();
        assert_eq!(terms[0].0, USER_ID_FIELD);
        assert!(matches!(rest, [Stage::Facet(branches)] if branches.len() == 2));
    }
}
