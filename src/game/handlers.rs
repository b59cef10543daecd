use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use chrono::NaiveDate;
use serde::Deserialize;

use super::model::{Game, GamesStatistics};
use crate::core::RecordId;
use crate::web::{AppState, PageQuery, Result, WebError, parse_id, parse_positive};

/// Accepted `startDate`/`endDate` layout, e.g. `2-1-2006` or `02-01-2006`.
pub const STATISTICS_DATE_FORMAT: &str = "%d-%m-%Y";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/game/{id}", get(get_game))
        .route("/api/games", get(list_games))
        .route("/api/games/by-player", get(list_games_by_player))
        .route("/api/games-statistics", get(get_games_statistics))
}

#[derive(Debug, Deserialize)]
pub struct ByPlayerQuery {
    pub user_id: Option<String>,
    #[serde(flatten)]
    pub page: PageQuery,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsQuery {
    pub user_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

pub async fn get_game(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Game>> {
    let id = parse_id(&id)?;
    let game = state.games.get_by_id(id).await?;
    Ok(Json(game))
}

pub async fn list_games(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<Game>>> {
    let (limit, page) = query.parse()?;
    let games = state.games.get_all(limit, page).await?;
    Ok(Json(games))
}

pub async fn list_games_by_player(
    State(state): State<AppState>,
    Query(query): Query<ByPlayerQuery>,
) -> Result<Json<Vec<Game>>> {
    let user_id = required_id(query.user_id.as_deref(), "user_id")?;
    let limit = parse_positive("limit", query.page.limit.as_deref())?;
    let page = parse_positive("page", query.page.page.as_deref())?;
    let games = state.games.get_by_player(user_id, limit, page).await?;
    Ok(Json(games))
}

pub async fn get_games_statistics(
    State(state): State<AppState>,
    Query(query): Query<StatisticsQuery>,
) -> Result<Json<GamesStatistics>> {
    let user_id = required_id(query.user_id.as_deref(), "userId")?;
    let start = parse_date("startDate", query.start_date.as_deref())?;
    let end = parse_date("endDate", query.end_date.as_deref())?;
    if start > end {
        return Err(WebError::validation("startDate should not be after endDate"));
    }

    let stats = state.games.get_statistics(user_id, start, end).await?;
    Ok(Json(stats))
}

fn required_id(raw: Option<&str>, name: &str) -> Result<RecordId> {
    match raw {
        Some(raw) if !raw.trim().is_empty() => parse_id(raw),
        _ => Err(WebError::validation(format!("{name} query parameter is required"))),
    }
}

pub fn parse_date(name: &str, raw: Option<&str>) -> Result<NaiveDate> {
    let raw = raw
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .ok_or_else(|| WebError::validation(format!("{name} query parameter is required")))?;
    NaiveDate::parse_from_str(raw, STATISTICS_DATE_FORMAT).map_err(|_| {
        WebError::validation(format!(
            "Invalid {name} format, please use dd-mm-yyyy format"
        ))
    })
}
