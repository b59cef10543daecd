use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::Deserialize;

use super::model::{User, UserRating};
use crate::web::{AppState, PageQuery, Result, parse_id};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/user/{id}", get(get_user))
        .route("/api/users", get(list_users))
        .route("/api/users/by-name", get(get_user_by_name))
        .route("/api/users/rating", get(list_rating))
}

#[derive(Debug, Deserialize)]
pub struct ByNameQuery {
    #[serde(default)]
    pub last_name: String,
}

pub async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<User>> {
    let id = parse_id(&id)?;
    let user = state.users.get_by_id(id).await?;
    Ok(Json(user))
}

pub async fn get_user_by_name(
    State(state): State<AppState>,
    Query(query): Query<ByNameQuery>,
) -> Result<Json<User>> {
    let user = state.users.get_by_name(&query.last_name).await?;
    Ok(Json(user))
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<User>>> {
    let (limit, page) = query.parse()?;
    let users = state.users.get_all(limit, page).await?;
    Ok(Json(users))
}

pub async fn list_rating(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<UserRating>>> {
    let (limit, page) = query.parse()?;
    let rows = state.users.get_rating(limit, page).await?;
    Ok(Json(rows))
}
