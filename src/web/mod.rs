//! HTTP surface: one router over the user and game services.
//!
//! Every handler answers errors with a JSON `{error, code}` body, see
//! [`WebError`].

pub mod error;
pub mod state;

use axum::{Json, Router, routing::get};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::core::RecordId;
use crate::{game, user};

pub use error::{ErrorResponse, Result, WebError};
pub use state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .merge(user::handlers::routes())
        .merge(game::handlers::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn healthcheck() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Raw `limit`/`page` query pair. Kept as strings so malformed numbers are
/// reported through [`WebError`] rather than the extractor's plain-text
/// rejection.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<String>,
    pub page: Option<String>,
}

impl PageQuery {
    pub fn parse(&self) -> Result<(usize, usize)> {
        Ok((
            parse_non_negative("limit", self.limit.as_deref())?,
            parse_non_negative("page", self.page.as_deref())?,
        ))
    }
}

pub fn parse_id(raw: &str) -> Result<RecordId> {
    raw.trim()
        .parse()
        .map_err(|_| WebError::validation(format!("invalid id: {}", raw)))
}

pub fn parse_non_negative(name: &str, raw: Option<&str>) -> Result<usize> {
    let raw = raw
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .ok_or_else(|| WebError::validation(format!("{name} query parameter is required")))?;
    let value: i64 = raw
        .parse()
        .map_err(|_| WebError::validation(format!("{name} must be an integer")))?;
    usize::try_from(value)
        .map_err(|_| WebError::validation(format!("{name} should not be negative")))
}

pub fn parse_positive(name: &str, raw: Option<&str>) -> Result<usize> {
    match parse_non_negative(name, raw)? {
        0 => Err(WebError::validation(format!("{name} must be greater than zero"))),
        value => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_parameters_reject_negative_and_garbage() {
        let ok = PageQuery {
            limit: Some("10".into()),
            page: Some("0".into()),
        };
        assert_eq!(ok.parse().unwrap(), (10, 0));

        let negative = PageQuery {
            limit: Some("-1".into()),
            page: Some("0".into()),
        };
        assert!(matches!(negative.parse(), Err(WebError::Validation(_))));

        assert!(matches!(
            PageQuery::default().parse(),
            Err(WebError::Validation(_))
        ));
        assert!(parse_non_negative("limit", Some("ten")).is_err());
        assert!(parse_positive("page", Some("0")).is_err());
        assert_eq!(parse_positive("page", Some("2")).unwrap(), 2);
    }

    #[test]
    fn ids_must_be_well_formed() {
        let id = RecordId::new();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
        assert!(matches!(parse_id("nope"), Err(WebError::Validation(_))));
    }
}
