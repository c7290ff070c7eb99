use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::directory::{OccupationDirectory, OccupationError};
use super::search::{SearchOutcome, SearchSessions, DEFAULT_SEARCH_LIMIT};
use super::source::TableSource;

/// Header carrying the client's search-as-you-type session id.
pub const SEARCH_SESSION_HEADER: &str = "x-search-session";

const MAX_SEARCH_LIMIT: usize = 100;

pub struct OccupationRoutes<S> {
    pub directory: Arc<OccupationDirectory<S>>,
    pub sessions: Arc<SearchSessions<S>>,
}

impl<S> Clone for OccupationRoutes<S> {
    fn clone(&self) -> Self {
        Self {
            directory: self.directory.clone(),
            sessions: self.sessions.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub limit: Option<usize>,
}

/// Public occupation lookup, search and checklist endpoints.
pub fn occupation_router<S>(routes: OccupationRoutes<S>) -> Router
where
    S: TableSource + 'static,
{
    Router::new()
        .route("/api/v1/occupations", get(search_handler::<S>))
        .route("/api/v1/occupations/:code", get(lookup_handler::<S>))
        .route("/api/v1/checklists/:subclass", get(checklist_handler::<S>))
        .with_state(routes)
}

pub(crate) async fn lookup_handler<S>(
    State(routes): State<OccupationRoutes<S>>,
    Path(code): Path<String>,
) -> Response
where
    S: TableSource + 'static,
{
    match routes.directory.lookup(&code).await {
        Ok(found) => (StatusCode::OK, Json(found)).into_response(),
        Err(err) => occupation_error_response(&err),
    }
}

pub(crate) async fn search_handler<S>(
    State(routes): State<OccupationRoutes<S>>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> Response
where
    S: TableSource + 'static,
{
    let limit = params
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .min(MAX_SEARCH_LIMIT);

    let session_id = headers
        .get(SEARCH_SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    let outcome = match session_id {
        Some(id) => routes.sessions.session(id).search(&params.q, limit).await,
        None => routes
            .directory
            .search(&params.q, limit)
            .await
            .map(|hits| SearchOutcome::Current { ticket: 0, hits }),
    };

    match outcome {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => occupation_error_response(&err),
    }
}

pub(crate) async fn checklist_handler<S>(
    State(routes): State<OccupationRoutes<S>>,
    Path(subclass): Path<String>,
) -> Response
where
    S: TableSource + 'static,
{
    match routes.directory.checklist(&subclass).await {
        Ok(checklist) => (StatusCode::OK, Json(checklist)).into_response(),
        Err(err) => occupation_error_response(&err),
    }
}

pub fn occupation_error_response(err: &OccupationError) -> Response {
    let payload = json!({ "error": err.to_string() });
    (err.status_code(), Json(payload)).into_response()
}
