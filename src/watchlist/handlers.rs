use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{
        AddToWatchlistRequest, UpdateStatusRequest, WatchlistCheck, WatchlistEntryView,
        WatchlistPage, WatchlistQuery, WatchlistStats,
    },
    services::WatchlistService,
};
use crate::{
    auth::services::AuthUser,
    error::AppResult,
    extract::{AppJson, AppPath, AppQuery},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/watchlist", get(list_watchlist).post(add_to_watchlist))
        .route("/watchlist/stats", get(watchlist_stats))
        .route("/watchlist/check/:movie_id", get(check_watchlist))
        .route("/watchlist/:movie_id", put(update_status).delete(remove_from_watchlist))
}

#[instrument(skip(svc))]
pub async fn list_watchlist(
    State(svc): State<WatchlistService>,
    AuthUser(user_id): AuthUser,
    AppQuery(query): AppQuery<WatchlistQuery>,
) -> AppResult<Json<WatchlistPage>> {
    Ok(Json(svc.list(user_id, query).await?))
}

#[instrument(skip(svc, payload))]
pub async fn add_to_watchlist(
    State(svc): State<WatchlistService>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<AddToWatchlistRequest>,
) -> AppResult<(StatusCode, Json<WatchlistEntryView>)> {
    let entry = svc.add(user_id, payload.movie_id, payload.status).await?;
    Ok((StatusCode::CREATED, Json(entry.into())))
}

#[instrument(skip(svc, payload))]
pub async fn update_status(
    State(svc): State<WatchlistService>,
    AuthUser(user_id): AuthUser,
    AppPath(movie_id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateStatusRequest>,
) -> AppResult<Json<WatchlistEntryView>> {
    let entry = svc.update_status(user_id, movie_id, payload.status).await?;
    Ok(Json(entry.into()))
}

#[instrument(skip(svc))]
pub async fn remove_from_watchlist(
    State(svc): State<WatchlistService>,
    AuthUser(user_id): AuthUser,
    AppPath(movie_id): AppPath<Uuid>,
) -> AppResult<Json<Value>> {
    svc.remove(user_id, movie_id).await?;
    Ok(Json(json!({ "message": "Removed from watchlist" })))
}

#[instrument(skip(svc))]
pub async fn check_watchlist(
    State(svc): State<WatchlistService>,
    AuthUser(user_id): AuthUser,
    AppPath(movie_id): AppPath<Uuid>,
) -> AppResult<Json<WatchlistCheck>> {
    Ok(Json(svc.check(user_id, movie_id).await?))
}

#[instrument(skip(svc))]
pub async fn watchlist_stats(
    State(svc): State<WatchlistService>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<WatchlistStats>> {
    Ok(Json(svc.stats(user_id).await?))
}
