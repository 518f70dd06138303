use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{
        EditReviewRequest, HelpfulResponse, ReviewListQuery, ReviewPage, ReviewView,
        SubmitReviewRequest,
    },
    services::ReviewService,
};
use crate::{
    auth::services::AuthUser,
    error::AppResult,
    extract::{AppJson, AppPath, AppQuery},
    state::AppState,
};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/reviews/movie/:movie_id", get(list_movie_reviews))
        .route("/reviews/user/:user_id", get(list_user_reviews))
        .route("/reviews/:review_id/helpful", post(mark_helpful))
}

pub fn owner_routes() -> Router<AppState> {
    Router::new()
        .route("/reviews", post(submit_review))
        .route("/reviews/my-reviews", get(my_reviews))
        .route("/reviews/:review_id", put(edit_review).delete(delete_review))
}

#[instrument(skip(svc, payload))]
pub async fn submit_review(
    State(svc): State<ReviewService>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<SubmitReviewRequest>,
) -> AppResult<(StatusCode, Json<ReviewView>)> {
    let review = svc.submit(user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

#[instrument(skip(svc, payload))]
pub async fn edit_review(
    State(svc): State<ReviewService>,
    AuthUser(user_id): AuthUser,
    AppPath(review_id): AppPath<Uuid>,
    AppJson(payload): AppJson<EditReviewRequest>,
) -> AppResult<Json<ReviewView>> {
    Ok(Json(svc.edit(review_id, user_id, payload).await?))
}

#[instrument(skip(svc))]
pub async fn delete_review(
    State(svc): State<ReviewService>,
    AuthUser(user_id): AuthUser,
    AppPath(review_id): AppPath<Uuid>,
) -> AppResult<Json<Value>> {
    svc.delete(review_id, user_id).await?;
    Ok(Json(json!({ "message": "Review deleted" })))
}

#[instrument(skip(svc))]
pub async fn mark_helpful(
    State(svc): State<ReviewService>,
    AppPath(review_id): AppPath<Uuid>,
) -> AppResult<Json<HelpfulResponse>> {
    let helpful_votes = svc.mark_helpful(review_id).await?;
    Ok(Json(HelpfulResponse { helpful_votes }))
}

#[instrument(skip(svc))]
pub async fn list_movie_reviews(
    State(svc): State<ReviewService>,
    AppPath(movie_id): AppPath<Uuid>,
    AppQuery(query): AppQuery<ReviewListQuery>,
) -> AppResult<Json<ReviewPage>> {
    Ok(Json(svc.list_by_movie(movie_id, query).await?))
}

#[instrument(skip(svc))]
pub async fn list_user_reviews(
    State(svc): State<ReviewService>,
    AppPath(user_id): AppPath<Uuid>,
    AppQuery(query): AppQuery<ReviewListQuery>,
) -> AppResult<Json<ReviewPage>> {
    Ok(Json(svc.list_by_user(user_id, query).await?))
}

#[instrument(skip(svc))]
pub async fn my_reviews(
    State(svc): State<ReviewService>,
    AuthUser(user_id): AuthUser,
    AppQuery(query): AppQuery<ReviewListQuery>,
) -> AppResult<Json<ReviewPage>> {
    Ok(Json(svc.list_by_user(user_id, query).await?))
}
