use std::sync::Arc;

use axum::extract::FromRef;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    aggregator::RatingAggregator,
    dto::{EditReviewRequest, ReviewListQuery, ReviewPage, ReviewView, SubmitReviewRequest},
    repo::ReviewStore,
    repo_types::{NewReview, Review, ReviewPatch, ReviewWithAuthor},
};
use crate::{
    auth::repo::UserStore,
    db::StoreError,
    error::{AppError, AppResult},
    movies::repo::MovieStore,
    pagination::{PageRequest, Pagination},
    state::AppState,
    validation::{char_len_between, Validator},
    watchlist::{repo::WatchlistStore, repo_types::WatchStatus},
};

pub const DEFAULT_LIMIT: i64 = 10;
const MIN_TEXT_LEN: usize = 10;
const MAX_TEXT_LEN: usize = 2000;

/// Whole numbers 1..=5 only; `4.5`, `"4"` or a missing value all fail.
fn check_rating(v: &mut Validator, raw: Option<&Value>) -> Option<i16> {
    let rating = raw
        .and_then(Value::as_i64)
        .filter(|r| (1..=5).contains(r))
        .map(|r| r as i16);
    v.check(
        rating.is_some(),
        "rating",
        "Rating must be an integer between 1 and 5",
    );
    rating
}

/// Returns the trimmed text when it is a string of acceptable length.
fn check_text(v: &mut Validator, raw: Option<&Value>) -> Option<String> {
    let text = raw
        .and_then(Value::as_str)
        .map(|t| t.trim().to_string())
        .filter(|t| char_len_between(t, MIN_TEXT_LEN, MAX_TEXT_LEN));
    v.check(
        text.is_some(),
        "text",
        "Review text must be between 10 and 2000 characters",
    );
    text
}

fn already_reviewed(e: StoreError) -> AppError {
    match e {
        StoreError::Conflict(_) => AppError::Conflict("You have already reviewed this movie".into()),
        other => other.into(),
    }
}

/// Review create/edit/delete plus the listings. Every mutation that can
/// move a movie's aggregate calls the aggregator afterwards.
#[derive(Clone)]
pub struct ReviewService {
    reviews: Arc<dyn ReviewStore>,
    movies: Arc<dyn MovieStore>,
    users: Arc<dyn UserStore>,
    watchlist: Arc<dyn WatchlistStore>,
    aggregator: RatingAggregator,
}

impl FromRef<AppState> for ReviewService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(
            state.reviews.clone(),
            state.movies.clone(),
            state.users.clone(),
            state.watchlist.clone(),
        )
    }
}

impl ReviewService {
    pub fn new(
        reviews: Arc<dyn ReviewStore>,
        movies: Arc<dyn MovieStore>,
        users: Arc<dyn UserStore>,
        watchlist: Arc<dyn WatchlistStore>,
    ) -> Self {
        let aggregator = RatingAggregator::new(reviews.clone(), movies.clone());
        Self {
            reviews,
            movies,
            users,
            watchlist,
            aggregator,
        }
    }

    pub async fn submit(&self, user_id: Uuid, req: SubmitReviewRequest) -> AppResult<ReviewView> {
        let mut v = Validator::new();
        let rating = check_rating(&mut v, req.rating.as_ref());
        let text = check_text(&mut v, req.text.as_ref());
        v.finish()?;
        let (Some(rating), Some(text)) = (rating, text) else {
            return Err(AppError::BadRequest("Invalid review".into()));
        };

        let author = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;
        if self.movies.find_by_id(req.movie_id).await?.is_none() {
            return Err(AppError::not_found("Movie"));
        }

        let verified = self
            .watchlist
            .find(user_id, req.movie_id)
            .await?
            .is_some_and(|entry| entry.status == WatchStatus::Watched);

        let review = self
            .reviews
            .insert(NewReview {
                user_id,
                movie_id: req.movie_id,
                rating,
                text,
                verified,
            })
            .await
            .map_err(|e| {
                if matches!(e, StoreError::Conflict(_)) {
                    warn!(%user_id, movie_id = %req.movie_id, "duplicate review rejected");
                }
                already_reviewed(e)
            })?;
        info!(review_id = %review.id, movie_id = %review.movie_id, %user_id, rating = review.rating, "review submitted");

        self.aggregator.recompute(review.movie_id).await;
        Ok(ReviewWithAuthor {
            review,
            username: author.username,
            avatar_url: author.avatar_url,
        }
        .into())
    }

    /// Looks a review up on behalf of its owner; someone else's review is
    /// indistinguishable from a missing one.
    async fn owned(&self, review_id: Uuid, user_id: Uuid) -> AppResult<Review> {
        match self.reviews.find_by_id(review_id).await? {
            Some(review) if review.user_id == user_id => Ok(review),
            _ => Err(AppError::not_found("Review")),
        }
    }

    pub async fn edit(
        &self,
        review_id: Uuid,
        user_id: Uuid,
        req: EditReviewRequest,
    ) -> AppResult<ReviewView> {
        if req.rating.is_none() && req.text.is_none() {
            return Err(AppError::BadRequest("No fields to update".into()));
        }
        let mut v = Validator::new();
        let patch = ReviewPatch {
            rating: req
                .rating
                .as_ref()
                .and_then(|r| check_rating(&mut v, Some(r))),
            text: req.text.as_ref().and_then(|t| check_text(&mut v, Some(t))),
        };
        v.finish()?;

        let before = self.owned(review_id, user_id).await?;
        let after = self
            .reviews
            .update(review_id, patch)
            .await?
            .ok_or_else(|| AppError::not_found("Review"))?;
        info!(%review_id, %user_id, "review edited");

        if after.rating != before.rating {
            self.aggregator.recompute(after.movie_id).await;
        }
        let author = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;
        Ok(ReviewWithAuthor {
            review: after,
            username: author.username,
            avatar_url: author.avatar_url,
        }
        .into())
    }

    /// Owners delete their own reviews; admins may delete any.
    pub async fn delete(&self, review_id: Uuid, actor_id: Uuid) -> AppResult<()> {
        let review = self
            .reviews
            .find_by_id(review_id)
            .await?
            .ok_or_else(|| AppError::not_found("Review"))?;
        if review.user_id != actor_id {
            let is_admin = self
                .users
                .find_by_id(actor_id)
                .await?
                .is_some_and(|u| u.is_admin);
            if !is_admin {
                warn!(%review_id, %actor_id, "review delete refused");
                return Err(AppError::not_found("Review"));
            }
            info!(%review_id, admin_id = %actor_id, "review removed by admin");
        }

        if !self.reviews.delete(review_id).await? {
            return Err(AppError::not_found("Review"));
        }
        info!(%review_id, movie_id = %review.movie_id, "review deleted");
        self.aggregator.recompute(review.movie_id).await;
        Ok(())
    }

    pub async fn mark_helpful(&self, review_id: Uuid) -> AppResult<i32> {
        let votes = self
            .reviews
            .increment_helpful(review_id)
            .await?
            .ok_or_else(|| AppError::not_found("Review"))?;
        debug!(%review_id, votes, "review marked helpful");
        Ok(votes)
    }

    pub async fn list_by_movie(&self, movie_id: Uuid, q: ReviewListQuery) -> AppResult<ReviewPage> {
        let page = PageRequest::resolve(q.page, q.limit, DEFAULT_LIMIT)?;
        if self.movies.find_by_id(movie_id).await?.is_none() {
            return Err(AppError::not_found("Movie"));
        }
        let (rows, total) = self.reviews.list_by_movie(movie_id, page).await?;
        Ok(ReviewPage {
            reviews: rows.into_iter().map(Into::into).collect(),
            pagination: Pagination::new(page, total),
        })
    }

    pub async fn list_by_user(&self, user_id: Uuid, q: ReviewListQuery) -> AppResult<ReviewPage> {
        let page = PageRequest::resolve(q.page, q.limit, DEFAULT_LIMIT)?;
        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(AppError::not_found("User"));
        }
        let (rows, total) = self.reviews.list_by_user(user_id, page).await?;
        Ok(ReviewPage {
            reviews: rows.into_iter().map(Into::into).collect(),
            pagination: Pagination::new(page, total),
        })
    }
}
