//! Keeps a movie's `average_rating` / `total_reviews` in step with its reviews.
//!
//! The recompute reads the review set and then writes the movie row as two
//! separate store calls. Concurrent mutations on the same movie can interleave
//! between them, in which case the last writer wins.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use super::{repo::ReviewStore, repo_types::RatingStats};
use crate::{db::StoreResult, movies::repo::MovieStore};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingSummary {
    pub average_rating: f64,
    pub total_reviews: i64,
}

impl From<RatingStats> for RatingSummary {
    fn from(stats: RatingStats) -> Self {
        Self {
            average_rating: average_rating(stats),
            total_reviews: stats.count,
        }
    }
}

/// Mean rating rounded half-up to one decimal place; 0 with no reviews.
pub fn average_rating(stats: RatingStats) -> f64 {
    if stats.count <= 0 {
        return 0.0;
    }
    // round(10 * sum / count) in integers, so x.x5 never drifts through float error
    let tenths = (20 * stats.sum + stats.count) / (2 * stats.count);
    tenths as f64 / 10.0
}

#[derive(Clone)]
pub struct RatingAggregator {
    reviews: Arc<dyn ReviewStore>,
    movies: Arc<dyn MovieStore>,
}

impl RatingAggregator {
    pub fn new(reviews: Arc<dyn ReviewStore>, movies: Arc<dyn MovieStore>) -> Self {
        Self { reviews, movies }
    }

    /// Best effort: never fails the caller. Returns the summary that was
    /// written, or `None` if the movie is gone or the store errored.
    pub async fn recompute(&self, movie_id: Uuid) -> Option<RatingSummary> {
        match self.try_recompute(movie_id).await {
            Ok(Some(summary)) => {
                debug!(
                    %movie_id,
                    average_rating = summary.average_rating,
                    total_reviews = summary.total_reviews,
                    "aggregate recomputed"
                );
                Some(summary)
            }
            Ok(None) => {
                debug!(%movie_id, "movie vanished before aggregate recompute");
                None
            }
            Err(e) => {
                warn!(error = %e, %movie_id, "aggregate recompute failed");
                None
            }
        }
    }

    async fn try_recompute(&self, movie_id: Uuid) -> StoreResult<Option<RatingSummary>> {
        let summary = RatingSummary::from(self.reviews.rating_stats(movie_id).await?);
        let written = self
            .movies
            .set_rating_summary(movie_id, summary.average_rating, summary.total_reviews)
            .await?;
        Ok(written.then_some(summary))
    }
}
