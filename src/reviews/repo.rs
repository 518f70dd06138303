use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{
    NewReview, RatingStats, Review, ReviewPatch, ReviewWithAuthor, ReviewWithMovie,
};
use crate::{
    db::{classify, StoreResult},
    pagination::PageRequest,
};

#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Fails with `StoreError::Conflict` when the user already reviewed the movie.
    async fn insert(&self, new: NewReview) -> StoreResult<Review>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Review>>;
    async fn update(&self, id: Uuid, patch: ReviewPatch) -> StoreResult<Option<Review>>;
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
    /// Atomically adds one vote; returns the new count.
    async fn increment_helpful(&self, id: Uuid) -> StoreResult<Option<i32>>;
    async fn list_by_movie(
        &self,
        movie_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<(Vec<ReviewWithAuthor>, i64)>;
    async fn list_by_user(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<(Vec<ReviewWithMovie>, i64)>;
    async fn rating_stats(&self, movie_id: Uuid) -> StoreResult<RatingStats>;
}

#[derive(Clone)]
pub struct PgReviewStore {
    db: PgPool,
}

impl PgReviewStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReviewStore for PgReviewStore {
    async fn insert(&self, new: NewReview) -> StoreResult<Review> {
        sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (id, user_id, movie_id, rating, text, verified)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, movie_id, rating, text, helpful_votes, verified,
                      created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(new.movie_id)
        .bind(new.rating)
        .bind(&new.text)
        .bind(new.verified)
        .fetch_one(&self.db)
        .await
        .map_err(classify)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Review>> {
        let review = sqlx::query_as::<_, Review>(
            r#"
            SELECT id, user_id, movie_id, rating, text, helpful_votes, verified,
                   created_at, updated_at
            FROM reviews
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(review)
    }

    async fn update(&self, id: Uuid, patch: ReviewPatch) -> StoreResult<Option<Review>> {
        let review = sqlx::query_as::<_, Review>(
            r#"
            UPDATE reviews
               SET rating     = COALESCE($2, rating),
                   text       = COALESCE($3, text),
                   updated_at = now()
             WHERE id = $1
            RETURNING id, user_id, movie_id, rating, text, helpful_votes, verified,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(patch.rating)
        .bind(patch.text)
        .fetch_optional(&self.db)
        .await?;
        Ok(review)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn increment_helpful(&self, id: Uuid) -> StoreResult<Option<i32>> {
        let votes = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE reviews
               SET helpful_votes = helpful_votes + 1
             WHERE id = $1
            RETURNING helpful_votes
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(votes)
    }

    async fn list_by_movie(
        &self,
        movie_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<(Vec<ReviewWithAuthor>, i64)> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reviews WHERE movie_id = $1")
            .bind(movie_id)
            .fetch_one(&self.db)
            .await?;

        let rows = sqlx::query_as::<_, ReviewWithAuthor>(
            r#"
            SELECT r.id, r.user_id, r.movie_id, r.rating, r.text, r.helpful_votes, r.verified,
                   r.created_at, r.updated_at, u.username, u.avatar_url
              FROM reviews r
              JOIN users u ON u.id = r.user_id
             WHERE r.movie_id = $1
             ORDER BY r.created_at DESC, r.id
             LIMIT $2 OFFSET $3
            "#,
        )
        .bind(movie_id)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;

        Ok((rows, total))
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<(Vec<ReviewWithMovie>, i64)> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reviews WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.db)
            .await?;

        let rows = sqlx::query_as::<_, ReviewWithMovie>(
            r#"
            SELECT r.id, r.user_id, r.movie_id, r.rating, r.text, r.helpful_votes, r.verified,
                   r.created_at, r.updated_at, m.title, m.poster_url, m.release_year
              FROM reviews r
              JOIN movies m ON m.id = r.movie_id
             WHERE r.user_id = $1
             ORDER BY r.created_at DESC, r.id
             LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;

        Ok((rows, total))
    }

    async fn rating_stats(&self, movie_id: Uuid) -> StoreResult<RatingStats> {
        let stats = sqlx::query_as::<_, RatingStats>(
            r#"
            SELECT COUNT(*)::BIGINT AS count,
                   COALESCE(SUM(rating), 0)::BIGINT AS sum
              FROM reviews
             WHERE movie_id = $1
            "#,
        )
        .bind(movie_id)
        .fetch_one(&self.db)
        .await?;
        Ok(stats)
    }
}
