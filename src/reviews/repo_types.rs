use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Review record in the database. At most one per (user_id, movie_id).
#[derive(Debug, Clone, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub movie_id: Uuid,
    pub rating: i16, // 1..=5
    pub text: String,
    pub helpful_votes: i32,
    pub verified: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub user_id: Uuid,
    pub movie_id: Uuid,
    pub rating: i16,
    pub text: String,
    pub verified: bool,
}

/// Editable fields only; owner and target never change.
#[derive(Debug, Clone, Default)]
pub struct ReviewPatch {
    pub rating: Option<i16>,
    pub text: Option<String>,
}

/// A review joined with its author's public fields.
#[derive(Debug, Clone, FromRow)]
pub struct ReviewWithAuthor {
    #[sqlx(flatten)]
    pub review: Review,
    pub username: String,
    pub avatar_url: Option<String>,
}

/// A review joined with a short projection of its movie.
#[derive(Debug, Clone, FromRow)]
pub struct ReviewWithMovie {
    #[sqlx(flatten)]
    pub review: Review,
    pub title: String,
    pub poster_url: Option<String>,
    pub release_year: i32,
}

/// Count and sum of one movie's ratings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow)]
pub struct RatingStats {
    pub count: i64,
    pub sum: i64,
}
