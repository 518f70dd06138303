use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Review, ReviewWithAuthor, ReviewWithMovie};
use crate::pagination::Pagination;

/// `rating` and `text` stay untyped here so a wrong shape is reported as a
/// field error by the service instead of a bare body rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReviewRequest {
    pub movie_id: Uuid,
    #[serde(default)]
    pub rating: Option<Value>,
    #[serde(default)]
    pub text: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EditReviewRequest {
    #[serde(default)]
    pub rating: Option<Value>,
    #[serde(default)]
    pub text: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorView {
    pub id: Uuid,
    pub username: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieSummaryView {
    pub id: Uuid,
    pub title: String,
    pub poster_url: Option<String>,
    pub release_year: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub movie_id: Uuid,
    pub rating: i16,
    pub text: String,
    pub helpful_votes: i32,
    pub verified: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<AuthorView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movie: Option<MovieSummaryView>,
}

impl From<Review> for ReviewView {
    fn from(r: Review) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            movie_id: r.movie_id,
            rating: r.rating,
            text: r.text,
            helpful_votes: r.helpful_votes,
            verified: r.verified,
            created_at: r.created_at,
            updated_at: r.updated_at,
            user: None,
            movie: None,
        }
    }
}

impl From<ReviewWithAuthor> for ReviewView {
    fn from(row: ReviewWithAuthor) -> Self {
        let user = AuthorView {
            id: row.review.user_id,
            username: row.username,
            avatar_url: row.avatar_url,
        };
        Self {
            user: Some(user),
            ..ReviewView::from(row.review)
        }
    }
}

impl From<ReviewWithMovie> for ReviewView {
    fn from(row: ReviewWithMovie) -> Self {
        let movie = MovieSummaryView {
            id: row.review.movie_id,
            title: row.title,
            poster_url: row.poster_url,
            release_year: row.release_year,
        };
        Self {
            movie: Some(movie),
            ..ReviewView::from(row.review)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewPage {
    pub reviews: Vec<ReviewView>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpfulResponse {
    pub helpful_votes: i32,
}
