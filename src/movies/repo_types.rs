use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CastMember {
    pub name: String,
    #[serde(default)]
    pub character: String,
}

/// Movie record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct Movie {
    pub id: Uuid,
    pub title: String,
    pub genres: Vec<String>,
    pub release_year: i32,
    pub director: String,
    pub cast: Json<Vec<CastMember>>,
    pub synopsis: String,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub trailer_url: Option<String>,
    pub duration: i32,          // minutes
    pub average_rating: f64,    // derived from reviews, one decimal
    pub total_reviews: i64,     // derived from reviews
    pub tmdb_id: Option<i64>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewMovie {
    pub title: String,
    pub genres: Vec<String>,
    pub release_year: i32,
    pub director: String,
    pub cast: Vec<CastMember>,
    pub synopsis: String,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub trailer_url: Option<String>,
    pub duration: i32,
    pub tmdb_id: Option<i64>,
}

/// Partial update; the aggregate rating fields are deliberately absent.
#[derive(Debug, Clone, Default)]
pub struct MoviePatch {
    pub title: Option<String>,
    pub genres: Option<Vec<String>>,
    pub release_year: Option<i32>,
    pub director: Option<String>,
    pub cast: Option<Vec<CastMember>>,
    pub synopsis: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub trailer_url: Option<String>,
    pub duration: Option<i32>,
}

impl MoviePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.genres.is_none()
            && self.release_year.is_none()
            && self.director.is_none()
            && self.cast.is_none()
            && self.synopsis.is_none()
            && self.poster_url.is_none()
            && self.backdrop_url.is_none()
            && self.trailer_url.is_none()
            && self.duration.is_none()
    }
}

/// Conjunctive listing filters; `None` means "any".
#[derive(Debug, Clone, Default)]
pub struct MovieFilter {
    pub genre: Option<String>,
    pub year: Option<i32>,
    pub min_rating: Option<f64>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MovieSort {
    /// averageRating descending
    #[default]
    TopRated,
    Title,
    /// releaseYear descending
    ReleaseYear,
    /// averageRating ascending, as requested explicitly by key
    AverageRating,
    CreatedAt,
    /// averageRating then totalReviews, both descending
    Trending,
}

impl MovieSort {
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "title" => Some(Self::Title),
            "releaseYear" => Some(Self::ReleaseYear),
            "averageRating" => Some(Self::AverageRating),
            "createdAt" => Some(Self::CreatedAt),
            _ => None,
        }
    }

    pub fn order_by(self) -> &'static str {
        match self {
            Self::TopRated => "average_rating DESC, created_at DESC, id",
            Self::Title => "title ASC, created_at DESC, id",
            Self::ReleaseYear => "release_year DESC, created_at DESC, id",
            Self::AverageRating => "average_rating ASC, created_at DESC, id",
            Self::CreatedAt => "created_at ASC, id",
            Self::Trending => "average_rating DESC, total_reviews DESC, created_at DESC, id",
        }
    }
}
