use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{CastMember, Movie};
use crate::pagination::Pagination;

#[derive(Debug, Default, Deserialize)]
pub struct MovieListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub genre: Option<String>,
    pub year: Option<i32>,
    /// Minimum average rating, inclusive.
    pub rating: Option<f64>,
    pub search: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMovieRequest {
    pub title: String,
    pub genres: Vec<String>,
    pub release_year: i32,
    pub director: String,
    #[serde(default)]
    pub cast: Vec<CastMember>,
    pub synopsis: String,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub trailer_url: Option<String>,
    pub duration: i32,
    pub tmdb_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMovieRequest {
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

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieView {
    pub id: Uuid,
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
    pub average_rating: f64,
    pub total_reviews: i64,
    pub tmdb_id: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Movie> for MovieView {
    fn from(m: Movie) -> Self {
        Self {
            id: m.id,
            title: m.title,
            genres: m.genres,
            release_year: m.release_year,
            director: m.director,
            cast: m.cast.0,
            synopsis: m.synopsis,
            poster_url: m.poster_url,
            backdrop_url: m.backdrop_url,
            trailer_url: m.trailer_url,
            duration: m.duration,
            average_rating: m.average_rating,
            total_reviews: m.total_reviews,
            tmdb_id: m.tmdb_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MoviePage {
    pub movies: Vec<MovieView>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct MovieList {
    pub movies: Vec<MovieView>,
}

#[derive(Debug, Serialize)]
pub struct GenreList {
    pub genres: &'static [&'static str],
}
