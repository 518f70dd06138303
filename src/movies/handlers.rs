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
        CreateMovieRequest, GenreList, MovieList, MovieListQuery, MoviePage, MovieView,
        UpdateMovieRequest,
    },
    services::{MovieService, GENRES},
};
use crate::{
    auth::services::AdminUser,
    error::AppResult,
    extract::{AppJson, AppPath, AppQuery},
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/movies", get(list_movies))
        .route("/movies/trending", get(trending_movies))
        .route("/movies/featured", get(featured_movies))
        .route("/movies/genres", get(list_genres))
        .route("/movies/:movie_id", get(get_movie))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/movies", post(create_movie))
        .route("/movies/:movie_id", put(update_movie).delete(delete_movie))
        .route("/movies/import/:tmdb_id", post(import_movie))
}

#[instrument(skip(svc))]
pub async fn list_movies(
    State(svc): State<MovieService>,
    AppQuery(query): AppQuery<MovieListQuery>,
) -> AppResult<Json<MoviePage>> {
    Ok(Json(svc.list(query).await?))
}

#[instrument(skip(svc))]
pub async fn trending_movies(State(svc): State<MovieService>) -> AppResult<Json<MovieList>> {
    let movies = svc.trending().await?;
    Ok(Json(MovieList {
        movies: movies.into_iter().map(Into::into).collect(),
    }))
}

#[instrument(skip(svc))]
pub async fn featured_movies(State(svc): State<MovieService>) -> AppResult<Json<MovieList>> {
    let movies = svc.featured().await?;
    Ok(Json(MovieList {
        movies: movies.into_iter().map(Into::into).collect(),
    }))
}

pub async fn list_genres() -> Json<GenreList> {
    Json(GenreList { genres: GENRES })
}

#[instrument(skip(svc))]
pub async fn get_movie(
    State(svc): State<MovieService>,
    AppPath(movie_id): AppPath<Uuid>,
) -> AppResult<Json<MovieView>> {
    Ok(Json(svc.get(movie_id).await?.into()))
}

#[instrument(skip(svc, payload))]
pub async fn create_movie(
    State(svc): State<MovieService>,
    _admin: AdminUser,
    AppJson(payload): AppJson<CreateMovieRequest>,
) -> AppResult<(StatusCode, Json<MovieView>)> {
    let movie = svc.create(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(movie.into())))
}

#[instrument(skip(svc, payload))]
pub async fn update_movie(
    State(svc): State<MovieService>,
    _admin: AdminUser,
    AppPath(movie_id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateMovieRequest>,
) -> AppResult<Json<MovieView>> {
    Ok(Json(svc.update(movie_id, payload.into()).await?.into()))
}

#[instrument(skip(svc))]
pub async fn delete_movie(
    State(svc): State<MovieService>,
    _admin: AdminUser,
    AppPath(movie_id): AppPath<Uuid>,
) -> AppResult<Json<Value>> {
    svc.delete(movie_id).await?;
    Ok(Json(json!({ "message": "Movie deleted" })))
}

#[instrument(skip(svc))]
pub async fn import_movie(
    State(svc): State<MovieService>,
    _admin: AdminUser,
    AppPath(tmdb_id): AppPath<i64>,
) -> AppResult<(StatusCode, Json<MovieView>)> {
    let movie = svc.import(tmdb_id).await?;
    Ok((StatusCode::CREATED, Json(movie.into())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_movie, send, MemoryDb};
    use axum::http::Method;

    fn create_body() -> Value {
        json!({
            "title": "Stalker",
            "genres": ["Drama", "Science Fiction"],
            "releaseYear": 1979,
            "director": "Andrei Tarkovsky",
            "cast": [{"name": "Alisa Freyndlikh", "character": "Wife"}],
            "synopsis": "A guide leads two men into the Zone.",
            "duration": 162
        })
    }

    #[tokio::test]
    async fn catalog_mutation_requires_admin() {
        let db = MemoryDb::new();
        let user = db.seed_user("regular", false);
        let admin = db.seed_user("boss", true);
        let state = AppState::fake_with(&db);
        let app = crate::app::build_app(state.clone());

        let (status, _) = send(&app, Method::POST, "/api/movies", None, Some(create_body())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let token = state.token_for(user.id);
        let (status, body) =
            send(&app, Method::POST, "/api/movies", Some(&token), Some(create_body())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Admin access required");

        let token = state.token_for(admin.id);
        let (status, body) =
            send(&app, Method::POST, "/api/movies", Some(&token), Some(create_body())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["averageRating"], 0.0);
        assert_eq!(body["totalReviews"], 0);
        assert_eq!(body["cast"][0]["character"], "Wife");
    }

    #[tokio::test]
    async fn listing_is_public_and_paginated() {
        let db = MemoryDb::new();
        for i in 0..5 {
            db.seed_movie(sample_movie(&format!("Short {i}"), &["Animation"], 2000 + i));
        }
        let app = crate::app::build_app(AppState::fake_with(&db));
        let (status, body) = send(
            &app,
            Method::GET,
            "/api/movies?page=2&limit=2&sort=title&genre=Animation",
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let titles: Vec<_> = body["movies"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["title"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(titles, vec!["Short 2", "Short 3"]);
        assert_eq!(body["pagination"]["totalPages"], 3);
        assert_eq!(body["pagination"]["totalItems"], 5);
        assert_eq!(body["pagination"]["hasNext"], true);
        assert_eq!(body["pagination"]["hasPrev"], true);
    }

    #[tokio::test]
    async fn page_far_past_the_end_is_empty() {
        let db = MemoryDb::new();
        db.seed_movie(sample_movie("Lonely", &["Drama"], 2010));
        let user = db.seed_user("pager", false);
        let state = AppState::fake_with(&db);
        let app = crate::app::build_app(state.clone());

        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/api/movies?page={}&limit=50", i64::MAX),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["movies"].as_array().unwrap().is_empty());
        assert_eq!(body["pagination"]["currentPage"], i64::MAX);
        assert_eq!(body["pagination"]["totalItems"], 1);
        assert_eq!(body["pagination"]["hasNext"], false);

        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/api/watchlist?page={}", i64::MAX),
            Some(&state.token_for(user.id)),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["watchlist"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn bad_query_and_path_are_json_400s() {
        let app = crate::app::build_app(AppState::fake());
        let (status, body) = send(&app, Method::GET, "/api/movies?year=abc", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());

        let (status, body) = send(&app, Method::GET, "/api/movies/not-a-uuid", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn unknown_movie_is_404() {
        let app = crate::app::build_app(AppState::fake());
        let (status, body) =
            send(&app, Method::GET, &format!("/api/movies/{}", Uuid::new_v4()), None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Movie not found");
    }

    #[tokio::test]
    async fn genres_are_listed() {
        let app = crate::app::build_app(AppState::fake());
        let (status, body) = send(&app, Method::GET, "/api/movies/genres", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["genres"].as_array().unwrap().len(), GENRES.len());
    }
}
