//! In-memory stand-ins for the Postgres stores plus request helpers for
//! router tests. Uniqueness rules mirror the schema's constraints and are
//! checked under one mutex, so racing inserts see exactly one winner.

use std::{
    cmp::Ordering,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use lazy_static::lazy_static;
use serde_json::Value;
use sqlx::types::Json;
use time::{macros::datetime, Duration, OffsetDateTime};
use tower::ServiceExt;
use uuid::Uuid;

use crate::{
    auth::{
        repo::UserStore,
        repo_types::{NewUser, ProfilePatch, User},
        services::hash_password,
    },
    catalog::CatalogSource,
    db::{StoreError, StoreResult},
    movies::{
        repo::MovieStore,
        repo_types::{CastMember, Movie, MovieFilter, MoviePatch, MovieSort, NewMovie},
    },
    pagination::{slice_page, PageRequest},
    reviews::{
        repo::ReviewStore,
        repo_types::{NewReview, RatingStats, Review, ReviewPatch, ReviewWithAuthor, ReviewWithMovie},
    },
    watchlist::{
        repo::WatchlistStore,
        repo_types::{NewWatchlistEntry, StatusCount, WatchStatus, WatchlistEntry, WatchlistItem},
    },
};

pub const SEED_PASSWORD: &str = "seeded-password";

lazy_static! {
    // argon2 is slow in debug builds; hash once for every seeded account
    static ref SEED_HASH: String = hash_password(SEED_PASSWORD).unwrap();
}

#[derive(Default)]
struct Tables {
    seq: i64,
    fail_rating_writes: bool,
    users: Vec<User>,
    movies: Vec<Movie>,
    reviews: Vec<Review>,
    watchlist: Vec<WatchlistEntry>,
}

impl Tables {
    /// Strictly increasing timestamps so "newest first" is deterministic.
    fn tick(&mut self) -> OffsetDateTime {
        self.seq += 1;
        datetime!(2024-01-01 0:00 UTC) + Duration::seconds(self.seq)
    }
}

fn conflict(constraint: &str) -> StoreError {
    StoreError::Conflict(constraint.to_string())
}

#[derive(Clone, Default)]
pub struct MemoryDb {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    pub fn users(&self) -> Arc<dyn UserStore> {
        Arc::new(self.clone())
    }

    pub fn movies(&self) -> Arc<dyn MovieStore> {
        Arc::new(self.clone())
    }

    pub fn reviews(&self) -> Arc<dyn ReviewStore> {
        Arc::new(self.clone())
    }

    pub fn watchlist(&self) -> Arc<dyn WatchlistStore> {
        Arc::new(self.clone())
    }

    pub fn next_seq(&self) -> i64 {
        let mut t = self.lock();
        t.seq += 1;
        t.seq
    }

    /// Inserts an account whose password is `SEED_PASSWORD` and whose email
    /// is `{username}@example.com`.
    pub fn seed_user(&self, username: &str, is_admin: bool) -> User {
        let mut t = self.lock();
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: format!("{}@example.com", username.to_lowercase()),
            password_hash: SEED_HASH.clone(),
            avatar_url: None,
            is_admin,
            created_at: t.tick(),
        };
        t.users.push(user.clone());
        user
    }

    /// Stores the movie as given, without service-level validation.
    pub fn seed_movie(&self, new: NewMovie) -> Movie {
        let mut t = self.lock();
        insert_movie(&mut t, new).unwrap()
    }

    pub fn force_rating(&self, id: Uuid, average: f64, total: i64) {
        let mut t = self.lock();
        if let Some(m) = t.movies.iter_mut().find(|m| m.id == id) {
            m.average_rating = average;
            m.total_reviews = total;
        }
    }

    pub fn movie(&self, id: Uuid) -> Option<Movie> {
        self.lock().movies.iter().find(|m| m.id == id).cloned()
    }

    pub fn fail_rating_writes(&self, fail: bool) {
        self.lock().fail_rating_writes = fail;
    }
}

fn insert_movie(t: &mut Tables, new: NewMovie) -> StoreResult<Movie> {
    if new.tmdb_id.is_some() && t.movies.iter().any(|m| m.tmdb_id == new.tmdb_id) {
        return Err(conflict("movies_tmdb_id_key"));
    }
    let now = t.tick();
    let movie = Movie {
        id: Uuid::new_v4(),
        title: new.title,
        genres: new.genres,
        release_year: new.release_year,
        director: new.director,
        cast: Json(new.cast),
        synopsis: new.synopsis,
        poster_url: new.poster_url,
        backdrop_url: new.backdrop_url,
        trailer_url: new.trailer_url,
        duration: new.duration,
        average_rating: 0.0,
        total_reviews: 0,
        tmdb_id: new.tmdb_id,
        created_at: now,
        updated_at: now,
    };
    t.movies.push(movie.clone());
    Ok(movie)
}

fn matches_filter(m: &Movie, f: &MovieFilter) -> bool {
    if let Some(g) = &f.genre {
        if !m.genres.contains(g) {
            return false;
        }
    }
    if f.year.is_some_and(|y| m.release_year != y) {
        return false;
    }
    if f.min_rating.is_some_and(|r| m.average_rating < r) {
        return false;
    }
    if let Some(s) = &f.search {
        let needle = s.to_lowercase();
        if !m.title.to_lowercase().contains(&needle) && !m.synopsis.to_lowercase().contains(&needle)
        {
            return false;
        }
    }
    true
}

fn compare_movies(sort: MovieSort, a: &Movie, b: &Movie) -> Ordering {
    let newest_first = b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id));
    match sort {
        MovieSort::TopRated => b.average_rating.total_cmp(&a.average_rating).then(newest_first),
        MovieSort::Title => a.title.cmp(&b.title).then(newest_first),
        MovieSort::ReleaseYear => b.release_year.cmp(&a.release_year).then(newest_first),
        MovieSort::AverageRating => a.average_rating.total_cmp(&b.average_rating).then(newest_first),
        MovieSort::CreatedAt => a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)),
        MovieSort::Trending => b
            .average_rating
            .total_cmp(&a.average_rating)
            .then(b.total_reviews.cmp(&a.total_reviews))
            .then(newest_first),
    }
}

fn newest_reviews_first(a: &Review, b: &Review) -> Ordering {
    b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id))
}

#[async_trait]
impl UserStore for MemoryDb {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.email == email).cloned())
    }

    async fn create(&self, new: NewUser) -> StoreResult<User> {
        let mut t = self.lock();
        if t.users.iter().any(|u| u.email == new.email) {
            return Err(conflict("users_email_key"));
        }
        if t.users.iter().any(|u| u.username == new.username) {
            return Err(conflict("users_username_key"));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            avatar_url: None,
            is_admin: false,
            created_at: t.tick(),
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> StoreResult<Option<User>> {
        let mut t = self.lock();
        if let Some(name) = &patch.username {
            if t.users.iter().any(|u| u.id != id && &u.username == name) {
                return Err(conflict("users_username_key"));
            }
        }
        let Some(user) = t.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(name) = patch.username {
            user.username = name;
        }
        if let Some(url) = patch.avatar_url {
            user.avatar_url = Some(url);
        }
        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl MovieStore for MemoryDb {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Movie>> {
        Ok(self.movie(id))
    }

    async fn list(
        &self,
        filter: &MovieFilter,
        sort: MovieSort,
        page: PageRequest,
    ) -> StoreResult<(Vec<Movie>, i64)> {
        let t = self.lock();
        let mut hits: Vec<Movie> = t
            .movies
            .iter()
            .filter(|m| matches_filter(m, filter))
            .cloned()
            .collect();
        hits.sort_by(|a, b| compare_movies(sort, a, b));
        Ok((slice_page(&hits, page), hits.len() as i64))
    }

    async fn top(&self, sort: MovieSort, limit: i64) -> StoreResult<Vec<Movie>> {
        let mut all = self.lock().movies.clone();
        all.sort_by(|a, b| compare_movies(sort, a, b));
        all.truncate(limit as usize);
        Ok(all)
    }

    async fn insert(&self, new: NewMovie) -> StoreResult<Movie> {
        let mut t = self.lock();
        insert_movie(&mut t, new)
    }

    async fn update(&self, id: Uuid, patch: MoviePatch) -> StoreResult<Option<Movie>> {
        let mut t = self.lock();
        let now = t.tick();
        let Some(m) = t.movies.iter_mut().find(|m| m.id == id) else {
            return Ok(None);
        };
        if let Some(v) = patch.title {
            m.title = v;
        }
        if let Some(v) = patch.genres {
            m.genres = v;
        }
        if let Some(v) = patch.release_year {
            m.release_year = v;
        }
        if let Some(v) = patch.director {
            m.director = v;
        }
        if let Some(v) = patch.cast {
            m.cast = Json(v);
        }
        if let Some(v) = patch.synopsis {
            m.synopsis = v;
        }
        if let Some(v) = patch.poster_url {
            m.poster_url = Some(v);
        }
        if let Some(v) = patch.backdrop_url {
            m.backdrop_url = Some(v);
        }
        if let Some(v) = patch.trailer_url {
            m.trailer_url = Some(v);
        }
        if let Some(v) = patch.duration {
            m.duration = v;
        }
        m.updated_at = now;
        Ok(Some(m.clone()))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut t = self.lock();
        let before = t.movies.len();
        t.movies.retain(|m| m.id != id);
        if t.movies.len() == before {
            return Ok(false);
        }
        t.reviews.retain(|r| r.movie_id != id);
        t.watchlist.retain(|w| w.movie_id != id);
        Ok(true)
    }

    async fn set_rating_summary(&self, id: Uuid, average: f64, total: i64) -> StoreResult<bool> {
        let mut t = self.lock();
        if t.fail_rating_writes {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        let Some(m) = t.movies.iter_mut().find(|m| m.id == id) else {
            return Ok(false);
        };
        m.average_rating = average;
        m.total_reviews = total;
        Ok(true)
    }
}

#[async_trait]
impl ReviewStore for MemoryDb {
    async fn insert(&self, new: NewReview) -> StoreResult<Review> {
        let mut t = self.lock();
        if t
            .reviews
            .iter()
            .any(|r| r.user_id == new.user_id && r.movie_id == new.movie_id)
        {
            return Err(conflict("reviews_user_movie_key"));
        }
        let now = t.tick();
        let review = Review {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            movie_id: new.movie_id,
            rating: new.rating,
            text: new.text,
            helpful_votes: 0,
            verified: new.verified,
            created_at: now,
            updated_at: now,
        };
        t.reviews.push(review.clone());
        Ok(review)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Review>> {
        Ok(self.lock().reviews.iter().find(|r| r.id == id).cloned())
    }

    async fn update(&self, id: Uuid, patch: ReviewPatch) -> StoreResult<Option<Review>> {
        let mut t = self.lock();
        let now = t.tick();
        let Some(r) = t.reviews.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        if let Some(rating) = patch.rating {
            r.rating = rating;
        }
        if let Some(text) = patch.text {
            r.text = text;
        }
        r.updated_at = now;
        Ok(Some(r.clone()))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut t = self.lock();
        let before = t.reviews.len();
        t.reviews.retain(|r| r.id != id);
        Ok(t.reviews.len() < before)
    }

    async fn increment_helpful(&self, id: Uuid) -> StoreResult<Option<i32>> {
        let mut t = self.lock();
        Ok(t.reviews.iter_mut().find(|r| r.id == id).map(|r| {
            r.helpful_votes += 1;
            r.helpful_votes
        }))
    }

    async fn list_by_movie(
        &self,
        movie_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<(Vec<ReviewWithAuthor>, i64)> {
        let t = self.lock();
        let mut rows: Vec<Review> = t
            .reviews
            .iter()
            .filter(|r| r.movie_id == movie_id)
            .cloned()
            .collect();
        rows.sort_by(newest_reviews_first);
        let total = rows.len() as i64;
        let joined = slice_page(&rows, page)
            .into_iter()
            .filter_map(|review| {
                let author = t.users.iter().find(|u| u.id == review.user_id)?;
                Some(ReviewWithAuthor {
                    username: author.username.clone(),
                    avatar_url: author.avatar_url.clone(),
                    review,
                })
            })
            .collect();
        Ok((joined, total))
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<(Vec<ReviewWithMovie>, i64)> {
        let t = self.lock();
        let mut rows: Vec<Review> = t
            .reviews
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(newest_reviews_first);
        let total = rows.len() as i64;
        let joined = slice_page(&rows, page)
            .into_iter()
            .filter_map(|review| {
                let movie = t.movies.iter().find(|m| m.id == review.movie_id)?;
                Some(ReviewWithMovie {
                    title: movie.title.clone(),
                    poster_url: movie.poster_url.clone(),
                    release_year: movie.release_year,
                    review,
                })
            })
            .collect();
        Ok((joined, total))
    }

    async fn rating_stats(&self, movie_id: Uuid) -> StoreResult<RatingStats> {
        let t = self.lock();
        let mut stats = RatingStats::default();
        for r in t.reviews.iter().filter(|r| r.movie_id == movie_id) {
            stats.count += 1;
            stats.sum += i64::from(r.rating);
        }
        Ok(stats)
    }
}

#[async_trait]
impl WatchlistStore for MemoryDb {
    async fn insert(&self, new: NewWatchlistEntry) -> StoreResult<WatchlistEntry> {
        let mut t = self.lock();
        if t
            .watchlist
            .iter()
            .any(|w| w.user_id == new.user_id && w.movie_id == new.movie_id)
        {
            return Err(conflict("watchlist_user_movie_key"));
        }
        let entry = WatchlistEntry {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            movie_id: new.movie_id,
            status: new.status,
            added_at: t.tick(),
        };
        t.watchlist.push(entry.clone());
        Ok(entry)
    }

    async fn find(&self, user_id: Uuid, movie_id: Uuid) -> StoreResult<Option<WatchlistEntry>> {
        Ok(self
            .lock()
            .watchlist
            .iter()
            .find(|w| w.user_id == user_id && w.movie_id == movie_id)
            .cloned())
    }

    async fn update_status(
        &self,
        user_id: Uuid,
        movie_id: Uuid,
        status: WatchStatus,
    ) -> StoreResult<Option<WatchlistEntry>> {
        let mut t = self.lock();
        Ok(t
            .watchlist
            .iter_mut()
            .find(|w| w.user_id == user_id && w.movie_id == movie_id)
            .map(|w| {
                w.status = status;
                w.clone()
            }))
    }

    async fn delete(&self, user_id: Uuid, movie_id: Uuid) -> StoreResult<bool> {
        let mut t = self.lock();
        let before = t.watchlist.len();
        t.watchlist
            .retain(|w| !(w.user_id == user_id && w.movie_id == movie_id));
        Ok(t.watchlist.len() < before)
    }

    async fn list(
        &self,
        user_id: Uuid,
        status: Option<WatchStatus>,
        page: PageRequest,
    ) -> StoreResult<(Vec<WatchlistItem>, i64)> {
        let t = self.lock();
        let mut rows: Vec<WatchlistEntry> = t
            .watchlist
            .iter()
            .filter(|w| w.user_id == user_id && status.map_or(true, |s| w.status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.added_at.cmp(&a.added_at).then(a.id.cmp(&b.id)));
        let total = rows.len() as i64;
        let items = slice_page(&rows, page)
            .into_iter()
            .filter_map(|entry| {
                let m = t.movies.iter().find(|m| m.id == entry.movie_id)?;
                Some(WatchlistItem {
                    title: m.title.clone(),
                    poster_url: m.poster_url.clone(),
                    release_year: m.release_year,
                    genres: m.genres.clone(),
                    average_rating: m.average_rating,
                    entry,
                })
            })
            .collect();
        Ok((items, total))
    }

    async fn status_counts(&self, user_id: Uuid) -> StoreResult<Vec<StatusCount>> {
        let t = self.lock();
        Ok([WatchStatus::WantToWatch, WatchStatus::Watching, WatchStatus::Watched]
            .into_iter()
            .map(|status| StatusCount {
                status,
                count: t
                    .watchlist
                    .iter()
                    .filter(|w| w.user_id == user_id && w.status == status)
                    .count() as i64,
            })
            .filter(|c| c.count > 0)
            .collect())
    }
}

/// A movie that passes every create-time check.
pub fn sample_movie(title: &str, genres: &[&str], release_year: i32) -> NewMovie {
    NewMovie {
        title: title.to_string(),
        genres: genres.iter().map(|g| g.to_string()).collect(),
        release_year,
        director: "Jane Director".into(),
        cast: vec![CastMember {
            name: "Lead Actor".into(),
            character: "Protagonist".into(),
        }],
        synopsis: "A film kept on hand for catalog tests.".into(),
        poster_url: None,
        backdrop_url: None,
        trailer_url: None,
        duration: 110,
        tmdb_id: None,
    }
}

/// A catalog that knows exactly one movie.
pub struct StaticCatalog {
    id: i64,
    movie: NewMovie,
}

impl StaticCatalog {
    pub fn with(id: i64, movie: NewMovie) -> Self {
        Self { id, movie }
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    fn source_name(&self) -> &str {
        "static"
    }

    async fn fetch_movie(&self, external_id: i64) -> anyhow::Result<Option<NewMovie>> {
        Ok((external_id == self.id).then(|| self.movie.clone()))
    }
}

/// Drives one request through the router and decodes the body: JSON when it
/// parses, a JSON string otherwise, `Null` when empty.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
        Some(json) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => req.body(Body::empty()),
    }
    .unwrap();

    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}
