use std::sync::Arc;

use axum::extract::FromRef;
use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    dto::{CreateMovieRequest, MovieListQuery, MoviePage, UpdateMovieRequest},
    repo::MovieStore,
    repo_types::{CastMember, Movie, MovieFilter, MoviePatch, MovieSort, NewMovie},
};
use crate::{
    catalog::CatalogSource,
    db::StoreError,
    error::{AppError, AppResult},
    pagination::{PageRequest, Pagination},
    state::AppState,
    validation::{char_len_between, is_http_url, FieldError, Validator},
};

pub const GENRES: &[&str] = &[
    "Action",
    "Adventure",
    "Animation",
    "Comedy",
    "Crime",
    "Documentary",
    "Drama",
    "Family",
    "Fantasy",
    "History",
    "Horror",
    "Music",
    "Mystery",
    "Romance",
    "Science Fiction",
    "Thriller",
    "War",
    "Western",
];

pub const MAX_SYNOPSIS_LEN: usize = 2000;
const MAX_TITLE_LEN: usize = 200;
const MAX_DIRECTOR_LEN: usize = 100;
const MAX_DURATION: i32 = 1000;
/// Year of the earliest surviving motion picture.
const FIRST_FILM_YEAR: i32 = 1888;

pub const DEFAULT_LIMIT: i64 = 12;
const TRENDING_LIMIT: i64 = 10;
const FEATURED_LIMIT: i64 = 6;

fn latest_release_year() -> i32 {
    OffsetDateTime::now_utc().year() + 5
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn normalize_genres(genres: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(genres.len());
    for g in genres {
        let g = g.trim().to_string();
        if !g.is_empty() && !out.contains(&g) {
            out.push(g);
        }
    }
    out
}

fn check_title(v: &mut Validator, title: &str) {
    v.check(
        char_len_between(title, 1, MAX_TITLE_LEN),
        "title",
        "Title is required and must be at most 200 characters",
    );
}

fn check_genres(v: &mut Validator, genres: &[String]) {
    v.check(!genres.is_empty(), "genres", "At least one genre is required");
    for g in genres.iter().filter(|g| !GENRES.contains(&g.as_str())) {
        v.push(FieldError::new("genres", format!("Unknown genre: {g}")));
    }
}

fn check_release_year(v: &mut Validator, year: i32) {
    let latest = latest_release_year();
    if !(FIRST_FILM_YEAR..=latest).contains(&year) {
        v.push(FieldError::new(
            "releaseYear",
            format!("Release year must be between {FIRST_FILM_YEAR} and {latest}"),
        ));
    }
}

fn check_director(v: &mut Validator, director: &str) {
    v.check(
        char_len_between(director, 1, MAX_DIRECTOR_LEN),
        "director",
        "Director is required and must be at most 100 characters",
    );
}

fn check_synopsis(v: &mut Validator, synopsis: &str) {
    v.check(
        char_len_between(synopsis, 1, MAX_SYNOPSIS_LEN),
        "synopsis",
        "Synopsis is required and must be at most 2000 characters",
    );
}

fn check_cast(v: &mut Validator, cast: &[CastMember]) {
    v.check(
        cast.iter().all(|c| !c.name.trim().is_empty()),
        "cast",
        "Every cast member needs a name",
    );
}

fn check_url(v: &mut Validator, field: &str, url: Option<&str>) {
    if let Some(url) = url {
        v.check(is_http_url(url), field, "Must be an http(s) URL");
    }
}

fn check_duration(v: &mut Validator, duration: i32) {
    v.check(
        (1..=MAX_DURATION).contains(&duration),
        "duration",
        "Duration must be between 1 and 1000 minutes",
    );
}

impl NewMovie {
    fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.director = self.director.trim().to_string();
        self.synopsis = self.synopsis.trim().to_string();
        self.genres = normalize_genres(self.genres);
        self.poster_url = non_blank(self.poster_url);
        self.backdrop_url = non_blank(self.backdrop_url);
        self.trailer_url = non_blank(self.trailer_url);
        self
    }

    fn validate(&self) -> AppResult<()> {
        let mut v = Validator::new();
        check_title(&mut v, &self.title);
        check_genres(&mut v, &self.genres);
        check_release_year(&mut v, self.release_year);
        check_director(&mut v, &self.director);
        check_cast(&mut v, &self.cast);
        check_synopsis(&mut v, &self.synopsis);
        check_url(&mut v, "posterUrl", self.poster_url.as_deref());
        check_url(&mut v, "backdropUrl", self.backdrop_url.as_deref());
        check_url(&mut v, "trailerUrl", self.trailer_url.as_deref());
        check_duration(&mut v, self.duration);
        v.finish()
    }
}

impl MoviePatch {
    fn normalized(mut self) -> Self {
        self.title = self.title.map(|t| t.trim().to_string());
        self.director = self.director.map(|d| d.trim().to_string());
        self.synopsis = self.synopsis.map(|s| s.trim().to_string());
        self.genres = self.genres.map(normalize_genres);
        self.poster_url = non_blank(self.poster_url);
        self.backdrop_url = non_blank(self.backdrop_url);
        self.trailer_url = non_blank(self.trailer_url);
        self
    }

    fn validate(&self) -> AppResult<()> {
        let mut v = Validator::new();
        if let Some(t) = &self.title {
            check_title(&mut v, t);
        }
        if let Some(g) = &self.genres {
            check_genres(&mut v, g);
        }
        if let Some(y) = self.release_year {
            check_release_year(&mut v, y);
        }
        if let Some(d) = &self.director {
            check_director(&mut v, d);
        }
        if let Some(c) = &self.cast {
            check_cast(&mut v, c);
        }
        if let Some(s) = &self.synopsis {
            check_synopsis(&mut v, s);
        }
        check_url(&mut v, "posterUrl", self.poster_url.as_deref());
        check_url(&mut v, "backdropUrl", self.backdrop_url.as_deref());
        check_url(&mut v, "trailerUrl", self.trailer_url.as_deref());
        if let Some(d) = self.duration {
            check_duration(&mut v, d);
        }
        v.finish()
    }
}

impl From<CreateMovieRequest> for NewMovie {
    fn from(r: CreateMovieRequest) -> Self {
        Self {
            title: r.title,
            genres: r.genres,
            release_year: r.release_year,
            director: r.director,
            cast: r.cast,
            synopsis: r.synopsis,
            poster_url: r.poster_url,
            backdrop_url: r.backdrop_url,
            trailer_url: r.trailer_url,
            duration: r.duration,
            tmdb_id: r.tmdb_id,
        }
    }
}

impl From<UpdateMovieRequest> for MoviePatch {
    fn from(r: UpdateMovieRequest) -> Self {
        Self {
            title: r.title,
            genres: r.genres,
            release_year: r.release_year,
            director: r.director,
            cast: r.cast,
            synopsis: r.synopsis,
            poster_url: r.poster_url,
            backdrop_url: r.backdrop_url,
            trailer_url: r.trailer_url,
            duration: r.duration,
        }
    }
}

/// Turns raw query parameters into a store query.
pub fn parse_list_query(q: MovieListQuery) -> AppResult<(MovieFilter, MovieSort, PageRequest)> {
    let page = PageRequest::resolve(q.page, q.limit, DEFAULT_LIMIT)?;

    let mut v = Validator::new();
    if let Some(r) = q.rating {
        v.check((0.0..=5.0).contains(&r), "rating", "Rating must be between 0 and 5");
    }
    let sort = match non_blank(q.sort) {
        None => MovieSort::default(),
        Some(key) => match MovieSort::parse(&key) {
            Some(sort) => sort,
            None => {
                v.push(FieldError::new(
                    "sort",
                    "Sort must be one of title, releaseYear, averageRating, createdAt",
                ));
                MovieSort::default()
            }
        },
    };
    v.finish()?;

    let filter = MovieFilter {
        genre: non_blank(q.genre),
        year: q.year,
        min_rating: q.rating,
        search: non_blank(q.search),
    };
    Ok((filter, sort, page))
}

fn tmdb_conflict(e: StoreError) -> AppError {
    match e {
        StoreError::Conflict(_) => {
            AppError::Conflict("A movie with this TMDB id already exists".into())
        }
        other => other.into(),
    }
}

/// Catalog queries and admin mutations.
#[derive(Clone)]
pub struct MovieService {
    movies: Arc<dyn MovieStore>,
    catalog: Option<Arc<dyn CatalogSource>>,
}

impl FromRef<AppState> for MovieService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.movies.clone(), state.catalog.clone())
    }
}

impl MovieService {
    pub fn new(movies: Arc<dyn MovieStore>, catalog: Option<Arc<dyn CatalogSource>>) -> Self {
        Self { movies, catalog }
    }

    pub async fn list(&self, query: MovieListQuery) -> AppResult<MoviePage> {
        let (filter, sort, page) = parse_list_query(query)?;
        let (movies, total) = self.movies.list(&filter, sort, page).await?;
        debug!(total, page = page.page, ?sort, "movies listed");
        Ok(MoviePage {
            movies: movies.into_iter().map(Into::into).collect(),
            pagination: Pagination::new(page, total),
        })
    }

    pub async fn trending(&self) -> AppResult<Vec<Movie>> {
        Ok(self.movies.top(MovieSort::Trending, TRENDING_LIMIT).await?)
    }

    pub async fn featured(&self) -> AppResult<Vec<Movie>> {
        Ok(self.movies.top(MovieSort::TopRated, FEATURED_LIMIT).await?)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Movie> {
        self.movies
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Movie"))
    }

    pub async fn create(&self, new: NewMovie) -> AppResult<Movie> {
        let new = new.normalized();
        new.validate()?;
        let movie = self.movies.insert(new).await.map_err(tmdb_conflict)?;
        info!(movie_id = %movie.id, title = %movie.title, "movie created");
        Ok(movie)
    }

    pub async fn update(&self, id: Uuid, patch: MoviePatch) -> AppResult<Movie> {
        let patch = patch.normalized();
        if patch.is_empty() {
            return Err(AppError::BadRequest("No fields to update".into()));
        }
        patch.validate()?;
        let movie = self
            .movies
            .update(id, patch)
            .await
            .map_err(tmdb_conflict)?
            .ok_or_else(|| AppError::not_found("Movie"))?;
        info!(movie_id = %movie.id, "movie updated");
        Ok(movie)
    }

    /// Reviews and watchlist entries go with the movie.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !self.movies.delete(id).await? {
            return Err(AppError::not_found("Movie"));
        }
        info!(movie_id = %id, "movie deleted");
        Ok(())
    }

    pub async fn import(&self, external_id: i64) -> AppResult<Movie> {
        let catalog = self
            .catalog
            .as_ref()
            .ok_or_else(|| AppError::Unavailable("Catalog import is not configured".into()))?;
        let Some(new) = catalog.fetch_movie(external_id).await? else {
            return Err(AppError::NotFound(format!(
                "Movie {external_id} not found in {}",
                catalog.source_name()
            )));
        };
        let movie = self.create(new).await?;
        info!(movie_id = %movie.id, external_id, source = catalog.source_name(), "movie imported");
        Ok(movie)
    }
}
