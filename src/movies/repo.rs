use async_trait::async_trait;
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::repo_types::{Movie, MovieFilter, MoviePatch, MovieSort, NewMovie};
use crate::{
    db::{classify, StoreResult},
    pagination::PageRequest,
};

#[async_trait]
pub trait MovieStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Movie>>;
    /// One page of matching movies plus the total number of matches.
    async fn list(
        &self,
        filter: &MovieFilter,
        sort: MovieSort,
        page: PageRequest,
    ) -> StoreResult<(Vec<Movie>, i64)>;
    async fn top(&self, sort: MovieSort, limit: i64) -> StoreResult<Vec<Movie>>;
    async fn insert(&self, new: NewMovie) -> StoreResult<Movie>;
    async fn update(&self, id: Uuid, patch: MoviePatch) -> StoreResult<Option<Movie>>;
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
    /// Writes the derived rating fields. `false` when the movie is gone.
    async fn set_rating_summary(&self, id: Uuid, average: f64, total: i64) -> StoreResult<bool>;
}

const MOVIE_COLUMNS: &str = r#"id, title, genres, release_year, director, "cast", synopsis,
       poster_url, backdrop_url, trailer_url, duration, average_rating,
       total_reviews, tmdb_id, created_at, updated_at"#;

#[derive(Clone)]
pub struct PgMovieStore {
    db: PgPool,
}

impl PgMovieStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Escapes LIKE metacharacters so user search text matches literally.
fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, f: &MovieFilter) {
    qb.push(" WHERE TRUE");
    if let Some(genre) = &f.genre {
        qb.push(" AND ").push_bind(genre.clone()).push(" = ANY(genres)");
    }
    if let Some(year) = f.year {
        qb.push(" AND release_year = ").push_bind(year);
    }
    if let Some(min) = f.min_rating {
        qb.push(" AND average_rating >= ").push_bind(min);
    }
    if let Some(search) = &f.search {
        let pattern = format!("%{}%", escape_like(search));
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR synopsis ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl MovieStore for PgMovieStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Movie>> {
        let sql = format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE id = $1");
        let movie = sqlx::query_as::<_, Movie>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(movie)
    }

    async fn list(
        &self,
        filter: &MovieFilter,
        sort: MovieSort,
        page: PageRequest,
    ) -> StoreResult<(Vec<Movie>, i64)> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM movies");
        push_filters(&mut count_qb, filter);
        let (total,) = count_qb
            .build_query_as::<(i64,)>()
            .fetch_one(&self.db)
            .await?;

        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {MOVIE_COLUMNS} FROM movies"));
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY ")
            .push(sort.order_by())
            .push(" LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let movies = qb.build_query_as::<Movie>().fetch_all(&self.db).await?;

        Ok((movies, total))
    }

    async fn top(&self, sort: MovieSort, limit: i64) -> StoreResult<Vec<Movie>> {
        let sql = format!(
            "SELECT {MOVIE_COLUMNS} FROM movies ORDER BY {} LIMIT $1",
            sort.order_by()
        );
        let movies = sqlx::query_as::<_, Movie>(&sql)
            .bind(limit)
            .fetch_all(&self.db)
            .await?;
        Ok(movies)
    }

    async fn insert(&self, new: NewMovie) -> StoreResult<Movie> {
        let sql = format!(
            r#"
            INSERT INTO movies (id, title, genres, release_year, director, "cast", synopsis,
                                poster_url, backdrop_url, trailer_url, duration, tmdb_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {MOVIE_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Movie>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new.title)
            .bind(&new.genres)
            .bind(new.release_year)
            .bind(&new.director)
            .bind(Json(&new.cast))
            .bind(&new.synopsis)
            .bind(&new.poster_url)
            .bind(&new.backdrop_url)
            .bind(&new.trailer_url)
            .bind(new.duration)
            .bind(new.tmdb_id)
            .fetch_one(&self.db)
            .await
            .map_err(classify)
    }

    async fn update(&self, id: Uuid, patch: MoviePatch) -> StoreResult<Option<Movie>> {
        let sql = format!(
            r#"
            UPDATE movies
               SET title        = COALESCE($2, title),
                   genres       = COALESCE($3, genres),
                   release_year = COALESCE($4, release_year),
                   director     = COALESCE($5, director),
                   "cast"       = COALESCE($6, "cast"),
                   synopsis     = COALESCE($7, synopsis),
                   poster_url   = COALESCE($8, poster_url),
                   backdrop_url = COALESCE($9, backdrop_url),
                   trailer_url  = COALESCE($10, trailer_url),
                   duration     = COALESCE($11, duration),
                   updated_at   = now()
             WHERE id = $1
            RETURNING {MOVIE_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Movie>(&sql)
            .bind(id)
            .bind(patch.title)
            .bind(patch.genres)
            .bind(patch.release_year)
            .bind(patch.director)
            .bind(patch.cast.map(Json))
            .bind(patch.synopsis)
            .bind(patch.poster_url)
            .bind(patch.backdrop_url)
            .bind(patch.trailer_url)
            .bind(patch.duration)
            .fetch_optional(&self.db)
            .await
            .map_err(classify)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn set_rating_summary(&self, id: Uuid, average: f64, total: i64) -> StoreResult<bool> {
        let res = sqlx::query(
            r#"
            UPDATE movies
               SET average_rating = $2,
                   total_reviews  = $3
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(average)
        .bind(total)
        .execute(&self.db)
        .await?;
        Ok(res.rows_affected() > 0)
    }
}
