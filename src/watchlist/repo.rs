use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::repo_types::{NewWatchlistEntry, StatusCount, WatchStatus, WatchlistEntry, WatchlistItem};
use crate::{
    db::{classify, StoreResult},
    pagination::PageRequest,
};

#[async_trait]
pub trait WatchlistStore: Send + Sync {
    /// Fails with `StoreError::Conflict` when the movie is already listed.
    async fn insert(&self, new: NewWatchlistEntry) -> StoreResult<WatchlistEntry>;
    async fn find(&self, user_id: Uuid, movie_id: Uuid) -> StoreResult<Option<WatchlistEntry>>;
    async fn update_status(
        &self,
        user_id: Uuid,
        movie_id: Uuid,
        status: WatchStatus,
    ) -> StoreResult<Option<WatchlistEntry>>;
    async fn delete(&self, user_id: Uuid, movie_id: Uuid) -> StoreResult<bool>;
    async fn list(
        &self,
        user_id: Uuid,
        status: Option<WatchStatus>,
        page: PageRequest,
    ) -> StoreResult<(Vec<WatchlistItem>, i64)>;
    /// Only statuses with at least one entry are returned.
    async fn status_counts(&self, user_id: Uuid) -> StoreResult<Vec<StatusCount>>;
}

const ENTRY_COLUMNS: &str = "id, user_id, movie_id, status, added_at";

#[derive(Clone)]
pub struct PgWatchlistStore {
    db: PgPool,
}

impl PgWatchlistStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn push_owner_filter(qb: &mut QueryBuilder<'_, Postgres>, user_id: Uuid, status: Option<WatchStatus>) {
    qb.push(" WHERE w.user_id = ").push_bind(user_id);
    if let Some(status) = status {
        qb.push(" AND w.status = ").push_bind(status);
    }
}

#[async_trait]
impl WatchlistStore for PgWatchlistStore {
    async fn insert(&self, new: NewWatchlistEntry) -> StoreResult<WatchlistEntry> {
        let sql = format!(
            "INSERT INTO watchlist (id, user_id, movie_id, status) VALUES ($1, $2, $3, $4) \
             RETURNING {ENTRY_COLUMNS}"
        );
        sqlx::query_as::<_, WatchlistEntry>(&sql)
            .bind(Uuid::new_v4())
            .bind(new.user_id)
            .bind(new.movie_id)
            .bind(new.status)
            .fetch_one(&self.db)
            .await
            .map_err(classify)
    }

    async fn find(&self, user_id: Uuid, movie_id: Uuid) -> StoreResult<Option<WatchlistEntry>> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM watchlist WHERE user_id = $1 AND movie_id = $2");
        let entry = sqlx::query_as::<_, WatchlistEntry>(&sql)
            .bind(user_id)
            .bind(movie_id)
            .fetch_optional(&self.db)
            .await?;
        Ok(entry)
    }

    async fn update_status(
        &self,
        user_id: Uuid,
        movie_id: Uuid,
        status: WatchStatus,
    ) -> StoreResult<Option<WatchlistEntry>> {
        let sql = format!(
            "UPDATE watchlist SET status = $3 WHERE user_id = $1 AND movie_id = $2 \
             RETURNING {ENTRY_COLUMNS}"
        );
        let entry = sqlx::query_as::<_, WatchlistEntry>(&sql)
            .bind(user_id)
            .bind(movie_id)
            .bind(status)
            .fetch_optional(&self.db)
            .await?;
        Ok(entry)
    }

    async fn delete(&self, user_id: Uuid, movie_id: Uuid) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM watchlist WHERE user_id = $1 AND movie_id = $2")
            .bind(user_id)
            .bind(movie_id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn list(
        &self,
        user_id: Uuid,
        status: Option<WatchStatus>,
        page: PageRequest,
    ) -> StoreResult<(Vec<WatchlistItem>, i64)> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM watchlist w");
        push_owner_filter(&mut count_qb, user_id, status);
        let (total,) = count_qb
            .build_query_as::<(i64,)>()
            .fetch_one(&self.db)
            .await?;

        let mut qb = QueryBuilder::<Postgres>::new(
            r#"SELECT w.id, w.user_id, w.movie_id, w.status, w.added_at,
                      m.title, m.poster_url, m.release_year, m.genres, m.average_rating
                 FROM watchlist w
                 JOIN movies m ON m.id = w.movie_id"#,
        );
        push_owner_filter(&mut qb, user_id, status);
        qb.push(" ORDER BY w.added_at DESC, w.id LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let items = qb.build_query_as::<WatchlistItem>().fetch_all(&self.db).await?;

        Ok((items, total))
    }

    async fn status_counts(&self, user_id: Uuid) -> StoreResult<Vec<StatusCount>> {
        let counts = sqlx::query_as::<_, StatusCount>(
            r#"
            SELECT status, COUNT(*) AS count
              FROM watchlist
             WHERE user_id = $1
             GROUP BY status
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(counts)
    }
}
