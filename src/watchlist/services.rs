use std::sync::Arc;

use axum::extract::FromRef;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    dto::{WatchlistCheck, WatchlistPage, WatchlistQuery, WatchlistStats},
    repo::WatchlistStore,
    repo_types::{NewWatchlistEntry, StatusCount, WatchStatus, WatchlistEntry},
};
use crate::{
    db::StoreError,
    error::{AppError, AppResult},
    movies::repo::MovieStore,
    pagination::{PageRequest, Pagination},
    state::AppState,
};

pub const DEFAULT_LIMIT: i64 = 20;

fn already_listed(e: StoreError) -> AppError {
    match e {
        StoreError::Conflict(_) => AppError::Conflict("Movie already in watchlist".into()),
        other => other.into(),
    }
}

/// Folds grouped counts into the fixed three buckets.
pub fn tally(counts: &[StatusCount]) -> WatchlistStats {
    let mut stats = WatchlistStats::default();
    for c in counts {
        match c.status {
            WatchStatus::WantToWatch => stats.want_to_watch += c.count,
            WatchStatus::Watching => stats.watching += c.count,
            WatchStatus::Watched => stats.watched += c.count,
        }
        stats.total += c.count;
    }
    stats
}

#[derive(Clone)]
pub struct WatchlistService {
    entries: Arc<dyn WatchlistStore>,
    movies: Arc<dyn MovieStore>,
}

impl FromRef<AppState> for WatchlistService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.watchlist.clone(), state.movies.clone())
    }
}

impl WatchlistService {
    pub fn new(entries: Arc<dyn WatchlistStore>, movies: Arc<dyn MovieStore>) -> Self {
        Self { entries, movies }
    }

    pub async fn add(
        &self,
        user_id: Uuid,
        movie_id: Uuid,
        status: Option<WatchStatus>,
    ) -> AppResult<WatchlistEntry> {
        if self.movies.find_by_id(movie_id).await?.is_none() {
            return Err(AppError::not_found("Movie"));
        }
        let entry = self
            .entries
            .insert(NewWatchlistEntry {
                user_id,
                movie_id,
                status: status.unwrap_or_default(),
            })
            .await
            .map_err(|e| {
                if matches!(e, StoreError::Conflict(_)) {
                    warn!(%user_id, %movie_id, "movie already in watchlist");
                }
                already_listed(e)
            })?;
        info!(%user_id, %movie_id, status = ?entry.status, "added to watchlist");
        Ok(entry)
    }

    pub async fn update_status(
        &self,
        user_id: Uuid,
        movie_id: Uuid,
        status: WatchStatus,
    ) -> AppResult<WatchlistEntry> {
        let entry = self
            .entries
            .update_status(user_id, movie_id, status)
            .await?
            .ok_or_else(|| AppError::not_found("Watchlist entry"))?;
        debug!(%user_id, %movie_id, ?status, "watchlist status changed");
        Ok(entry)
    }

    pub async fn remove(&self, user_id: Uuid, movie_id: Uuid) -> AppResult<()> {
        if !self.entries.delete(user_id, movie_id).await? {
            return Err(AppError::not_found("Watchlist entry"));
        }
        info!(%user_id, %movie_id, "removed from watchlist");
        Ok(())
    }

    pub async fn check(&self, user_id: Uuid, movie_id: Uuid) -> AppResult<WatchlistCheck> {
        let entry = self.entries.find(user_id, movie_id).await?;
        Ok(WatchlistCheck {
            in_watchlist: entry.is_some(),
            status: entry.map(|e| e.status),
        })
    }

    pub async fn stats(&self, user_id: Uuid) -> AppResult<WatchlistStats> {
        let counts = self.entries.status_counts(user_id).await?;
        Ok(tally(&counts))
    }

    pub async fn list(&self, user_id: Uuid, q: WatchlistQuery) -> AppResult<WatchlistPage> {
        let page = PageRequest::resolve(q.page, q.limit, DEFAULT_LIMIT)?;
        let (items, total) = self.entries.list(user_id, q.status, page).await?;
        Ok(WatchlistPage {
            watchlist: items.into_iter().map(Into::into).collect(),
            pagination: Pagination::new(page, total),
        })
    }
}
