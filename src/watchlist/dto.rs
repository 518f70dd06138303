use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{WatchStatus, WatchlistEntry, WatchlistItem};
use crate::pagination::Pagination;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToWatchlistRequest {
    pub movie_id: Uuid,
    #[serde(default)]
    pub status: Option<WatchStatus>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: WatchStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct WatchlistQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<WatchStatus>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistMovieView {
    pub id: Uuid,
    pub title: String,
    pub poster_url: Option<String>,
    pub release_year: i32,
    pub genres: Vec<String>,
    pub average_rating: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistEntryView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub movie_id: Uuid,
    pub status: WatchStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub added_at: OffsetDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movie: Option<WatchlistMovieView>,
}

impl From<WatchlistEntry> for WatchlistEntryView {
    fn from(e: WatchlistEntry) -> Self {
        Self {
            id: e.id,
            user_id: e.user_id,
            movie_id: e.movie_id,
            status: e.status,
            added_at: e.added_at,
            movie: None,
        }
    }
}

impl From<WatchlistItem> for WatchlistEntryView {
    fn from(item: WatchlistItem) -> Self {
        let movie = WatchlistMovieView {
            id: item.entry.movie_id,
            title: item.title,
            poster_url: item.poster_url,
            release_year: item.release_year,
            genres: item.genres,
            average_rating: item.average_rating,
        };
        Self {
            movie: Some(movie),
            ..WatchlistEntryView::from(item.entry)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WatchlistPage {
    pub watchlist: Vec<WatchlistEntryView>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistCheck {
    pub in_watchlist: bool,
    pub status: Option<WatchStatus>,
}

/// Per-status counts keyed by the status values themselves; every bucket is
/// present even when empty.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct WatchlistStats {
    pub want_to_watch: i64,
    pub watching: i64,
    pub watched: i64,
    pub total: i64,
}
