use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "watch_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WatchStatus {
    #[default]
    WantToWatch,
    Watching,
    Watched,
}

#[derive(Debug, Clone, FromRow)]
pub struct WatchlistEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub movie_id: Uuid,
    pub status: WatchStatus,
    pub added_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewWatchlistEntry {
    pub user_id: Uuid,
    pub movie_id: Uuid,
    pub status: WatchStatus,
}

/// An entry joined with the parts of its movie a list view shows.
#[derive(Debug, Clone, FromRow)]
pub struct WatchlistItem {
    #[sqlx(flatten)]
    pub entry: WatchlistEntry,
    pub title: String,
    pub poster_url: Option<String>,
    pub release_year: i32,
    pub genres: Vec<String>,
    pub average_rating: f64,
}

#[derive(Debug, Clone, Copy, FromRow)]
pub struct StatusCount {
    pub status: WatchStatus,
    pub count: i64,
}
