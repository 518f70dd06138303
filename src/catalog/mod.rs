//! Third-party movie metadata used to seed the catalog.

use async_trait::async_trait;

use crate::movies::repo_types::NewMovie;

pub mod tmdb;

#[async_trait]
pub trait CatalogSource: Send + Sync {
    fn source_name(&self) -> &str;

    /// Looks a movie up by its external id; `Ok(None)` when the source has no such movie.
    async fn fetch_movie(&self, external_id: i64) -> anyhow::Result<Option<NewMovie>>;
}
