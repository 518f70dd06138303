use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use super::CatalogSource;
use crate::{
    config::TmdbConfig,
    movies::{
        repo_types::{CastMember, NewMovie},
        services::{GENRES, MAX_SYNOPSIS_LEN},
    },
};

const IMAGE_BASE: &str = "https://image.tmdb.org/t/p";
const MAX_CAST: usize = 10;

#[derive(Debug, Deserialize)]
struct TmdbGenre {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TmdbCastMember {
    name: String,
    #[serde(default)]
    character: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbCrewMember {
    name: String,
    #[serde(default)]
    job: String,
}

#[derive(Debug, Default, Deserialize)]
struct TmdbCredits {
    #[serde(default)]
    cast: Vec<TmdbCastMember>,
    #[serde(default)]
    crew: Vec<TmdbCrewMember>,
}

#[derive(Debug, Deserialize)]
struct TmdbVideo {
    key: String,
    site: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Default, Deserialize)]
struct TmdbVideos {
    #[serde(default)]
    results: Vec<TmdbVideo>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovie {
    id: i64,
    title: String,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    runtime: Option<i32>,
    #[serde(default)]
    genres: Vec<TmdbGenre>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    #[serde(default)]
    credits: TmdbCredits,
    #[serde(default)]
    videos: TmdbVideos,
}

impl From<TmdbMovie> for NewMovie {
    fn from(m: TmdbMovie) -> Self {
        let release_year = m
            .release_date
            .as_deref()
            .and_then(|d| d.get(..4))
            .and_then(|y| y.parse::<i32>().ok())
            .unwrap_or_default();
        let director = m
            .credits
            .crew
            .iter()
            .find(|c| c.job == "Director")
            .map(|c| c.name.clone())
            .unwrap_or_else(|| "Unknown".into());
        let cast = m
            .credits
            .cast
            .into_iter()
            .take(MAX_CAST)
            .map(|c| CastMember {
                name: c.name,
                character: c.character.unwrap_or_default(),
            })
            .collect();
        let trailer_url = m
            .videos
            .results
            .iter()
            .find(|v| v.site == "YouTube" && v.kind == "Trailer")
            .map(|v| format!("https://www.youtube.com/watch?v={}", v.key));

        Self {
            title: m.title,
            genres: m
                .genres
                .into_iter()
                .map(|g| g.name)
                .filter(|name| GENRES.contains(&name.as_str()))
                .collect(),
            release_year,
            director,
            cast,
            synopsis: m
                .overview
                .unwrap_or_default()
                .chars()
                .take(MAX_SYNOPSIS_LEN)
                .collect(),
            poster_url: m.poster_path.map(|p| format!("{IMAGE_BASE}/w500{p}")),
            backdrop_url: m.backdrop_path.map(|p| format!("{IMAGE_BASE}/original{p}")),
            trailer_url,
            duration: m.runtime.unwrap_or_default(),
            tmdb_id: Some(m.id),
        }
    }
}

#[derive(Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl TmdbClient {
    pub fn new(config: &TmdbConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl CatalogSource for TmdbClient {
    fn source_name(&self) -> &str {
        "tmdb"
    }

    async fn fetch_movie(&self, external_id: i64) -> anyhow::Result<Option<NewMovie>> {
        let url = format!("{}/movie/{}", self.base_url, external_id);
        let res = self
            .client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("append_to_response", "credits,videos"),
            ])
            .send()
            .await
            .context("tmdb request")?;

        if res.status() == StatusCode::NOT_FOUND {
            debug!(tmdb_id = external_id, "tmdb movie not found");
            return Ok(None);
        }
        if !res.status().is_success() {
            let status = res.status();
            warn!(tmdb_id = external_id, %status, "tmdb request failed");
            anyhow::bail!("tmdb returned {status}");
        }

        let movie: TmdbMovie = res.json().await.context("decode tmdb movie")?;
        Ok(Some(movie.into()))
    }
}
