use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub jwt: JwtConfig,
    /// `None` disables catalog import.
    pub tmdb: Option<TmdbConfig>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let max_connections = parse_var("DATABASE_MAX_CONNECTIONS").unwrap_or(10);
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "cinerate".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "cinerate-users".into()),
            ttl_minutes: parse_var("JWT_TTL_MINUTES").unwrap_or(60),
            refresh_ttl_minutes: parse_var("JWT_REFRESH_TTL_MINUTES").unwrap_or(60 * 24 * 14),
        };
        let tmdb = std::env::var("TMDB_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(|api_key| TmdbConfig {
                api_key,
                base_url: std::env::var("TMDB_BASE_URL")
                    .unwrap_or_else(|_| "https://api.themoviedb.org/3".into()),
            });
        Ok(Self {
            database_url,
            max_connections,
            jwt,
            tmdb,
        })
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}
