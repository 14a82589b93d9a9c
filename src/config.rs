use std::net::SocketAddr;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source.
    ///
    /// `DATABASE_URL` wins; otherwise the URL is assembled from the `PG_*`
    /// variables, of which `PG_USERNAME` and `PG_DATABASE` are required.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = match lookup("DATABASE_URL") {
            Some(url) => url,
            None => {
                let user = lookup("PG_USERNAME").context("DATABASE_URL or PG_USERNAME must be set")?;
                let password = lookup("PG_PASSWORD").unwrap_or_default();
                let host = lookup("PG_HOST").unwrap_or_else(|| "localhost".into());
                let port = lookup("PG_PORT").unwrap_or_else(|| "5432".into());
                let database = lookup("PG_DATABASE").context("DATABASE_URL or PG_DATABASE must be set")?;
                if password.is_empty() {
                    format!("postgres://{user}@{host}:{port}/{database}")
                } else {
                    format!("postgres://{user}:{password}@{host}:{port}/{database}")
                }
            }
        };

        let host = lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = match lookup("APP_PORT") {
            Some(v) => v.parse::<u16>().with_context(|| format!("invalid APP_PORT {v:?}"))?,
            None => 3000,
        };
        let db_max_connections = lookup("DB_MAX_CONNECTIONS")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);

        Ok(Self {
            database_url,
            host,
            port,
            db_max_connections,
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}
