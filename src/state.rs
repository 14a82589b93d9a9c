use std::sync::Arc;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::AppConfig;
use crate::users::{password::Argon2Hasher, repo::PgUserStore, services::UserService};

#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
}

impl AppState {
    pub fn new(users: UserService) -> Self {
        Self { users }
    }

    /// Connects the pool and wires the Postgres-backed user service.
    pub async fn init(config: &AppConfig) -> anyhow::Result<(Self, PgPool)> {
        let db = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        let users = UserService::new(
            Arc::new(PgUserStore::new(db.clone())),
            Arc::new(Argon2Hasher::default()),
        );
        Ok((Self::new(users), db))
    }
}
