use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use thiserror::Error;
use tracing::{error, instrument, warn};
use uuid::Uuid;

use crate::users::repo_types::{NewUser, Page, User, UserChanges};

const USER_COLUMNS: &str = "id, username, email, password_hash, created_at, updated_at";

pub const USERNAME_CONSTRAINT: &str = "users_username_key";
pub const EMAIL_CONSTRAINT: &str = "users_email_key";

/// Which unique constraint a write collided with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
    Other(String),
}

impl UniqueField {
    pub fn from_constraint(name: Option<&str>) -> Self {
        match name {
            Some(USERNAME_CONSTRAINT) => UniqueField::Username,
            Some(EMAIL_CONSTRAINT) => UniqueField::Email,
            Some(other) => UniqueField::Other(other.to_string()),
            None => UniqueField::Other(String::new()),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user not found")]
    NotFound,
    #[error("unique constraint violation: {0:?}")]
    Conflict(UniqueField),
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return StoreError::Conflict(UniqueField::from_constraint(db.constraint()));
            }
        }
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            other => StoreError::Database(other),
        }
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_one(&self, id: Uuid) -> Result<User, StoreError>;
    async fn get_all(&self, page: Page) -> Result<Vec<User>, StoreError>;
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;
    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<User, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

/// Postgres-backed store over the `users` table.
#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Converts and logs a driver error at the point it occurred.
fn classify(op: &'static str, id: Option<Uuid>, err: sqlx::Error) -> StoreError {
    let err = StoreError::from(err);
    match &err {
        StoreError::NotFound => warn!(op, user_id = ?id, "user not found"),
        StoreError::Conflict(field) => warn!(op, user_id = ?id, ?field, "unique constraint violation"),
        StoreError::Database(e) => error!(op, user_id = ?id, error = %e, "user store query failed"),
    }
    err
}

/// `UPDATE users SET <present columns>, updated_at = now() WHERE id = $n RETURNING ...`
pub(crate) fn update_query(id: Uuid, changes: UserChanges) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE users SET ");
    let mut set = qb.separated(", ");
    for (column, value) in changes.into_assignments() {
        set.push(column.as_str());
        set.push_unseparated(" = ");
        set.push_bind_unseparated(value);
    }
    set.push("updated_at = now()");
    qb.push(" WHERE id = ");
    qb.push_bind(id);
    qb.push(" RETURNING ");
    qb.push(USER_COLUMNS);
    qb
}

#[async_trait]
impl UserStore for PgUserStore {
    #[instrument(skip(self))]
    async fn get_one(&self, id: Uuid) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_one(&self.db)
            .await
            .map_err(|e| classify("get_one", Some(id), e))
    }

    #[instrument(skip(self))]
    async fn get_all(&self, page: Page) -> Result<Vec<User>, StoreError> {
        // LIMIT NULL is LIMIT ALL in Postgres.
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.db)
        .await
        .map_err(|e| classify("get_all", None, e))
    }

    #[instrument(skip(self, new_user), fields(username = %new_user.username))]
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, username, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| classify("create", Some(id), e))
    }

    #[instrument(skip(self, changes))]
    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<User, StoreError> {
        if changes.is_empty() {
            warn!(user_id = %id, "update with no data columns; only updated_at is touched");
        }
        let mut query = update_query(id, changes);
        query
            .build_query_as::<User>()
            .fetch_one(&self.db)
            .await
            .map_err(|e| classify("update", Some(id), e))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(|e| classify("delete", Some(id), e))?;

        if res.rows_affected() == 0 {
            warn!(user_id = %id, "no user found to delete");
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
