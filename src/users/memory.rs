//! In-memory [`UserStore`] for handler and service tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::users::{
    repo::{StoreError, UniqueField, UserStore},
    repo_types::{NewUser, Page, User, UserChanges},
};

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    // BTreeMap keeps the same id ordering as `ORDER BY id` on a uuid column.
    users: RwLock<BTreeMap<Uuid, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn list_all(&self) -> Vec<User> {
        self.users.read().await.values().cloned().collect()
    }

    fn check_unique(
        users: &BTreeMap<Uuid, User>,
        skip: Option<Uuid>,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<(), StoreError> {
        for user in users.values().filter(|u| Some(u.id) != skip) {
            if username == Some(user.username.as_str()) {
                return Err(StoreError::Conflict(UniqueField::Username));
            }
            if email == Some(user.email.as_str()) {
                return Err(StoreError::Conflict(UniqueField::Email));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get_one(&self, id: Uuid) -> Result<User, StoreError> {
        self.users.read().await.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn get_all(&self, page: Page) -> Result<Vec<User>, StoreError> {
        let users = self.users.read().await;
        let window = users.values().skip(page.offset as usize).cloned();
        Ok(match page.limit {
            Some(limit) => window.take(limit as usize).collect(),
            None => window.collect(),
        })
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        Self::check_unique(&users, None, Some(&new_user.username), Some(&new_user.email))?;

        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if !users.contains_key(&id) {
            return Err(StoreError::NotFound);
        }
        Self::check_unique(&users, Some(id), changes.username.as_deref(), changes.email.as_deref())?;

        let user = users.get_mut(&id).ok_or(StoreError::NotFound)?;
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }
        user.updated_at = OffsetDateTime::now_utc();
        Ok(user.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        match self.users.write().await.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound),
        }
    }
}
