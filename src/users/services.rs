use std::sync::Arc;

use thiserror::Error;
use tracing::{error, instrument};
use uuid::Uuid;

use crate::users::{
    dto::{CreateUserInput, UpdateUserInput},
    password::PasswordHasher,
    repo::{StoreError, UserStore},
    repo_types::{NewUser, Page, User, UserChanges},
};

#[derive(Debug, Error)]
pub enum UserServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to hash password: {0}")]
    Hashing(String),
}

/// Hashes passwords on the way in; everything else goes straight to the store.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { store, hasher }
    }

    fn hash(&self, plain: &str) -> Result<String, UserServiceError> {
        self.hasher.hash(plain).map_err(|e| {
            error!(error = %e, "failed to hash password");
            UserServiceError::Hashing(e.to_string())
        })
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, UserServiceError> {
        Ok(self.store.get_one(id).await?)
    }

    pub async fn list_users(&self, page: Page) -> Result<Vec<User>, UserServiceError> {
        Ok(self.store.get_all(page).await?)
    }

    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn create_user(&self, input: CreateUserInput) -> Result<User, UserServiceError> {
        let password_hash = self.hash(&input.password)?;
        let new_user = NewUser {
            username: input.username,
            email: input.email,
            password_hash,
        };
        Ok(self.store.create(new_user).await?)
    }

    #[instrument(skip(self, input))]
    pub async fn update_user(
        &self,
        id: Uuid,
        input: UpdateUserInput,
    ) -> Result<User, UserServiceError> {
        let password_hash = input.password().map(|p| self.hash(p)).transpose()?;
        let changes = UserChanges {
            username: input.username().map(str::to_owned),
            email: input.email().map(str::to_owned),
            password_hash,
        };
        Ok(self.store.update(id, changes).await?)
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<(), UserServiceError> {
        Ok(self.store.delete(id).await?)
    }
}
