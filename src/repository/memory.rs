use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use uuid::Uuid;

use super::UserRepository;
use crate::error::AppError;
use crate::models::User;

/// In-memory user store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes a user, returning whether one was present.
    pub fn remove(&self, id: Uuid) -> Result<bool, AppError> {
        let mut users = self.users.write().map_err(|_| poisoned())?;
        Ok(users.remove(&id).is_some())
    }
}

fn poisoned() -> AppError {
    AppError::InternalServerError("user store lock poisoned".into())
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, AppError> {
        let mut users = self.users.write().map_err(|_| poisoned())?;
        if users
            .values()
            .any(|u| u.email == user.email || u.username == user.username)
        {
            return Err(AppError::BadRequest(
                "Email or username already registered".into(),
            ));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }
}
