//! User persistence lookup.
//!
//! The auth core only ever asks for a user by id or by email; registration
//! adds `insert`. Postgres backs the running service, the in-memory store
//! backs tests and local experiments.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::User;

pub use memory::InMemoryUserRepository;
pub use postgres::PgUserRepository;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Stores a new user. Fails with `BadRequest` when the email or username
    /// is already taken.
    async fn insert(&self, user: User) -> Result<User, AppError>;
}
