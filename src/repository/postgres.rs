use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::UserRepository;
use crate::error::AppError;
use crate::models::User;

const USER_COLUMNS: &str = "id, email, username, first_name, second_name, middle_name, \
                            password_hash, created_at";

#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn insert(&self, user: User) -> Result<User, AppError> {
        let existing = sqlx::query_as::<_, (Uuid,)>(
            "SELECT id FROM users WHERE email = $1 OR username = $2",
        )
        .bind(&user.email)
        .bind(&user.username)
        .fetch_optional(&self.pool)
        .await?;

        if existing.is_some() {
            return Err(AppError::BadRequest(
                "Email or username already registered".into(),
            ));
        }

        let inserted = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users ({cols}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {cols}",
            cols = USER_COLUMNS
        ))
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.second_name)
        .bind(&user.middle_name)
        .bind(user.password_hash())
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // Lost a race with a concurrent registration.
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return AppError::BadRequest("Email or username already registered".into());
                }
            }
            AppError::from(e)
        })?;

        Ok(inserted)
    }
}
