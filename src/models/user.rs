use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::auth::error::AuthError;
use crate::auth::password::PasswordHasher;
use crate::config::BCRYPT_MAX_PASSWORD_BYTES;

lazy_static! {
    // Letters, digits and `_ . + -`
    static ref USERNAME_REGEX: regex::Regex = regex::Regex::new(r"^[a-zA-Z0-9_.+-]+$").unwrap();
}

/// A registered user.
///
/// The password is write-only: [`User::set_password`] stores a bcrypt hash and
/// there is no way to read a password back, only to check one.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: Option<String>,
    pub second_name: Option<String>,
    pub middle_name: Option<String>,
    #[serde(skip_serializing)]
    password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Builds a new user from registration input, hashing the password.
    pub fn new(input: UserInput, hasher: &PasswordHasher) -> Result<Self, AuthError> {
        let mut user = Self {
            id: Uuid::new_v4(),
            email: input.email,
            username: input.username,
            first_name: input.first_name,
            second_name: input.second_name,
            middle_name: input.middle_name,
            password_hash: String::new(),
            created_at: Utc::now(),
        };
        user.set_password(&input.password, hasher)?;
        Ok(user)
    }

    pub fn set_password(&mut self, plaintext: &str, hasher: &PasswordHasher) -> Result<(), AuthError> {
        self.password_hash = hasher.hash(plaintext)?;
        Ok(())
    }

    pub fn verify_password(&self, plaintext: &str, hasher: &PasswordHasher) -> bool {
        hasher.verify(plaintext, &self.password_hash)
    }

    /// The stored hash, for persistence only.
    pub(crate) fn password_hash(&self) -> &str {
        &self.password_hash
    }
}

/// Payload for registering a new account.
#[derive(Debug, Deserialize, Validate)]
pub struct UserInput {
    #[validate(email, length(max = 100))]
    pub email: String,
    #[validate(
        length(min = 3, max = 100),
        regex(
            path = "USERNAME_REGEX",
            message = "Username may contain letters, digits, and _ . + -"
        )
    )]
    pub username: String,
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    #[validate(length(max = 100))]
    pub second_name: Option<String>,
    #[validate(length(max = 100))]
    pub middle_name: Option<String>,
    #[validate(length(min = 8), custom = "validate_password_bytes")]
    pub password: String,
}

/// `length` counts characters; bcrypt's limit is in bytes.
fn validate_password_bytes(password: &str) -> Result<(), ValidationError> {
    if password.len() > BCRYPT_MAX_PASSWORD_BYTES {
        let mut err = ValidationError::new("password_too_long");
        err.message = Some(
            format!("Password must be at most {} bytes", BCRYPT_MAX_PASSWORD_BYTES).into(),
        );
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PasswordConfig;
    use validator::Validate;

    fn input(password: &str) -> UserInput {
        UserInput {
            email: "test@example.com".to_string(),
            username: "testuser".to_string(),
            first_name: Some("Ivan".to_string()),
            second_name: None,
            middle_name: None,
            password: password.to_string(),
        }
    }

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(PasswordConfig {
            bcrypt_cost: crate::config::MIN_BCRYPT_COST,
            max_length: 72,
        })
    }

    #[test]
    fn test_user_input_validation() {
        assert!(input("password123").validate().is_ok());

        let mut invalid_email = input("password123");
        invalid_email.email = "invalid-email".to_string();
        assert!(invalid_email.validate().is_err());

        assert!(input("short").validate().is_err());

        let mut bad_username = input("password123");
        bad_username.username = "user name!".to_string();
        assert!(bad_username.validate().is_err());

        let mut long_name = input("password123");
        long_name.first_name = Some("a".repeat(101));
        assert!(long_name.validate().is_err());
    }

    #[test]
    fn test_password_limit_counts_bytes() {
        assert!(input(&"a".repeat(72)).validate().is_ok());
        assert!(input(&"a".repeat(73)).validate().is_err());

        // 40 characters, 80 bytes
        let multibyte = "é".repeat(40);
        let errors = input(&multibyte).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
        assert!(input(&"é".repeat(36)).validate().is_ok());
    }

    #[test]
    fn test_new_user_stores_only_hash() {
        let hasher = hasher();
        let user = User::new(input("validpass1"), &hasher).unwrap();

        assert_ne!(user.password_hash(), "validpass1");
        assert!(user.verify_password("validpass1", &hasher));
        assert!(!user.verify_password("validpass2", &hasher));
    }

    #[test]
    fn test_set_password_replaces_hash() {
        let hasher = hasher();
        let mut user = User::new(input("validpass1"), &hasher).unwrap();
        user.set_password("another-pass", &hasher).unwrap();

        assert!(!user.verify_password("validpass1", &hasher));
        assert!(user.verify_password("another-pass", &hasher));
    }

    #[test]
    fn test_serialized_user_has_no_hash() {
        let user = User::new(input("validpass1"), &hasher()).unwrap();
        let json = serde_json::to_value(&user).unwrap();

        assert!(json.get("password_hash").is_none());
        assert!(json.get("password").is_none());
        assert_eq!(json["email"], "test@example.com");
    }
}
