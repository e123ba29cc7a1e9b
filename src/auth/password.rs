use crate::auth::error::AuthError;
use crate::config::{PasswordConfig, BCRYPT_MAX_PASSWORD_BYTES};
use bcrypt::{hash, verify};

/// Hashes and verifies passwords with bcrypt.
///
/// Every call to [`PasswordHasher::hash`] draws a fresh salt, so hashing the
/// same plaintext twice yields two different strings.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
    max_length: usize,
}

impl PasswordHasher {
    /// The length limit is capped at 72 bytes; bcrypt would ignore the rest.
    pub fn new(config: PasswordConfig) -> Self {
        Self {
            cost: config.bcrypt_cost,
            max_length: config.max_length.min(BCRYPT_MAX_PASSWORD_BYTES),
        }
    }

    pub fn hash(&self, plaintext: &str) -> Result<String, AuthError> {
        if plaintext.is_empty() {
            return Err(AuthError::InvalidInput("password must not be empty".into()));
        }
        if plaintext.len() > self.max_length {
            return Err(AuthError::InvalidInput(format!(
                "password must be at most {} bytes",
                self.max_length
            )));
        }
        hash(plaintext, self.cost)
            .map_err(|e| AuthError::Internal(format!("Failed to hash password: {}", e)))
    }

    /// Checks `plaintext` against a stored hash. A malformed hash is a mismatch,
    /// never an error.
    pub fn verify(&self, plaintext: &str, hashed_password: &str) -> bool {
        if plaintext.is_empty() || plaintext.len() > self.max_length {
            return false;
        }
        match verify(plaintext, hashed_password) {
            Ok(matches) => matches,
            Err(e) => {
                log::debug!("password verification against malformed hash: {}", e);
                false
            }
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(PasswordConfig::default())
    }
}
