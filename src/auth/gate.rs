use std::sync::Arc;

use crate::auth::error::AuthError;
use crate::auth::password::PasswordHasher;
use crate::auth::resolver::IdentityResolver;
use crate::auth::token::{TokenCodec, TokenPair};
use crate::error::AppError;
use crate::models::User;
use crate::repository::UserRepository;

const DECOY_PASSWORD: &str = "decoy-password";

/// Turns credentials or a refresh token into a fresh token pair.
#[derive(Clone)]
pub struct AuthGate {
    users: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
    codec: Arc<TokenCodec>,
    resolver: IdentityResolver,
    /// Hash checked against when the email is unknown, so both login
    /// failures cost one bcrypt verification.
    decoy_hash: Arc<str>,
}

/// Storage failures reach the auth core as `Internal`.
fn storage_error(err: AppError) -> AuthError {
    log::warn!("user lookup failed: {}", err);
    AuthError::Internal(format!("user lookup failed: {}", err))
}

impl AuthGate {
    /// Fails when the decoy hash cannot be computed.
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: PasswordHasher,
        codec: Arc<TokenCodec>,
    ) -> Result<Self, AuthError> {
        let resolver = IdentityResolver::new(codec.clone());
        let decoy_hash = hasher.hash(DECOY_PASSWORD).map_err(|e| {
            log::warn!("cannot prepare decoy password hash: {}", e);
            e
        })?;
        Ok(Self {
            users,
            hasher,
            codec,
            resolver,
            decoy_hash: decoy_hash.into(),
        })
    }

    /// Checks the credentials and mints an access/refresh pair.
    ///
    /// An unknown email and a wrong password fail with the same
    /// `AuthenticationFailed`.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let user = self.authenticate(email, password).await?;
        let pair = self.codec.mint_pair(user.id)?;
        log::info!("issued token pair for user {}", user.id);
        Ok(pair)
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, AuthError> {
        match self.users.find_by_email(email).await.map_err(storage_error)? {
            Some(user) if user.verify_password(password, &self.hasher) => Ok(user),
            Some(user) => {
                log::debug!("login refused for user {}: wrong password", user.id);
                Err(AuthError::AuthenticationFailed)
            }
            None => {
                let _ = self.hasher.verify(password, &self.decoy_hash);
                log::debug!("login refused: unknown email");
                Err(AuthError::AuthenticationFailed)
            }
        }
    }

    /// Mints a new pair from a refresh token, without a password check.
    ///
    /// The presented refresh token is not revoked and stays usable until it
    /// expires.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let user_id = self.resolver.resolve_from_refresh(refresh_token)?;
        if self
            .users
            .find_by_id(user_id)
            .await
            .map_err(storage_error)?
            .is_none()
        {
            log::debug!("refresh refused: user {} no longer exists", user_id);
            return Err(AuthError::UserNotFound);
        }
        let pair = self.codec.mint_pair(user_id)?;
        log::info!("refreshed token pair for user {}", user_id);
        Ok(pair)
    }

    #[cfg(test)]
    fn decoy_hash(&self) -> &str {
        &self.decoy_hash
    }
}
