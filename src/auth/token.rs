use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::clock::{Clock, SystemClock};
use crate::auth::error::AuthError;
use crate::auth::keys::JwtKeys;
use crate::config::JwtConfig;

/// Which endpoints a token is good for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenType::Access => write!(f, "access"),
            TokenType::Refresh => write!(f, "refresh"),
        }
    }
}

/// Represents the claims encoded within a JWT.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject of the token, the user's id.
    pub sub: Uuid,
    pub token_type: TokenType,
    /// Issued-at, seconds since epoch.
    pub iat: i64,
    /// Expiration, seconds since epoch.
    pub exp: i64,
}

impl Claims {
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.iat, 0).single()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }
}

/// An access token and a refresh token minted for the same subject.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Mints and verifies signed, expiring identity tokens.
///
/// The codec checks signatures and expiry only. Whether an `access` or a
/// `refresh` token is acceptable is the caller's decision.
#[derive(Clone)]
pub struct TokenCodec {
    keys: JwtKeys,
    access_ttl: chrono::Duration,
    refresh_ttl: chrono::Duration,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    pub fn new(keys: JwtKeys, config: &JwtConfig) -> Self {
        Self::with_clock(keys, config, Arc::new(SystemClock))
    }

    pub fn with_clock(keys: JwtKeys, config: &JwtConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            keys,
            access_ttl: config.access_token_ttl,
            refresh_ttl: config.refresh_token_ttl,
            clock,
        }
    }

    pub fn ttl(&self, token_type: TokenType) -> chrono::Duration {
        match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        }
    }

    /// Signs a new token of the given kind for `subject`.
    pub fn mint(&self, subject: Uuid, token_type: TokenType) -> Result<String, AuthError> {
        let issued_at = self.clock.now();
        let claims = Claims {
            sub: subject,
            token_type,
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl(token_type)).timestamp(),
        };

        encode(&Header::new(self.keys.algorithm()), &claims, self.keys.encoding())
            .map_err(|e| AuthError::Internal(format!("Failed to generate token: {}", e)))
    }

    pub fn mint_pair(&self, subject: Uuid) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.mint(subject, TokenType::Access)?,
            refresh_token: self.mint(subject, TokenType::Refresh)?,
        })
    }

    /// Verifies the signature, then expiry, and returns the decoded claims.
    ///
    /// A bad signature is reported as `TokenInvalid` even when the token is
    /// also expired.
    pub fn verify_and_decode(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(self.keys.algorithm());
        // Expiry is checked below against the injected clock.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<Claims>(token, self.keys.decoding(), &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                log::debug!("token rejected: {}", e);
                AuthError::TokenInvalid
            })?;

        if self.clock.now().timestamp() > claims.exp {
            log::debug!("token for {} expired at {}", claims.sub, claims.exp);
            return Err(AuthError::TokenExpired);
        }

        Ok(claims)
    }

    /// Mints and verifies a throwaway token, so a private key that does not
    /// belong to the public key fails at startup rather than on first login.
    pub fn self_check(&self) -> Result<(), AuthError> {
        let sample = self.mint(Uuid::nil(), TokenType::Access)?;
        self.verify_and_decode(&sample)
            .map(|_| ())
            .map_err(|e| AuthError::Internal(format!("key pair self-check failed: {}", e)))
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("keys", &self.keys)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}
