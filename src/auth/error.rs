//! Auth errors

use thiserror::Error;

use crate::auth::token::TokenType;

/// Failure kinds of the authentication core.
///
/// Each kind stays distinct internally so logs and tests can tell them apart;
/// the HTTP boundary collapses most of them into a 401.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Plaintext rejected by the credential store (empty or too long).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No bearer token was presented.
    #[error("missing bearer token")]
    MissingToken,

    /// Signature verified but the token is past its expiry.
    #[error("token expired")]
    TokenExpired,

    /// Bad signature, wrong algorithm, missing claims or a truncated encoding.
    #[error("invalid token")]
    TokenInvalid,

    /// A valid token of the other kind was presented.
    #[error("token type must be '{expected}', got '{found}'")]
    WrongTokenType { expected: TokenType, found: TokenType },

    /// Unknown email or wrong password. Both render identically.
    #[error("Incorrect email or password")]
    AuthenticationFailed,

    /// The token's subject no longer exists.
    #[error("user not found")]
    UserNotFound,

    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Stable machine-readable code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::MissingToken => "MISSING_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::TokenInvalid => "TOKEN_INVALID",
            Self::WrongTokenType { .. } => "WRONG_TOKEN_TYPE",
            Self::AuthenticationFailed => "AUTHENTICATION_FAILED",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
