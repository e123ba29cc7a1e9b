pub mod clock;
pub mod error;
pub mod extractors;
pub mod gate;
pub mod keys;
pub mod middleware;
pub mod password;
pub mod resolver;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::AuthError;
pub use extractors::{AuthenticatedUserId, CurrentUser};
pub use gate::AuthGate;
pub use keys::JwtKeys;
pub use middleware::AuthMiddleware;
pub use password::PasswordHasher;
pub use resolver::{bearer_token, IdentityResolver};
pub use token::{Claims, TokenCodec, TokenPair, TokenType};

/// Body of `POST /jwt/create`.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
}

/// Body of `POST /jwt/refresh`.
#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

/// Body of `POST /jwt/validate`.
#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub token: String,
}

/// A freshly minted token pair as sent to the client.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Always `"Bearer"`.
    pub token_type: String,
}

impl From<TokenPair> for TokenPairResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidationResponse {
    pub validation_result: bool,
}
