use std::sync::Arc;

use crate::auth::error::AuthError;
use crate::auth::gate::AuthGate;
use crate::auth::password::PasswordHasher;
use crate::auth::resolver::IdentityResolver;
use crate::auth::token::TokenCodec;
use crate::repository::UserRepository;

/// Services shared read-only by every request.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub hasher: PasswordHasher,
    pub codec: Arc<TokenCodec>,
    pub resolver: IdentityResolver,
    pub gate: AuthGate,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: PasswordHasher,
        codec: TokenCodec,
    ) -> Result<Self, AuthError> {
        let codec = Arc::new(codec);
        Ok(Self {
            resolver: IdentityResolver::new(codec.clone()),
            gate: AuthGate::new(users.clone(), hasher, codec.clone())?,
            users,
            hasher,
            codec,
        })
    }
}
