//! Per-request identity resolution.
//!
//! A request moves through `unauthenticated -> token_presented ->
//! token_verified -> identity_resolved`, or is rejected at any step. Loading
//! the full user record is left to the caller; this module stops at the
//! subject id.

use std::sync::Arc;

use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use uuid::Uuid;

use crate::auth::error::AuthError;
use crate::auth::token::{Claims, TokenCodec, TokenType};

#[derive(Debug, Clone)]
pub struct IdentityResolver {
    codec: Arc<TokenCodec>,
}

impl IdentityResolver {
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self { codec }
    }

    /// Resolves the subject of an access token.
    pub fn resolve_from_bearer(&self, raw_token: Option<&str>) -> Result<Uuid, AuthError> {
        let token = raw_token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;
        self.resolve(token, TokenType::Access)
    }

    /// Resolves the subject of a refresh token.
    pub fn resolve_from_refresh(&self, raw_refresh_token: &str) -> Result<Uuid, AuthError> {
        self.resolve(raw_refresh_token.trim(), TokenType::Refresh)
    }

    fn resolve(&self, token: &str, expected: TokenType) -> Result<Uuid, AuthError> {
        let claims = self.codec.verify_and_decode(token)?;
        require_type(&claims, expected)?;
        Ok(claims.sub)
    }
}

fn require_type(claims: &Claims, expected: TokenType) -> Result<(), AuthError> {
    if claims.token_type != expected {
        log::debug!(
            "rejected {} token for {} where {} was required",
            claims.token_type,
            claims.sub,
            expected
        );
        return Err(AuthError::WrongTokenType {
            expected,
            found: claims.token_type,
        });
    }
    Ok(())
}

/// Pulls the token out of an `Authorization: Bearer <token>` header.
///
/// The scheme is matched case-insensitively. Any other scheme counts as no
/// token at all.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") {
        Some(token.trim())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::test_support::{manual_codec, test_codec};
    use actix_web::http::header::HeaderValue;
    use pretty_assertions::assert_eq;

    fn resolver() -> (IdentityResolver, Arc<TokenCodec>) {
        let codec = Arc::new(test_codec());
        (IdentityResolver::new(codec.clone()), codec)
    }

    #[test_log::test]
    fn test_bearer_accepts_access_token() {
        let (resolver, codec) = resolver();
        let user_id = Uuid::new_v4();
        let access = codec.mint(user_id, TokenType::Access).unwrap();

        assert_eq!(resolver.resolve_from_bearer(Some(&access)), Ok(user_id));
    }

    #[test_log::test]
    fn test_bearer_rejects_refresh_token() {
        let (resolver, codec) = resolver();
        let refresh = codec.mint(Uuid::new_v4(), TokenType::Refresh).unwrap();

        assert_eq!(
            resolver.resolve_from_bearer(Some(&refresh)),
            Err(AuthError::WrongTokenType {
                expected: TokenType::Access,
                found: TokenType::Refresh,
            })
        );
    }

    #[test_log::test]
    fn test_refresh_path_rejects_access_token() {
        let (resolver, codec) = resolver();
        let user_id = Uuid::new_v4();
        let access = codec.mint(user_id, TokenType::Access).unwrap();
        let refresh = codec.mint(user_id, TokenType::Refresh).unwrap();

        assert_eq!(resolver.resolve_from_refresh(&refresh), Ok(user_id));
        assert_eq!(
            resolver.resolve_from_refresh(&access),
            Err(AuthError::WrongTokenType {
                expected: TokenType::Refresh,
                found: TokenType::Access,
            })
        );
    }

    #[test]
    fn test_missing_token() {
        let (resolver, _) = resolver();
        assert_eq!(resolver.resolve_from_bearer(None), Err(AuthError::MissingToken));
        assert_eq!(resolver.resolve_from_bearer(Some("  ")), Err(AuthError::MissingToken));
    }

    #[test]
    fn test_codec_failures_pass_through() {
        let (codec, clock) = manual_codec();
        let codec = Arc::new(codec);
        let resolver = IdentityResolver::new(codec.clone());
        let access = codec.mint(Uuid::new_v4(), TokenType::Access).unwrap();

        assert_eq!(
            resolver.resolve_from_bearer(Some("not-a-token")),
            Err(AuthError::TokenInvalid)
        );

        clock.advance(chrono::Duration::days(2));
        assert_eq!(
            resolver.resolve_from_bearer(Some(&access)),
            Err(AuthError::TokenExpired)
        );
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer"));
        assert_eq!(bearer_token(&headers), None);
    }
}
