use actix_web::dev::Payload;
use actix_web::{web, Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::auth::error::AuthError;
use crate::error::AppError;
use crate::models::User;
use crate::state::AppState;

/// The authenticated user's id, as placed in the request extensions by
/// `AuthMiddleware`.
///
/// Missing extensions mean the route was not wrapped by the middleware;
/// that is reported as `401` rather than trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUserId(pub Uuid);

impl AuthenticatedUserId {
    fn from_extensions(req: &HttpRequest) -> Result<Self, AppError> {
        req.extensions()
            .get::<AuthenticatedUserId>()
            .copied()
            .ok_or_else(|| {
                AppError::Unauthorized(
                    "User ID not found in request. Ensure AuthMiddleware is active.".to_string(),
                )
            })
    }
}

impl FromRequest for AuthenticatedUserId {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::from_extensions(req).map_err(ActixError::from))
    }
}

/// The full record of the authenticated user.
///
/// Tokens outlive their users: a valid token whose subject has since been
/// deleted fails with `UserNotFound`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequest for CurrentUser {
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user_id = AuthenticatedUserId::from_extensions(req);
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move { load_user(state, user_id).await.map_err(ActixError::from) })
    }
}

async fn load_user(
    state: Option<web::Data<AppState>>,
    user_id: Result<AuthenticatedUserId, AppError>,
) -> Result<CurrentUser, AppError> {
    let AuthenticatedUserId(user_id) = user_id?;
    let state = state
        .ok_or_else(|| AppError::InternalServerError("AppState is not registered".into()))?;

    match state.users.find_by_id(user_id).await? {
        Some(user) => Ok(CurrentUser(user)),
        None => {
            log::debug!("token subject {} no longer exists", user_id);
            Err(AuthError::UserNotFound.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::dev::Payload;
    use actix_web::http::StatusCode;
    use actix_web::test;

    #[actix_rt::test]
    async fn test_authenticated_user_id_extractor_success() {
        let req = test::TestRequest::default().to_http_request();
        let user_id = Uuid::new_v4();
        req.extensions_mut().insert(AuthenticatedUserId(user_id));

        let mut payload = Payload::None;
        let extracted = AuthenticatedUserId::from_request(&req, &mut payload).await;
        assert_eq!(extracted.unwrap().0, user_id);
    }

    #[actix_rt::test]
    async fn test_authenticated_user_id_extractor_failure() {
        let req = test::TestRequest::default().to_http_request();

        let mut payload = Payload::None;
        let extracted = AuthenticatedUserId::from_request(&req, &mut payload).await;

        let err = extracted.unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_rt::test]
    async fn test_current_user_without_state_is_server_error() {
        let req = test::TestRequest::default().to_http_request();
        req.extensions_mut().insert(AuthenticatedUserId(Uuid::new_v4()));

        let mut payload = Payload::None;
        let err = CurrentUser::from_request(&req, &mut payload).await.unwrap_err();
        assert_eq!(
            err.error_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
