use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::extractors::AuthenticatedUserId;
use crate::auth::resolver::bearer_token;
use crate::error::AppError;
use crate::state::AppState;

/// Rejects requests without a valid access token.
///
/// On success the subject id is stored in the request extensions as
/// [`AuthenticatedUserId`]. Wrap only the scopes that need protecting.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let resolved = match req.app_data::<web::Data<AppState>>() {
            Some(state) => state
                .resolver
                .resolve_from_bearer(bearer_token(req.headers()))
                .map_err(AppError::from),
            None => Err(AppError::InternalServerError(
                "AppState is not registered".into(),
            )),
        };

        match resolved {
            Ok(user_id) => {
                req.extensions_mut().insert(AuthenticatedUserId(user_id));
                let fut = self.service.call(req);
                Box::pin(fut)
            }
            Err(app_err) => {
                log::debug!("{} {} refused: {}", req.method(), req.path(), app_err);
                Box::pin(async move { Err(app_err.into()) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::PasswordHasher;
    use crate::auth::token::test_support::test_codec;
    use crate::auth::token::TokenType;
    use crate::config::PasswordConfig;
    use crate::repository::InMemoryUserRepository;
    use actix_web::{http::StatusCode, test, App, HttpResponse};
    use std::sync::Arc;
    use uuid::Uuid;

    async fn whoami(user_id: AuthenticatedUserId) -> HttpResponse {
        HttpResponse::Ok().body(user_id.0.to_string())
    }

    fn state() -> AppState {
        AppState::new(
            Arc::new(InMemoryUserRepository::new()),
            PasswordHasher::new(PasswordConfig {
                bcrypt_cost: crate::config::MIN_BCRYPT_COST,
                max_length: 72,
            }),
            test_codec(),
        )
        .unwrap()
    }

    #[actix_rt::test]
    async fn test_middleware_passes_access_token() {
        let state = state();
        let user_id = Uuid::new_v4();
        let token = state.codec.mint(user_id, TokenType::Access).unwrap();
        let app = test::init_service(
            App::new().app_data(web::Data::new(state)).service(
                web::scope("/protected")
                    .wrap(AuthMiddleware)
                    .route("", web::get().to(whoami)),
            ),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/protected")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert_eq!(body, user_id.to_string().as_bytes());
    }

    #[actix_rt::test]
    async fn test_middleware_rejects_missing_and_refresh_tokens() {
        let state = state();
        let refresh = state.codec.mint(Uuid::new_v4(), TokenType::Refresh).unwrap();
        let app = test::init_service(
            App::new().app_data(web::Data::new(state)).service(
                web::scope("/protected")
                    .wrap(AuthMiddleware)
                    .route("", web::get().to(whoami)),
            ),
        )
        .await;

        let req = test::TestRequest::get().uri("/protected").to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/protected")
            .insert_header(("Authorization", format!("Bearer {}", refresh)))
            .to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }
}
