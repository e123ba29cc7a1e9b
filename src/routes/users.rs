use crate::{
    auth::{
        CurrentUser, LoginRequest, RefreshRequest, TokenPairResponse, ValidateRequest,
        ValidationResponse,
    },
    error::AppError,
    models::{User, UserInput},
    state::AppState,
};
use actix_web::{post, web, HttpResponse, Responder};
use validator::Validate;

/// Login
///
/// Exchanges `{email, password}` for an access/refresh token pair.
/// A wrong email and a wrong password both answer `401` with the same body.
#[post("/jwt/create")]
pub async fn create_jwt(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let pair = state
        .gate
        .login(&login_data.email, &login_data.password)
        .await?;

    Ok(HttpResponse::Created().json(TokenPairResponse::from(pair)))
}

/// Refresh
///
/// Mints a new pair from a refresh token. Access tokens are refused.
#[post("/jwt/refresh")]
pub async fn refresh_jwt(
    state: web::Data<AppState>,
    refresh_data: web::Json<RefreshRequest>,
) -> Result<impl Responder, AppError> {
    refresh_data.validate()?;

    let pair = state.gate.refresh(&refresh_data.refresh_token).await?;

    Ok(HttpResponse::Ok().json(TokenPairResponse::from(pair)))
}

/// Reports whether a token has a valid signature and has not expired.
/// Never fails on a bad token.
#[post("/jwt/validate")]
pub async fn validate_jwt(
    state: web::Data<AppState>,
    body: web::Json<ValidateRequest>,
) -> impl Responder {
    let validation_result = match state.codec.verify_and_decode(body.token.trim()) {
        Ok(_) => true,
        Err(err) => {
            log::debug!("token validation failed: {}", err);
            false
        }
    };

    HttpResponse::Ok().json(ValidationResponse { validation_result })
}

/// Register a new user
///
/// Creates the account and returns it without the password hash.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    register_data: web::Json<UserInput>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let user = User::new(register_data.into_inner(), &state.hasher)?;
    let user = state.users.insert(user).await?;
    log::info!("registered user {}", user.id);

    Ok(HttpResponse::Created().json(user))
}

/// The authenticated user's own record.
pub async fn me(user: CurrentUser) -> impl Responder {
    HttpResponse::Ok().json(user.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::PasswordHasher;
    use crate::auth::token::test_support::test_codec;
    use crate::auth::AuthMiddleware;
    use crate::config::PasswordConfig;
    use crate::repository::InMemoryUserRepository;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::json;
    use std::sync::Arc;

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
    async fn test_register_validation() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state()))
                .service(register),
        )
        .await;

        // Test invalid email
        let req = test::TestRequest::post()
            .uri("/register")
            .set_json(json!({
                "username": "tester",
                "email": "invalid-email",
                "password": "password123"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_client_error());

        // Test short password
        let req = test::TestRequest::post()
            .uri("/register")
            .set_json(json!({
                "username": "tester",
                "email": "test@example.com",
                "password": "short"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_client_error());
    }

    #[actix_rt::test]
    async fn test_register_rejects_multibyte_password_over_72_bytes() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state()))
                .service(register),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/register")
            .set_json(json!({
                "username": "tester",
                "email": "test@example.com",
                "password": "é".repeat(40)
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[actix_rt::test]
    async fn test_register_rejects_duplicates() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state()))
                .service(register),
        )
        .await;
        let body = json!({
            "username": "tester",
            "email": "test@example.com",
            "password": "password123"
        });

        let req = test::TestRequest::post().uri("/register").set_json(&body).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(created["email"], "test@example.com");
        assert!(created.get("password_hash").is_none());

        let req = test::TestRequest::post().uri("/register").set_json(&body).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_rt::test]
    async fn test_validate_never_fails() {
        let state = state();
        let token = state
            .codec
            .mint(uuid::Uuid::new_v4(), crate::auth::TokenType::Refresh)
            .unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(validate_jwt),
        )
        .await;

        for (candidate, expected) in [("not.a.token", false), ("", false), (token.as_str(), true)] {
            let req = test::TestRequest::post()
                .uri("/jwt/validate")
                .set_json(json!({ "token": candidate }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
            let body: ValidationResponse = test::read_body_json(resp).await;
            assert_eq!(body.validation_result, expected, "token {:?}", candidate);
        }
    }

    #[actix_rt::test]
    async fn test_me_requires_access_token() {
        let app = test::init_service(
            App::new().app_data(web::Data::new(state())).service(
                web::resource("/me")
                    .wrap(AuthMiddleware)
                    .route(web::get().to(me)),
            ),
        )
        .await;

        let req = test::TestRequest::get().uri("/me").to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }
}
