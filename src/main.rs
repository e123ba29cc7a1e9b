use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;

use taskboard::auth::{JwtKeys, PasswordHasher, TokenCodec};
use taskboard::config::Config;
use taskboard::repository::PgUserRepository;
use taskboard::routes;
use taskboard::state::AppState;

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    log::error!("{}: {}", context, err);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| startup_error("invalid configuration", e))?;

    let keys = JwtKeys::from_config(&config.jwt).map_err(|e| startup_error("cannot load keys", e))?;
    let codec = TokenCodec::new(keys, &config.jwt);
    codec
        .self_check()
        .map_err(|e| startup_error("token signing keys rejected", e))?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .map_err(|e| startup_error("failed to connect to database", e))?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| startup_error("failed to run migrations", e))?;

    let state = AppState::new(
        Arc::new(PgUserRepository::new(pool.clone())),
        PasswordHasher::new(config.password),
        codec,
    )
    .map_err(|e| startup_error("failed to prepare authentication", e))?;

    log::info!("Starting Taskboard server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(state.clone()))
            .service(routes::health::health)
            .service(web::scope("/api/v1").configure(routes::config))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
