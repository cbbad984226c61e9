use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use sqlx::postgres::PgPoolOptions;

use taskgate::auth::{BcryptHasher, TokenService};
use taskgate::repositories::{PgTaskRepository, PgUserRepository};
use taskgate::services::{TaskService, UserService};
use taskgate::{routes, AppError, Config};

fn startup_error(message: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, message.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(startup_error)?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(config.store_timeout)
        .connect(&config.database_url)
        .await
        .map_err(|e| startup_error(format!("failed to connect to database: {}", e)))?;

    let users_repo = PgUserRepository::new(pool.clone(), config.store_timeout)
        .await
        .map_err(startup_error)?;
    let tasks_repo = PgTaskRepository::new(pool, config.store_timeout)
        .await
        .map_err(startup_error)?;

    let ttl = chrono::Duration::from_std(config.jwt_ttl)
        .map_err(|e| startup_error(AppError::Signing(e.to_string())))?;
    let tokens = TokenService::new(config.jwt_secret.as_bytes(), ttl);

    let users = web::Data::new(UserService::new(
        Arc::new(users_repo),
        Arc::new(BcryptHasher::new()),
        tokens.clone(),
    ));
    let tasks = web::Data::new(TaskService::new(Arc::new(tasks_repo)));
    let tokens = web::Data::new(tokens);

    log::info!("Starting server at {}", config.server_url());

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(users.clone())
            .app_data(tasks.clone())
            .app_data(tokens.clone())
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
