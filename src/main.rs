use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};

mod accounts;
mod auth;
mod cart;
mod catalog;
mod config;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod state;
mod store;
mod uploads;

use auth::TokenService;
use config::Config;
use state::AppState;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let database = db::connect(&config)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    let store = Arc::new(db::MongoStore::new(&database));
    store
        .init()
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    log::info!("Connected to database {}", config.database_name);

    std::fs::create_dir_all(&config.upload_dir)?;

    let state = web::Data::new(AppState {
        catalog: store.clone(),
        accounts: store,
        tokens: Arc::new(TokenService::new(&config.jwt_secret, config.token_ttl_hours)),
        upload_dir: config.upload_dir.clone(),
        public_url: config.public_url.clone(),
        max_upload_bytes: config.max_upload_bytes,
    });

    log::info!("Server running on {}:{}", config.host, config.port);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .configure(|cfg| routes::configure(cfg, &state))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
