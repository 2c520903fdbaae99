use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;

mod config;
mod controllers;
mod db;
mod events;
mod models;
mod stream;
mod watcher;

use config::Config;
use db::Database;
use events::EventParser;
use stream::StreamManager;
use watcher::WatcherService;

pub struct AppState {
    pub config: Config,
    pub watcher: Arc<WatcherService>,
    pub parser: Arc<EventParser>,
    pub streams: Arc<StreamManager>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let port = config.port;

    log::info!("Initializing database at {}", config.database_url);
    let db = Database::new(&config.database_url).expect("Failed to initialize database");
    let db = Arc::new(db);

    let watcher = Arc::new(WatcherService::new(db));
    let parser = Arc::new(EventParser::new(watcher.clone()));
    let streams = Arc::new(StreamManager::new(
        parser.clone(),
        config.openai_api_url.clone(),
        config.openai_api_key.clone().unwrap_or_default(),
    ));

    if config.openai_api_key.is_none() {
        log::warn!("OPENAI_API_KEY not set - stream subscriptions are disabled");
    }

    log::info!("Starting agent watcher server on port {}", port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(AppState {
                config: config.clone(),
                watcher: Arc::clone(&watcher),
                parser: Arc::clone(&parser),
                streams: Arc::clone(&streams),
            }))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config)
            .configure(controllers::sessions::config)
            .configure(controllers::telemetry::config)
            .configure(controllers::streams::config)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
