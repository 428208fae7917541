use std::sync::Arc;

use actix_files as fs;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use clap::Parser;
use log::info;

use chess_room_server::config::ServerConfig;
use chess_room_server::game::{ChessRules, RoomRegistry};
use chess_room_server::routes::configure_routes;
use chess_room_server::state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = ServerConfig::parse();
    let (host, port) = (config.host.clone(), config.port);
    let static_dir = config.static_dir.clone();

    info!("Starting chess room server at http://{}:{}", host, port);

    // Create shared application state
    let rooms = RoomRegistry::new(Arc::new(ChessRules), config.initial_time_ms());
    let app_state = web::Data::new(AppState::new(rooms, config));

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(Logger::default())
            .configure(configure_routes)
            .service(fs::Files::new("/static", &static_dir))
    })
    .bind((host, port))?
    .run()
    .await
}
