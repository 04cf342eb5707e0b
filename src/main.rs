use actix_web::{web, App, HttpServer};
use clap::Parser;
use log::info;

use engine_chess_web::config::Config;
use engine_chess_web::engine::UciEngine;
use engine_chess_web::models::AppState;
use engine_chess_web::routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::parse();
    info!("Starting chess server at http://{}", config.bind);
    info!(
        "Engine {} (skill {}, depth {}, threads {})",
        config.engine_path.display(),
        config.skill_level,
        config.depth,
        config.threads
    );

    // The engine process is started on the first request that needs it
    let engine = UciEngine::new(config.engine_config())?;
    let app_state = web::Data::new(AppState::new(Box::new(engine)));
    let static_dir = config.static_dir.clone();

    HttpServer::new(move || {
        let static_dir = static_dir.clone();
        App::new()
            .app_data(app_state.clone())
            .configure(move |cfg| routes::configure_routes(cfg, &static_dir))
    })
    .bind(&config.bind)?
    .run()
    .await
}
