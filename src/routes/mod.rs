use actix_files as fs;
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use std::path::{Path, PathBuf};

use crate::models::AppState;

/// Directory holding `index.html` and the client assets
#[derive(Debug, Clone)]
pub struct StaticDir(pub PathBuf);

/// HTTP handler for the index page
pub async fn index(static_dir: web::Data<StaticDir>) -> actix_web::Result<fs::NamedFile> {
    Ok(fs::NamedFile::open_async(static_dir.0.join("index.html")).await?)
}

/// Liveness probe with the number of open games
pub async fn health(app_state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "active_sessions": app_state.active_sessions(),
    }))
}

/// Configure the HTTP routes
pub fn configure_routes(cfg: &mut web::ServiceConfig, static_dir: &Path) {
    cfg.app_data(web::Data::new(StaticDir(static_dir.to_path_buf())))
        .service(web::resource("/ws").route(web::get().to(crate::websocket::ws_index)))
        .service(web::resource("/health").route(web::get().to(health)))
        .service(web::resource("/").route(web::get().to(index)))
        .service(fs::Files::new("/static", static_dir));
}
