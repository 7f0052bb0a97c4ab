use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

pub fn config_api(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(root))
        .route("/health", web::get().to(health));
}

async fn root() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "message": "Content backend API",
        "health": "/health",
    }))
}

async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "content-backend",
    }))
}
