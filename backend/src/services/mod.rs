pub mod auth;
pub mod frontend;
pub mod lockers;
pub mod users;

use crate::error::ApiError;
use actix_web::web::{self, get, scope};
use actix_web::HttpResponse;
use serde_json::json;

const API_PREFIX: &str = "/api/v1";

/// Mounts every API route under `/api/v1`.
///
/// Extractor failures (malformed JSON, non-numeric path segments, bad query
/// strings) are reported through [`ApiError`] so clients always get the same
/// `{message}` body.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(64 * 1024)
            .error_handler(|err, _| ApiError::Validation(format!("JSON inválido: {}", err)).into()),
    )
    .app_data(web::PathConfig::default().error_handler(|err, _| {
        ApiError::Validation(format!("Parámetro de ruta inválido: {}", err)).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _| {
        ApiError::Validation(format!("Parámetro de consulta inválido: {}", err)).into()
    }))
    .service(
        scope(API_PREFIX)
            .route("/health", get().to(health))
            .service(lockers::configure_routes())
            .service(auth::configure_routes())
            .service(users::configure_routes()),
    );
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}
