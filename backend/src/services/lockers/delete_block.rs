use crate::error::ApiError;
use crate::services::auth::guard::AdminUser;
use crate::services::lockers::normalize_letter;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::responses::{Affected, ApiResponse};
use log::info;
use rusqlite::{params, Connection};

/// Handler for `DELETE /casillero/bloque/{letra}`.
pub async fn process(
    state: web::Data<AppState>,
    admin: AdminUser,
    letter: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let letter = normalize_letter(&letter)?;
    let target = letter.clone();
    let affected = state.db.run(move |conn| delete_block(conn, &target)).await?;

    info!("Block {} deleted by user {}", letter, admin.0.user_id);
    Ok(HttpResponse::Ok().json(ApiResponse::new(
        "Bloque eliminado correctamente",
        Affected { affected },
    )))
}

/// Removes the block row; its lockers go with it through the FK cascade.
pub fn delete_block(conn: &Connection, letter: &str) -> Result<usize, ApiError> {
    let affected = conn.execute("DELETE FROM bloque WHERE letra = ?1", params![letter])?;
    if affected == 0 {
        return Err(ApiError::NotFound("No se encontró el bloque".to_string()));
    }
    Ok(affected)
}
