use crate::error::ApiError;
use crate::services::auth::guard::AdminUser;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::responses::{Affected, ApiResponse};
use log::info;
use rusqlite::{params, Connection};

/// Handler for `DELETE /usuarios/{id}`.
pub async fn process(
    state: web::Data<AppState>,
    admin: AdminUser,
    id: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();
    let affected = state.db.run(move |conn| delete_user(conn, id)).await?;

    info!("User {} deleted by user {}", id, admin.0.user_id);
    Ok(HttpResponse::Ok().json(ApiResponse::new(
        "Usuario eliminado correctamente",
        Affected { affected },
    )))
}

pub fn delete_user(conn: &Connection, id: i64) -> Result<usize, ApiError> {
    let affected = conn.execute("DELETE FROM usuarios WHERE id = ?1", params![id])?;
    if affected == 0 {
        return Err(ApiError::NotFound("Usuario no encontrado".to_string()));
    }
    Ok(affected)
}
