use crate::error::ApiError;
use crate::services::auth::guard::AdminUser;
use crate::services::users::{map_user, SELECT_USER};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::model::user::UserProfile;
use common::responses::ApiResponse;
use rusqlite::Connection;

/// Handler for `GET /usuarios`.
pub async fn process(
    state: web::Data<AppState>,
    _admin: AdminUser,
) -> Result<HttpResponse, ApiError> {
    let users = state.db.run(|conn| list_users(conn)).await?;
    if users.is_empty() {
        return Err(ApiError::NotFound("No se encontraron usuarios".to_string()));
    }
    Ok(HttpResponse::Ok().json(ApiResponse::new("Usuarios encontrados", users)))
}

pub fn list_users(conn: &Connection) -> Result<Vec<UserProfile>, ApiError> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM usuarios ORDER BY id", SELECT_USER))?;
    let users = stmt
        .query_map([], map_user)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}
