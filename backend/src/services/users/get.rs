use crate::error::ApiError;
use crate::services::auth::guard::AuthUser;
use crate::services::users::{map_user, SELECT_USER};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::model::user::UserProfile;
use common::responses::ApiResponse;
use rusqlite::{params, Connection, OptionalExtension};

/// Handler for `GET /usuarios/{id}`.
pub async fn process(
    state: web::Data<AppState>,
    _user: AuthUser,
    id: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();
    let profile = state
        .db
        .run(move |conn| find_user(conn, id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Usuario no encontrado".to_string()))?;
    Ok(HttpResponse::Ok().json(ApiResponse::new("Usuario encontrado", profile)))
}

pub fn find_user(conn: &Connection, id: i64) -> Result<Option<UserProfile>, ApiError> {
    Ok(conn
        .query_row(
            &format!("SELECT {} FROM usuarios WHERE id = ?1", SELECT_USER),
            params![id],
            map_user,
        )
        .optional()?)
}
