use crate::error::ApiError;
use crate::services::users::{map_user, password, SELECT_USER};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::model::user::UserProfile;
use common::requests::LoginRequest;
use common::responses::LoginResponse;
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension};

/// Handler for `POST /auth/login`.
pub async fn process(
    state: web::Data<AppState>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let LoginRequest { user, password } = payload.into_inner();
    if user.trim().is_empty() || password.is_empty() {
        return Err(ApiError::Validation(
            "Se requieren usuario y contraseña".to_string(),
        ));
    }

    let login = user.trim().to_string();
    let profile = state
        .db
        .run(move |conn| authenticate(conn, &login, &password))
        .await
        .inspect_err(|e| warn!("Failed login for '{}': {}", user.trim(), e))?;

    let token = state
        .tokens
        .issue(
            profile.id,
            &profile.first_name,
            &profile.last_name,
            profile.privileged,
        )?;

    info!("User {} logged in", profile.id);
    Ok(HttpResponse::Ok().json(LoginResponse {
        message: "Inicio de sesión exitoso".to_string(),
        token,
    }))
}

/// Looks the account up by username or email and checks the password.
pub fn authenticate(conn: &Connection, login: &str, plain: &str) -> Result<UserProfile, ApiError> {
    let found = conn
        .query_row(
            &format!(
                "SELECT {}, contrasena FROM usuarios WHERE usuario = ?1 OR correo = ?1",
                SELECT_USER
            ),
            params![login],
            |row| Ok((map_user(row)?, row.get::<_, String>(6)?)),
        )
        .optional()?;

    let (profile, hash) =
        found.ok_or_else(|| ApiError::NotFound("Usuario no encontrado".to_string()))?;

    if !password::verify(plain, &hash)? {
        return Err(ApiError::Unauthorized("Contraseña Incorrecta".to_string()));
    }
    Ok(profile)
}
