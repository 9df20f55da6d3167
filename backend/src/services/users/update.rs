use crate::error::ApiError;
use crate::services::auth::guard::AuthUser;
use crate::services::auth::token::Claims;
use crate::services::users::get::find_user;
use crate::services::users::{duplicate_as_conflict, is_valid_email, password};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::model::user::{UserProfile, UserUpdate};
use common::responses::ApiResponse;
use log::info;
use rusqlite::{params, Connection, TransactionBehavior};

/// Handler for `PATCH /usuarios/{id}`.
pub async fn process(
    state: web::Data<AppState>,
    user: AuthUser,
    id: web::Path<i64>,
    payload: web::Json<UserUpdate>,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();
    let update = payload.into_inner();
    authorize(&user.0, id, &update)?;
    validate(&update)?;

    let profile = state.db.run(move |conn| update_user(conn, id, &update)).await?;

    info!("User {} updated by user {}", id, user.0.user_id);
    Ok(HttpResponse::Ok().json(ApiResponse::new("Usuario actualizado correctamente", profile)))
}

/// Non-admins may only edit their own account and never their role.
pub fn authorize(caller: &Claims, id: i64, update: &UserUpdate) -> Result<(), ApiError> {
    if caller.rol {
        return Ok(());
    }
    if caller.user_id != id || update.privileged.is_some() {
        return Err(ApiError::Forbidden("Acceso denegado.".to_string()));
    }
    Ok(())
}

pub fn validate(update: &UserUpdate) -> Result<(), ApiError> {
    let fields = [
        ("nombre", &update.first_name),
        ("apellido", &update.last_name),
        ("correo", &update.email),
        ("usuario", &update.username),
    ];
    for (name, value) in fields {
        if matches!(value, Some(v) if v.trim().is_empty()) {
            return Err(ApiError::Validation(format!("El campo {} no puede estar vacío", name)));
        }
    }
    if let Some(email) = &update.email {
        if !is_valid_email(email) {
            return Err(ApiError::Validation(
                "El correo debe ser un correo electrónico válido".to_string(),
            ));
        }
    }
    if let Some(plain) = &update.password {
        password::check_policy(plain)?;
    }
    Ok(())
}

/// Merges `update` into the stored account; a supplied password is re-hashed.
pub fn update_user(
    conn: &mut Connection,
    id: i64,
    update: &UserUpdate,
) -> Result<UserProfile, ApiError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let current = find_user(&tx, id)?
        .ok_or_else(|| ApiError::NotFound("Usuario no encontrado".to_string()))?;
    let merged = update.apply(&current);
    let merged = UserProfile {
        first_name: merged.first_name.trim().to_string(),
        last_name: merged.last_name.trim().to_string(),
        email: merged.email.trim().to_string(),
        username: merged.username.trim().to_string(),
        ..merged
    };

    tx.execute(
        "UPDATE usuarios SET nombre = ?1, apellido = ?2, correo = ?3, usuario = ?4, rol = ?5 \
         WHERE id = ?6",
        params![
            merged.first_name,
            merged.last_name,
            merged.email,
            merged.username,
            merged.privileged,
            id
        ],
    )
    .map_err(duplicate_as_conflict)?;

    if let Some(plain) = &update.password {
        tx.execute(
            "UPDATE usuarios SET contrasena = ?1 WHERE id = ?2",
            params![password::hash(plain)?, id],
        )?;
    }
    tx.commit()?;
    Ok(merged)
}
