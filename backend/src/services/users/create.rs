use crate::config::AdminSeed;
use crate::error::ApiError;
use crate::services::auth::guard::AdminUser;
use crate::services::users::{duplicate_as_conflict, is_valid_email, password};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::model::user::{NewUser, UserProfile};
use common::responses::ApiResponse;
use log::info;
use rusqlite::{params, Connection, OptionalExtension};

/// Handler for `POST /usuarios`.
pub async fn process(
    state: web::Data<AppState>,
    admin: AdminUser,
    payload: web::Json<NewUser>,
) -> Result<HttpResponse, ApiError> {
    let new_user = payload.into_inner();
    validate(&new_user)?;

    let profile = state.db.run(move |conn| insert_user(conn, &new_user)).await?;

    info!("User {} ({}) created by user {}", profile.id, profile.username, admin.0.user_id);
    Ok(HttpResponse::Created().json(ApiResponse::new("Usuario creado correctamente", profile)))
}

pub fn validate(user: &NewUser) -> Result<(), ApiError> {
    let fields = [
        ("nombre", &user.first_name),
        ("apellido", &user.last_name),
        ("correo", &user.email),
        ("contrasena", &user.password),
        ("usuario", &user.username),
    ];
    if let Some((name, _)) = fields.iter().find(|(_, v)| v.trim().is_empty()) {
        return Err(ApiError::Validation(format!("El campo {} es obligatorio", name)));
    }
    if !is_valid_email(&user.email) {
        return Err(ApiError::Validation(
            "El correo debe ser un correo electrónico válido".to_string(),
        ));
    }
    password::check_policy(&user.password)
}

/// Hashes the password and stores the account.
pub fn insert_user(conn: &Connection, user: &NewUser) -> Result<UserProfile, ApiError> {
    let hash = password::hash(&user.password)?;
    conn.execute(
        "INSERT INTO usuarios (nombre, apellido, correo, contrasena, usuario, rol) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user.first_name.trim(),
            user.last_name.trim(),
            user.email.trim(),
            hash,
            user.username.trim(),
            user.privileged
        ],
    )
    .map_err(duplicate_as_conflict)?;

    Ok(UserProfile {
        id: conn.last_insert_rowid(),
        first_name: user.first_name.trim().to_string(),
        last_name: user.last_name.trim().to_string(),
        email: user.email.trim().to_string(),
        username: user.username.trim().to_string(),
        privileged: user.privileged,
    })
}

/// Creates the bootstrap administrator unless its username is taken.
/// Returns whether an account was created.
pub fn ensure_admin(conn: &Connection, seed: &AdminSeed) -> Result<bool, ApiError> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM usuarios WHERE usuario = ?1",
            params![seed.username],
            |row| row.get(0),
        )
        .optional()?;
    if existing.is_some() {
        return Ok(false);
    }

    insert_user(
        conn,
        &NewUser {
            first_name: seed.username.clone(),
            last_name: String::new(),
            email: seed.email.clone(),
            password: seed.password.clone(),
            username: seed.username.clone(),
            privileged: true,
        },
    )?;
    Ok(true)
}
