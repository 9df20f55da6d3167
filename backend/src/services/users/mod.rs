//! # Users Service Module
//!
//! Staff accounts: the people who log in and register lockers. Passwords are
//! kept as bcrypt hashes and never leave this module.
//!
//! ## Sub-modules:
//! - `create`, `list`, `get`, `update`, `delete`: one handler each.
//! - `password`: hashing and the password policy.

pub mod create;
mod delete;
pub(crate) mod get;
mod list;
pub mod password;
mod update;

use crate::error::{is_constraint_violation, ApiError};
use actix_web::web::{delete, get, patch, post, scope};
use actix_web::Scope;
use common::model::user::UserProfile;
use regex::Regex;
use rusqlite::Row;
use std::sync::LazyLock;

const API_PATH: &str = "/usuarios";

/// Columns read by [`map_user`], in order.
pub const SELECT_USER: &str = "id, nombre, apellido, correo, usuario, rol";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Configures the user routes.
///
/// # Registered Routes:
///
/// * **`POST /`** (admin): creates an account.
/// * **`GET /`** (admin): lists accounts.
/// * **`GET /{id}`** (auth): one account.
/// * **`PATCH /{id}`** (auth): partial update. Non-admins may only edit
///   themselves and cannot change `rol`.
/// * **`DELETE /{id}`** (admin): removes an account.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", post().to(create::process))
        .route("", get().to(list::process))
        .route("/{id}", get().to(get::process))
        .route("/{id}", patch().to(update::process))
        .route("/{id}", delete().to(delete::process))
}

pub fn map_user(row: &Row<'_>) -> rusqlite::Result<UserProfile> {
    Ok(UserProfile {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        username: row.get(4)?,
        privileged: row.get(5)?,
    })
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value.trim())
}

/// Maps a UNIQUE failure on `correo`/`usuario` to a conflict.
fn duplicate_as_conflict(e: rusqlite::Error) -> ApiError {
    if is_constraint_violation(&e) {
        ApiError::Conflict("El correo o usuario ya existe.".to_string())
    } else {
        ApiError::Database(e)
    }
}

#[cfg(test)]
mod tests {
    use crate::services;
    use crate::test_support::{self, bearer, seed_user};
    use actix_web::http::header::AUTHORIZATION;
    use actix_web::http::StatusCode;
    use actix_web::test::{call_service, init_service, read_body_json, TestRequest};
    use actix_web::{web, App};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn login_then_manage_accounts() {
        let (state, _dir) = test_support::state();
        state
            .db
            .run(|conn| Ok(seed_user(conn, "admin", true)))
            .await
            .unwrap();
        let app = init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(services::configure),
        )
        .await;

        let login = TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({ "user": "admin@uni.cl", "password": "Secreta1!" }))
            .to_request();
        let resp = call_service(&app, login).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = read_body_json(resp).await;
        let token = format!("Bearer {}", body["token"].as_str().unwrap());

        let create = TestRequest::post()
            .uri("/api/v1/usuarios")
            .insert_header((AUTHORIZATION, token.clone()))
            .set_json(json!({
                "nombre": "Luis",
                "apellido": "Rojas",
                "correo": "luis@uni.cl",
                "contrasena": "Secreta1!",
                "usuario": "lrojas"
            }))
            .to_request();
        let resp = call_service(&app, create).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = read_body_json(resp).await;
        assert_eq!(body["data"]["rol"], false);
        assert!(body["data"].get("contrasena").is_none());
        let id = body["data"]["id"].as_i64().unwrap();

        let duplicate = TestRequest::post()
            .uri("/api/v1/usuarios")
            .insert_header((AUTHORIZATION, token.clone()))
            .set_json(json!({
                "nombre": "Otro",
                "apellido": "Rojas",
                "correo": "otro@uni.cl",
                "contrasena": "Secreta1!",
                "usuario": "lrojas"
            }))
            .to_request();
        assert_eq!(call_service(&app, duplicate).await.status(), StatusCode::CONFLICT);

        let list = TestRequest::get()
            .uri("/api/v1/usuarios")
            .insert_header((AUTHORIZATION, token.clone()))
            .to_request();
        let body: Value = read_body_json(call_service(&app, list).await).await;
        assert_eq!(body["data"].as_array().map(Vec::len), Some(2));

        let delete = TestRequest::delete()
            .uri(&format!("/api/v1/usuarios/{}", id))
            .insert_header((AUTHORIZATION, token.clone()))
            .to_request();
        assert_eq!(call_service(&app, delete).await.status(), StatusCode::OK);

        let again = TestRequest::delete()
            .uri(&format!("/api/v1/usuarios/{}", id))
            .insert_header((AUTHORIZATION, token))
            .to_request();
        assert_eq!(call_service(&app, again).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn wrong_password_and_staff_limits() {
        let (state, _dir) = test_support::state();
        let staff = state
            .db
            .run(|conn| Ok(seed_user(conn, "staff", false)))
            .await
            .unwrap();
        let app = init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(services::configure),
        )
        .await;

        let login = TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({ "user": "staff", "password": "Secreta1?" }))
            .to_request();
        let resp = call_service(&app, login).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = read_body_json(resp).await;
        assert_eq!(body["message"], "Contraseña Incorrecta");

        let list = TestRequest::get()
            .uri("/api/v1/usuarios")
            .insert_header((AUTHORIZATION, bearer(staff.id, false)))
            .to_request();
        assert_eq!(call_service(&app, list).await.status(), StatusCode::FORBIDDEN);

        let promote = TestRequest::patch()
            .uri(&format!("/api/v1/usuarios/{}", staff.id))
            .insert_header((AUTHORIZATION, bearer(staff.id, false)))
            .set_json(json!({ "rol": true }))
            .to_request();
        assert_eq!(call_service(&app, promote).await.status(), StatusCode::FORBIDDEN);

        let rename = TestRequest::patch()
            .uri(&format!("/api/v1/usuarios/{}", staff.id))
            .insert_header((AUTHORIZATION, bearer(staff.id, false)))
            .set_json(json!({ "nombre": "Renombrado" }))
            .to_request();
        let resp = call_service(&app, rename).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = read_body_json(resp).await;
        assert_eq!(body["data"]["nombre"], "Renombrado");
        assert_eq!(body["data"]["usuario"], "staff");

        let fetch = TestRequest::get()
            .uri("/api/v1/usuarios/9999")
            .insert_header((AUTHORIZATION, bearer(staff.id, false)))
            .to_request();
        assert_eq!(call_service(&app, fetch).await.status(), StatusCode::NOT_FOUND);
    }
}
