//! Fixtures shared by the unit and HTTP tests.

use crate::config::Config;
use crate::services::auth::token::TokenService;
use crate::services::users::create::insert_user;
use crate::state::AppState;
use common::model::user::{NewUser, UserProfile};
use rusqlite::Connection;
use std::time::Duration;
use tempfile::TempDir;

pub const SECRET: &str = "test-secret";

/// Token service sharing the secret of [`state`].
pub fn tokens() -> TokenService {
    TokenService::new(SECRET, Duration::from_secs(3600))
}

/// State over a fresh database file. Keep the `TempDir` alive for as long as
/// the database is used.
pub fn state() -> (AppState, TempDir) {
    state_with(|_| {})
}

pub fn state_with(customize: impl FnOnce(&mut Config)) -> (AppState, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("casilleros.sqlite");
    let db_path = db_path.to_string_lossy().into_owned();

    let mut config = Config::from_lookup(|key| match key {
        "JWT_SECRET" => Some(SECRET.to_string()),
        "JWT_TTL_SECS" => Some("3600".to_string()),
        "DATABASE_PATH" => Some(db_path.clone()),
        _ => None,
    })
    .unwrap();
    customize(&mut config);

    let state = AppState::new(config);
    state.db.initialize().unwrap();
    (state, dir)
}

pub fn seed_user(conn: &Connection, username: &str, privileged: bool) -> UserProfile {
    insert_user(
        conn,
        &NewUser {
            first_name: "Staff".to_string(),
            last_name: username.to_string(),
            email: format!("{}@uni.cl", username),
            password: "Secreta1!".to_string(),
            username: username.to_string(),
            privileged,
        },
    )
    .unwrap()
}

/// `Authorization` header value for a user with the given role.
pub fn bearer(user_id: i64, privileged: bool) -> String {
    let token = tokens()
        .issue(user_id, "Staff", "Tester", privileged)
        .unwrap();
    format!("Bearer {}", token)
}
