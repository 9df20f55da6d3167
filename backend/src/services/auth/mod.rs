//! # Auth Service Module
//!
//! Staff login and the bearer-token guards used by the other services.
//!
//! ## Sub-modules:
//! - `login`: checks credentials and issues a token.
//! - `token`: signing and verification of HS256 tokens.
//! - `guard`: [`guard::AuthUser`] and [`guard::AdminUser`] extractors.

pub mod guard;
pub(crate) mod login;
pub mod token;

use actix_web::web::{post, scope};
use actix_web::Scope;

const API_PATH: &str = "/auth";

/// Configures the auth routes.
///
/// # Registered Routes:
///
/// * **`POST /login`**: `{user, password}` where `user` is a username or an
///   email. Returns `{message, token}`.
pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/login", post().to(login::process))
}
