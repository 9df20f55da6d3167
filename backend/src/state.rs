//! Shared application state.
//!
//! Built once in `main.rs` and handed to every worker as `web::Data`. It holds
//! no engine data of its own: lockers, blocks and users live in SQLite and
//! every request goes through [`Database::run`].

use crate::config::Config;
use crate::db::Database;
use crate::services::auth::token::TokenService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    /// Signs tokens at login and verifies them in the guards.
    pub tokens: TokenService,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            db: Database::new(&config.database_path),
            tokens: TokenService::new(&config.jwt_secret, config.jwt_ttl),
            config: Arc::new(config),
        }
    }
}
