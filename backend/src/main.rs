mod config;
mod db;
mod error;
mod services;
mod state;
#[cfg(test)]
mod test_support;

use crate::config::Config;
use crate::state::AppState;
use actix_web::{middleware, web, App, HttpServer};
use env_logger::Env;
use log::{error, info, warn};
use std::io;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // A missing .env is fine; the real environment still applies.
    dotenvy::dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| {
        error!("{}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let state = AppState::new(config);
    state.db.initialize().map_err(|e| {
        error!("Could not prepare the database: {}", e);
        io::Error::other(e.to_string())
    })?;

    if let Some(seed) = state.config.admin.clone() {
        let username = seed.username.clone();
        match state
            .db
            .run(move |conn| services::users::create::ensure_admin(conn, &seed))
            .await
        {
            Ok(true) => info!("Created administrator account '{}'", username),
            Ok(false) => {}
            Err(e) => warn!("Could not create administrator '{}': {}", username, e),
        }
    }

    let host = state.config.host.clone();
    let port = state.config.port;
    let static_dir = state.config.static_dir.clone();
    match &static_dir {
        Some(dir) => info!("Serving frontend from {}", dir.display()),
        None => info!("STATIC_DIR not set, serving the API only"),
    }

    info!("Server running at http://{}:{}", host, port);

    HttpServer::new(move || {
        let app = App::new()
            .wrap(middleware::Logger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(services::configure);
        match &static_dir {
            Some(dir) => app.service(services::frontend::service(dir)),
            None => app,
        }
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
