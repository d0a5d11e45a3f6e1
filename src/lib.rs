mod auth;
mod bootstrap;
mod config;
mod cron_tasks;
mod csrf;
mod database;
mod db;
mod error;
mod forms;
mod middleware;
mod models;
mod routes;
mod service;

#[cfg(test)]
pub mod test_utils;

pub use bootstrap::{BootstrapOutcome, run_bootstrap};
pub use config::Config;
pub use cron_tasks::{HousekeepingResult, run_housekeeping};

use crate::db::stage_db;
use crate::middleware::RequestLogger;
use crate::routes as app_routes;
use crate::service::email::EmailService;
use rocket::fs::FileServer;
use rocket::{Build, Rocket, catchers};

fn ensure_rocket_secret_key() {
    let profile = std::env::var("ROCKET_PROFILE").unwrap_or_else(|_| "debug".to_string());

    // Private cookies need a stable key outside of local development.
    if profile != "debug" && std::env::var("ROCKET_SECRET_KEY").is_err() {
        panic!(
            "ROCKET_SECRET_KEY is required for profile '{}'. Generate one with: openssl rand -base64 32",
            profile
        );
    }
}

pub fn build_rocket(config: Config) -> Rocket<Build> {
    ensure_rocket_secret_key();

    let figment = rocket::Config::figment()
        .merge(("address", config.server.address.clone()))
        .merge(("port", config.server.port));

    rocket::custom(figment)
        .attach(RequestLogger)
        .attach(stage_db(config.database.clone()))
        .manage(EmailService::new(config.email.clone()))
        .manage(config)
        .mount("/", app_routes::site::routes())
        .mount("/", app_routes::health::routes())
        .mount("/static", FileServer::from("static"))
        .mount("/admin", app_routes::admin::routes())
        .mount("/admin", app_routes::products::routes())
        .mount("/admin", app_routes::categories::routes())
        .register(
            "/",
            catchers![
                app_routes::error::not_found,
                app_routes::error::unauthorized,
                app_routes::error::forbidden,
                app_routes::error::internal_error,
                app_routes::error::service_unavailable
            ],
        )
}
