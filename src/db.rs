use crate::config::DatabaseConfig;
use rocket::fairing::AdHoc;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

/// Build the Postgres pool. Connections are established lazily on first use
/// so the server can ignite (and the health endpoint can answer) before the
/// database is reachable; auth-path queries that then fail surface as
/// `StoreUnavailable` and the request is denied.
pub fn init_pool(db_config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(db_config.max_connections)
        .min_connections(db_config.min_connections)
        .acquire_timeout(Duration::from_secs(db_config.acquire_timeout))
        .idle_timeout(Duration::from_secs(30))
        .max_lifetime(Duration::from_secs(1800))
        .connect_lazy(&db_config.url)
}

pub fn stage_db(db_config: DatabaseConfig) -> AdHoc {
    AdHoc::try_on_ignite("Postgres (sqlx)", |rocket| async move {
        match init_pool(&db_config) {
            Ok(pool) => {
                tracing::info!("Database pool configured");
                Ok(rocket.manage(pool))
            }
            Err(e) => {
                tracing::error!("Failed to configure database pool: {}", e);
                Err(rocket)
            }
        }
    })
}
