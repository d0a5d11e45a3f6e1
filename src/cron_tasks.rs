use crate::Config;
use crate::database::postgres_repository::PostgresRepository;
use crate::db::init_pool;

#[derive(Debug, Clone, Copy)]
pub struct HousekeepingResult {
    pub sessions_purged: u64,
    pub attempt_windows_purged: u64,
}

/// Drop expired sessions and elapsed login-attempt windows. Both are dead
/// state: expiry is enforced at read time, so this only keeps the tables
/// small.
pub async fn run_housekeeping(config: &Config) -> Result<HousekeepingResult, String> {
    let pool = init_pool(&config.database).map_err(|err| format!("Failed to initialize database pool: {err}"))?;

    let repo = PostgresRepository { pool: pool.clone() };
    let sessions_purged = repo
        .purge_expired_sessions()
        .await
        .map_err(|err| format!("Failed to purge expired sessions: {err:?}"))?;
    let attempt_windows_purged = repo
        .purge_stale_attempts(&config.login_rate_limit)
        .await
        .map_err(|err| format!("Failed to purge stale login attempts: {err:?}"))?;

    pool.close().await;

    Ok(HousekeepingResult {
        sessions_purged,
        attempt_windows_purged,
    })
}
