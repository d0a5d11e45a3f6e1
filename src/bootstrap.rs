use crate::Config;
use crate::database::postgres_repository::PostgresRepository;
use crate::db::init_pool;
use zxcvbn::{Score, zxcvbn};

#[derive(Debug, Clone)]
pub struct BootstrapOutcome {
    pub user_name: String,
    pub created: bool,
    pub password_changed: bool,
}

/// Apply schema migrations and seed or refresh the admin account. Run any
/// time after configuring the environment; both steps are idempotent.
pub async fn run_bootstrap(
    config: &Config,
    user_name: &str,
    password: Option<&str>,
    full_name: Option<&str>,
    skip_migrations: bool,
) -> Result<BootstrapOutcome, String> {
    let pool = init_pool(&config.database).map_err(|err| format!("Failed to initialize database pool: {err}"))?;

    if skip_migrations {
        tracing::info!("Skipping schema migrations");
    } else {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|err| format!("Failed to apply migrations: {err}"))?;
        tracing::info!("Schema migrations applied");
    }

    if let Some(password) = password {
        let estimate = zxcvbn(password, &[user_name]);
        if estimate.score() < Score::Three {
            tracing::warn!(
                score = ?estimate.score(),
                "Admin password is weak; consider a longer passphrase"
            );
        }
    }

    let repo = PostgresRepository { pool: pool.clone() };
    let (admin, created) = repo
        .ensure_admin(user_name, password, full_name)
        .await
        .map_err(|err| format!("Failed to ensure admin account: {err:?}"))?;

    pool.close().await;

    Ok(BootstrapOutcome {
        user_name: admin.user_name,
        created,
        password_changed: password.is_some(),
    })
}
