use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::session::{Session, SessionAdmin};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Session store. All expiry checks run in SQL against the database clock so
/// a replayed cookie past its max age never authenticates, no matter what the
/// client presents. Errors here map to `StoreUnavailable`: a session that
/// cannot be checked is a session that does not authenticate.
impl PostgresRepository {
    pub async fn create_session(
        &self,
        admin_id: Option<&Uuid>,
        csrf_secret: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, AppError> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO admin_sessions (admin_id, csrf_secret, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, admin_id, csrf_secret, created_at, last_seen_at, expires_at
            "#,
        )
        .bind(admin_id)
        .bind(csrf_secret)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::store)?;

        Ok(session)
    }

    /// Load a session that has not expired yet.
    pub async fn get_live_session(&self, session_id: &Uuid) -> Result<Option<Session>, AppError> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT id, admin_id, csrf_secret, created_at, last_seen_at, expires_at
            FROM admin_sessions
            WHERE id = $1
              AND expires_at > now()
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::store)?;

        Ok(session)
    }

    /// The admin behind a live authenticated session, or None when the
    /// session is anonymous, expired, or the account was deactivated.
    pub async fn get_active_session_admin(&self, session_id: &Uuid) -> Result<Option<SessionAdmin>, AppError> {
        let admin = sqlx::query_as::<_, SessionAdmin>(
            r#"
            SELECT a.id, a.user_name, a.full_name
            FROM admin_sessions s
            JOIN admin_users a ON a.id = s.admin_id
            WHERE s.id = $1
              AND s.expires_at > now()
              AND a.is_active
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::store)?;

        Ok(admin)
    }

    /// Sliding expiry: push the deadline forward on activity.
    pub async fn touch_session(&self, session_id: &Uuid, expires_at: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query("UPDATE admin_sessions SET last_seen_at = now(), expires_at = $1 WHERE id = $2")
            .bind(expires_at)
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::store)?;

        Ok(())
    }

    /// Server-side destroy: invalidates every holder of the cookie value,
    /// not just the client that asked.
    pub async fn delete_session(&self, session_id: &Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM admin_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::store)?;

        Ok(())
    }

    pub async fn purge_expired_sessions(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM admin_sessions WHERE expires_at <= now()")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    #[tokio::test]
    #[ignore = "requires database"]
    async fn expired_session_is_not_returned() {
        // Requires a running PostgreSQL at DATABASE_URL
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn deleted_session_no_longer_authenticates_other_holders() {
        // Requires a running PostgreSQL at DATABASE_URL
    }
}
