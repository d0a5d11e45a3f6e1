use crate::config::LoginRateLimitConfig;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::rate_limit::{LoginAttempt, WindowVerdict};
use chrono::{DateTime, Duration, Utc};

/// Build the identifying key for a login attempt: submitted account plus
/// source address, so one account cannot be stuffed from many addresses
/// without tripping the account side, and one address cannot walk many
/// accounts without tripping the source side.
pub fn attempt_key(username: &str, source_ip: &str) -> String {
    format!("{}|{}", username.trim().to_lowercase(), source_ip)
}

fn window_expired(attempt: &LoginAttempt, config: &LoginRateLimitConfig, now: DateTime<Utc>) -> bool {
    now >= attempt.window_started_at + Duration::seconds(config.window_seconds)
}

/// Pure window policy. The window is anchored at the first failed attempt;
/// once it elapses the record is stale and no longer blocks.
pub fn evaluate_window(
    attempt: Option<&LoginAttempt>,
    config: &LoginRateLimitConfig,
    now: DateTime<Utc>,
) -> WindowVerdict {
    match attempt {
        None => WindowVerdict::Allowed,
        Some(attempt) if window_expired(attempt, config, now) => WindowVerdict::Allowed,
        Some(attempt) if attempt.attempt_count >= config.max_attempts => WindowVerdict::Blocked,
        Some(_) => WindowVerdict::Allowed,
    }
}

/// Count and window start after recording one more failure at `now`.
fn next_window(
    attempt: Option<&LoginAttempt>,
    config: &LoginRateLimitConfig,
    now: DateTime<Utc>,
) -> (i32, DateTime<Utc>) {
    match attempt {
        Some(attempt) if !window_expired(attempt, config, now) => (attempt.attempt_count + 1, attempt.window_started_at),
        _ => (1, now),
    }
}

/// Login rate limiter backed by the shared `login_attempts` table, so every
/// server process sharing the database enforces the same counters. Store
/// errors surface as `StoreUnavailable` and the caller denies the login
/// (fail closed).
///
/// Counting is read-then-upsert without locking: concurrent failures for one
/// key may land the counter one off near the threshold, which the window
/// semantics tolerate.
impl PostgresRepository {
    pub async fn is_blocked(&self, key: &str, config: &LoginRateLimitConfig) -> Result<bool, AppError> {
        let attempt = self.get_attempt(key).await?;
        Ok(evaluate_window(attempt.as_ref(), config, Utc::now()) == WindowVerdict::Blocked)
    }

    /// Record a failed login and return the attempt count now on record.
    pub async fn record_attempt(&self, key: &str, config: &LoginRateLimitConfig) -> Result<i32, AppError> {
        let now = Utc::now();
        let attempt = self.get_attempt(key).await?;
        let (count, window_started_at) = next_window(attempt.as_ref(), config, now);

        sqlx::query(
            r#"
            INSERT INTO login_attempts (attempt_key, attempt_count, window_started_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (attempt_key)
            DO UPDATE SET attempt_count = $2, window_started_at = $3
            "#,
        )
        .bind(key)
        .bind(count)
        .bind(window_started_at)
        .execute(&self.pool)
        .await
        .map_err(AppError::store)?;

        Ok(count)
    }

    /// A successful login clears the record immediately; the window is not
    /// waited out.
    pub async fn reset_attempts(&self, key: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM login_attempts WHERE attempt_key = $1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(AppError::store)?;

        Ok(())
    }

    /// Drop windows that have already elapsed. Run by the housekeeping binary.
    pub async fn purge_stale_attempts(&self, config: &LoginRateLimitConfig) -> Result<u64, AppError> {
        let cutoff = Utc::now() - Duration::seconds(config.window_seconds);
        let result = sqlx::query("DELETE FROM login_attempts WHERE window_started_at <= $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn get_attempt(&self, key: &str) -> Result<Option<LoginAttempt>, AppError> {
        let attempt = sqlx::query_as::<_, LoginAttempt>(
            "SELECT attempt_key, attempt_count, window_started_at FROM login_attempts WHERE attempt_key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::store)?;

        Ok(attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config() -> LoginRateLimitConfig {
        LoginRateLimitConfig::default()
    }

    fn attempt(count: i32, started_secs_ago: i64) -> LoginAttempt {
        LoginAttempt {
            attempt_key: "admin@example.com|10.0.0.1".to_string(),
            attempt_count: count,
            window_started_at: Utc::now() - Duration::seconds(started_secs_ago),
        }
    }

    #[test]
    fn attempt_key_normalizes_username() {
        assert_eq!(attempt_key("  Admin@Example.com ", "10.0.0.1"), "admin@example.com|10.0.0.1");
    }

    #[test]
    fn no_record_is_allowed() {
        assert_eq!(evaluate_window(None, &config(), Utc::now()), WindowVerdict::Allowed);
    }

    #[test]
    fn below_threshold_is_allowed() {
        let a = attempt(4, 10);
        assert_eq!(evaluate_window(Some(&a), &config(), Utc::now()), WindowVerdict::Allowed);
    }

    #[test]
    fn at_threshold_within_window_is_blocked() {
        let a = attempt(5, 10);
        assert_eq!(evaluate_window(Some(&a), &config(), Utc::now()), WindowVerdict::Blocked);
    }

    #[test]
    fn elapsed_window_unblocks() {
        let a = attempt(99, 301);
        assert_eq!(evaluate_window(Some(&a), &config(), Utc::now()), WindowVerdict::Allowed);
    }

    #[test]
    fn failure_in_active_window_increments_and_keeps_anchor() {
        let a = attempt(2, 10);
        let (count, started) = next_window(Some(&a), &config(), Utc::now());
        assert_eq!(count, 3);
        assert_eq!(started, a.window_started_at);
    }

    #[test]
    fn failure_after_window_restarts_at_one() {
        let a = attempt(5, 301);
        let now = Utc::now();
        let (count, started) = next_window(Some(&a), &config(), now);
        assert_eq!(count, 1);
        assert_eq!(started, now);
    }

    #[test]
    fn first_failure_opens_a_window() {
        let now = Utc::now();
        let (count, started) = next_window(None, &config(), now);
        assert_eq!(count, 1);
        assert_eq!(started, now);
    }

    proptest! {
        /// Within an active window, blocked exactly when count >= max_attempts.
        #[test]
        fn blocked_iff_threshold_reached(count in 0i32..100, age in 0i64..299) {
            let a = attempt(count, age);
            let verdict = evaluate_window(Some(&a), &config(), Utc::now());
            prop_assert_eq!(verdict == WindowVerdict::Blocked, count >= 5);
        }

        /// Once the window has elapsed, no count blocks.
        #[test]
        fn elapsed_window_never_blocks(count in 0i32..1000, extra in 0i64..10_000) {
            let a = attempt(count, 300 + extra);
            prop_assert_eq!(evaluate_window(Some(&a), &config(), Utc::now()), WindowVerdict::Allowed);
        }

        /// Recording keeps counts monotonic within a window.
        #[test]
        fn recording_increments_within_window(count in 1i32..100, age in 0i64..299) {
            let a = attempt(count, age);
            let (next, _) = next_window(Some(&a), &config(), Utc::now());
            prop_assert_eq!(next, count + 1);
        }
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn record_attempt_persists_counts() {
        // Requires a running PostgreSQL at DATABASE_URL
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn reset_clears_blocked_state() {
        // Requires a running PostgreSQL at DATABASE_URL
    }
}
