use chrono::{DateTime, Utc};

/// One row of `login_attempts`: a counted window of failed logins for a
/// single account+source key.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LoginAttempt {
    pub attempt_key: String,
    pub attempt_count: i32,
    pub window_started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowVerdict {
    Allowed,
    Blocked,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_variants() {
        assert_ne!(WindowVerdict::Allowed, WindowVerdict::Blocked);
    }

    #[test]
    fn login_attempt_row_shape() {
        let attempt = LoginAttempt {
            attempt_key: "admin@example.com|10.0.0.1".to_string(),
            attempt_count: 3,
            window_started_at: Utc::now(),
        };
        assert_eq!(attempt.attempt_count, 3);
    }
}
