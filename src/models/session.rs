use chrono::{DateTime, Utc};
use uuid::Uuid;

/// One row of `admin_sessions`. `admin_id` is NULL for anonymous sessions,
/// which exist so the login form itself carries a CSRF token.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
    pub id: Uuid,
    pub admin_id: Option<Uuid>,
    pub csrf_secret: String,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.admin_id.is_some()
    }
}

/// Admin identity joined through a live session.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionAdmin {
    pub id: Uuid,
    pub user_name: String,
    pub full_name: Option<String>,
}
