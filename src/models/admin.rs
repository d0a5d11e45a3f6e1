use chrono::{DateTime, Utc};
use rocket::FromForm;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AdminUser {
    pub id: Uuid,
    pub user_name: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, FromForm)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub csrf_token: String,
}

impl crate::forms::CsrfGuarded for LoginForm {
    fn csrf_token(&self) -> &str {
        &self.csrf_token
    }
}

/// Authenticated admin resolved by the request guard. Carries the session so
/// handlers can issue CSRF tokens and log out.
#[derive(Debug, Clone)]
pub struct CurrentAdmin {
    pub id: Uuid,
    pub user_name: String,
    pub full_name: Option<String>,
    pub session: crate::models::session::Session,
}

impl CurrentAdmin {
    /// Name shown in the admin chrome.
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.user_name)
    }
}
