use rocket::http::Status;
use rocket::response::Responder;
use rocket::{Request, Response};
use std::io::Cursor;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error")]
    Db {
        message: String,
        #[source]
        source: sqlx::error::Error,
    },
    /// The session or rate-limit backing store could not be reached. Login
    /// and session checks fail closed on this variant: the request is denied,
    /// never silently authenticated.
    #[error("Service temporarily unavailable")]
    StoreUnavailable {
        message: String,
        #[source]
        source: sqlx::error::Error,
    },
    #[error("Invalid username or password.")]
    InvalidCredentials,
    /// Deliberately shares its user-facing surface with `InvalidCredentials`
    /// so a blocked attacker cannot tell a throttled account from a wrong
    /// password.
    #[error("Invalid username or password.")]
    RateLimited,
    #[error("Session expired")]
    SessionExpired,
    #[error("Cross-site request rejected")]
    CsrfMismatch,
    #[error("Internal server error")]
    PasswordHash { message: String },
    #[error("Internal server error")]
    Template { message: String },
    #[error("Internal server error")]
    Email(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),
    #[error("Internal server error")]
    ConfigurationError {
        message: String,
        #[source]
        source: figment::Error,
    },
}

impl AppError {
    pub fn db(message: impl Into<String>, source: sqlx::error::Error) -> Self {
        Self::Db {
            message: message.into(),
            source,
        }
    }

    /// Wrap a database error from the session store or rate limiter. Kept
    /// separate from `db` so the auth pipeline maps to 503 and fails closed.
    pub fn store(source: sqlx::error::Error) -> Self {
        Self::StoreUnavailable {
            message: "auth backing store unavailable".to_string(),
            source,
        }
    }

    pub fn password_hash(message: impl Into<String>, source: password_hash::Error) -> Self {
        Self::PasswordHash {
            message: format!("{}: {}", message.into(), source),
        }
    }
}

impl From<password_hash::Error> for AppError {
    fn from(e: password_hash::Error) -> Self {
        AppError::password_hash("Password hashing failed", e)
    }
}

impl From<askama::Error> for AppError {
    fn from(e: askama::Error) -> Self {
        AppError::Template {
            message: format!("Template rendering failed: {}", e),
        }
    }
}

impl From<figment::Error> for AppError {
    fn from(e: figment::Error) -> Self {
        AppError::ConfigurationError {
            message: "Failed to read configuration".to_string(),
            source: e,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Resource not found".to_string()),
            _ => AppError::db("Database error", e),
        }
    }
}

impl From<&AppError> for Status {
    fn from(e: &AppError) -> Self {
        match e {
            AppError::Db { .. } => Status::InternalServerError,
            AppError::StoreUnavailable { .. } => Status::ServiceUnavailable,
            AppError::InvalidCredentials => Status::Unauthorized,
            AppError::RateLimited => Status::Unauthorized,
            AppError::SessionExpired => Status::SeeOther,
            AppError::CsrfMismatch => Status::SeeOther,
            AppError::PasswordHash { .. } => Status::InternalServerError,
            AppError::Template { .. } => Status::InternalServerError,
            AppError::Email(_) => Status::InternalServerError,
            AppError::NotFound(_) => Status::NotFound,
            AppError::BadRequest(_) => Status::BadRequest,
            AppError::ValidationError(_) => Status::BadRequest,
            AppError::ConfigurationError { .. } => Status::InternalServerError,
        }
    }
}

impl<'r> Responder<'r, 'static> for AppError {
    fn respond_to(self, req: &Request<'_>) -> rocket::response::Result<'static> {
        let method = req.method();
        let uri = req.uri();

        let request_id = req
            .local_cache(|| None::<crate::middleware::RequestId>)
            .as_ref()
            .map(|r| r.0.as_str())
            .unwrap_or("unknown");

        error!(
            error = ?self,
            request_id = %request_id,
            method = %method,
            uri = %uri,
            "request failed"
        );

        // Session and CSRF failures bounce the browser back to the login page
        // with a neutral notice instead of rendering an error body.
        match self {
            AppError::SessionExpired | AppError::CsrfMismatch => Response::build()
                .status(Status::SeeOther)
                .raw_header("Location", "/admin/login?notice=expired")
                .ok(),
            _ => {
                let status = Status::from(&self);
                let body = self.to_string();
                Response::build().status(status).sized_body(body.len(), Cursor::new(body)).ok()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_service_unavailable() {
        let err = AppError::store(sqlx::Error::PoolTimedOut);
        assert_eq!(Status::from(&err), Status::ServiceUnavailable);
    }

    #[test]
    fn credential_and_rate_limit_errors_share_one_message() {
        assert_eq!(
            AppError::InvalidCredentials.to_string(),
            AppError::RateLimited.to_string()
        );
    }

    #[test]
    fn row_not_found_becomes_not_found() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert_eq!(Status::from(&err), Status::NotFound);
    }
}
