use crate::auth::SessionGuard;
use crate::csrf;
use crate::error::app_error::AppError;
use rocket::data::{Data, FromData, Outcome};
use rocket::form::{Form, FromForm};
use rocket::http::Status;
use rocket::request::Request;
use std::ops::Deref;
use tracing::warn;

/// Implemented by every state-changing admin form: exposes the hidden token
/// field so the wrapper below can check it.
pub trait CsrfGuarded {
    fn csrf_token(&self) -> &str;
}

/// Bare confirmation form for logout and delete actions; carries only the
/// token.
#[derive(Debug, rocket::FromForm)]
pub struct ConfirmForm {
    pub csrf_token: String,
}

impl CsrfGuarded for ConfirmForm {
    fn csrf_token(&self) -> &str {
        &self.csrf_token
    }
}

/// A form wrapper that verifies the CSRF token against the request's session
/// before the handler body ever runs. A handler that takes `CsrfForm<T>`
/// cannot observe an unverified submission; absence of a usable session, a
/// missing token, and a mismatched token all reject identically.
///
/// GET/HEAD requests carry no body and never pass through here, which is the
/// method exemption in one place instead of per-route checks.
#[derive(Debug)]
pub struct CsrfForm<T>(pub T);

impl<T> CsrfForm<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for CsrfForm<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r, T> FromData<'r> for CsrfForm<T>
where
    T: FromForm<'r> + CsrfGuarded + Send,
{
    type Error = AppError;

    async fn from_data(req: &'r Request<'_>, data: Data<'r>) -> Outcome<'r, Self> {
        let form = match Form::<T>::from_data(req, data).await {
            Outcome::Success(form) => form.into_inner(),
            Outcome::Error((status, errors)) => {
                warn!(
                    method = %req.method(),
                    uri = %req.uri(),
                    errors = ?errors,
                    "failed to parse form submission"
                );
                return Outcome::Error((status, AppError::BadRequest("Malformed form submission".to_string())));
            }
            Outcome::Forward(forward) => return Outcome::Forward(forward),
        };

        let session = match req.guard::<SessionGuard>().await {
            rocket::request::Outcome::Success(guard) => guard.0,
            rocket::request::Outcome::Error((status, err @ AppError::StoreUnavailable { .. })) => {
                // Cannot check the token without the store; deny rather than
                // wave the request through.
                return Outcome::Error((status, err));
            }
            _ => {
                warn!(
                    method = %req.method(),
                    uri = %req.uri(),
                    outcome = "rejected",
                    "state-changing request without a usable session"
                );
                return Outcome::Error((Status::Forbidden, AppError::CsrfMismatch));
            }
        };

        if !csrf::verify_token(&session.csrf_secret, form.csrf_token()) {
            warn!(
                method = %req.method(),
                uri = %req.uri(),
                session_id = %session.id,
                outcome = "rejected",
                "csrf token mismatch"
            );
            return Outcome::Error((Status::Forbidden, AppError::CsrfMismatch));
        }

        Outcome::Success(CsrfForm(form))
    }
}
