use crate::config::Config;
use crate::csrf;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::admin::CurrentAdmin;
use crate::models::session::Session;
use chrono::{Duration, Utc};
use rocket::http::{Cookie, CookieJar, SameSite, Status};
use rocket::request::{FromRequest, Outcome as RequestOutcome, Request};
use sqlx::PgPool;
use uuid::Uuid;

pub(crate) fn parse_session_cookie_value(value: &str) -> Option<Uuid> {
    Uuid::parse_str(value).ok()
}

fn same_site_from_config(value: &str) -> SameSite {
    match value.to_ascii_lowercase().as_str() {
        "strict" => SameSite::Strict,
        "none" => SameSite::None,
        _ => SameSite::Lax,
    }
}

/// Build the session cookie with the configured attributes. The value is the
/// session UUID; the private-cookie jar encrypts and authenticates it, so
/// the client sees an opaque blob. `http_only` is hardwired.
pub fn session_cookie(config: &Config, session_id: Uuid) -> Cookie<'static> {
    Cookie::build((config.session.cookie_name.clone(), session_id.to_string()))
        .path("/")
        .http_only(true)
        .secure(config.session.secure)
        .same_site(same_site_from_config(&config.session.same_site))
        .max_age(rocket::time::Duration::minutes(config.session.idle_minutes))
        .build()
}

pub fn clear_session_cookie(config: &Config, cookies: &CookieJar<'_>) {
    cookies.remove_private(Cookie::build(config.session.cookie_name.clone()).path("/").build());
}

fn idle_deadline(config: &Config) -> chrono::DateTime<Utc> {
    Utc::now() + Duration::minutes(config.session.idle_minutes)
}

/// Load the request's session, creating an anonymous one (and setting the
/// cookie) when none is usable. The login page goes through this so its form
/// carries a CSRF token before any credentials exist.
pub async fn ensure_session(
    repo: &PostgresRepository,
    config: &Config,
    cookies: &CookieJar<'_>,
) -> Result<Session, AppError> {
    if let Some(cookie) = cookies.get_private(&config.session.cookie_name)
        && let Some(session_id) = parse_session_cookie_value(cookie.value())
        && let Some(session) = repo.get_live_session(&session_id).await?
    {
        return Ok(session);
    }

    let session = repo.create_session(None, &csrf::generate_secret(), idle_deadline(config)).await?;
    cookies.add_private(session_cookie(config, session.id));
    Ok(session)
}

/// Replace the current session with a fresh authenticated one. The old row
/// is deleted and the CSRF secret regenerated, so neither the session id nor
/// a pre-login token survives authentication.
pub async fn open_admin_session(
    repo: &PostgresRepository,
    config: &Config,
    cookies: &CookieJar<'_>,
    admin_id: &Uuid,
    old_session: Option<&Session>,
) -> Result<Session, AppError> {
    if let Some(old) = old_session {
        repo.delete_session(&old.id).await?;
    }

    let session = repo
        .create_session(Some(admin_id), &csrf::generate_secret(), idle_deadline(config))
        .await?;
    cookies.add_private(session_cookie(config, session.id));
    Ok(session)
}

/// Any live session, anonymous or authenticated. Used by the CSRF form
/// guard; does not create sessions.
pub struct SessionGuard(pub Session);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for SessionGuard {
    type Error = AppError;

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, Self::Error> {
        let (config, pool) = match managed_state(req) {
            Ok(state) => state,
            Err(outcome) => return outcome,
        };

        let Some(cookie) = req.cookies().get_private(&config.session.cookie_name) else {
            return RequestOutcome::Error((Status::Unauthorized, AppError::SessionExpired));
        };
        let Some(session_id) = parse_session_cookie_value(cookie.value()) else {
            return RequestOutcome::Error((Status::Unauthorized, AppError::SessionExpired));
        };

        let repo = PostgresRepository { pool: pool.clone() };
        match repo.get_live_session(&session_id).await {
            Ok(Some(session)) => RequestOutcome::Success(SessionGuard(session)),
            Ok(None) => RequestOutcome::Error((Status::Unauthorized, AppError::SessionExpired)),
            Err(err) => RequestOutcome::Error((Status::ServiceUnavailable, err)),
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for CurrentAdmin {
    type Error = AppError;

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, Self::Error> {
        let session = match req.guard::<SessionGuard>().await {
            RequestOutcome::Success(guard) => guard.0,
            RequestOutcome::Error(err) => return RequestOutcome::Error(err),
            RequestOutcome::Forward(f) => return RequestOutcome::Forward(f),
        };

        if !session.is_authenticated() {
            return RequestOutcome::Error((Status::Unauthorized, AppError::SessionExpired));
        }

        let (config, pool) = match managed_state(req) {
            Ok(state) => state,
            Err(outcome) => return outcome,
        };
        let repo = PostgresRepository { pool: pool.clone() };

        match repo.get_active_session_admin(&session.id).await {
            Ok(Some(admin)) => {
                if let Err(err) = repo.touch_session(&session.id, idle_deadline(config)).await {
                    return RequestOutcome::Error((Status::ServiceUnavailable, err));
                }

                let current = CurrentAdmin {
                    id: admin.id,
                    user_name: admin.user_name,
                    full_name: admin.full_name,
                    session,
                };
                req.local_cache(|| Some(current.clone()));
                RequestOutcome::Success(current)
            }
            Ok(None) => {
                // The admin was deactivated or the row went away; the session
                // is dead weight either way.
                let _ = repo.delete_session(&session.id).await;
                RequestOutcome::Error((Status::Unauthorized, AppError::SessionExpired))
            }
            Err(err) => RequestOutcome::Error((Status::ServiceUnavailable, err)),
        }
    }
}

fn managed_state<'a, T>(req: &'a Request<'_>) -> Result<(&'a Config, &'a PgPool), RequestOutcome<T, AppError>> {
    let Some(config) = req.rocket().state::<Config>() else {
        return Err(RequestOutcome::Error((
            Status::InternalServerError,
            AppError::BadRequest("application configuration not managed".to_string()),
        )));
    };
    let Some(pool) = req.rocket().state::<PgPool>() else {
        return Err(RequestOutcome::Error((
            Status::InternalServerError,
            AppError::BadRequest("database pool not managed".to_string()),
        )));
    };
    Ok((config, pool))
}
