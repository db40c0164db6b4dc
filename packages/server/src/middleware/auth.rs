//! Session authentication extractors.
//!
//! Provides three extractors:
//! - [`RequireAuth`]: requires a live session; returns 401 `{"message":"로그인 필요"}` otherwise.
//! - [`OptionalAuth`]: yields the logged-in user, if any.
//! - [`RequireGuest`]: requires that nobody is logged in; redirects to
//!   `/?error=이미 로그인한 상태입니다` otherwise.
//!
//! A session is an opaque random token kept in the `devtalk.sid` cookie and
//! resolved through [`Storage::get_session`]. Expired sessions are deleted the
//! first time they are presented.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use devtalk::{User, UserId};
use devtalk_api::{messages, MessageResponse};

use crate::{
    error::{AppError, Found},
    handlers::AppState,
    storage::{Session, Storage, StorageError},
};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "devtalk.sid";

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum AuthRejection {
    LoginRequired,
    AlreadyLoggedIn,
    Internal(String),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            AuthRejection::LoginRequired => (
                StatusCode::UNAUTHORIZED,
                Json(MessageResponse::new(messages::LOGIN_REQUIRED)),
            )
                .into_response(),
            AuthRejection::AlreadyLoggedIn => {
                Found::with_query("/", "error", messages::ALREADY_LOGGED_IN).into_response()
            }
            AuthRejection::Internal(detail) => AppError::Internal(detail).into_response(),
        }
    }
}

impl From<StorageError> for AuthRejection {
    fn from(e: StorageError) -> Self {
        AuthRejection::Internal(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Session lookup
// ---------------------------------------------------------------------------

/// Resolve the session cookie on `parts` to its user and token.
///
/// A missing cookie, unknown token, expired session or deleted user all yield
/// `None`.
async fn current_user(
    parts: &Parts,
    storage: &dyn Storage,
) -> Result<Option<(User, String)>, StorageError> {
    let jar = CookieJar::from_headers(&parts.headers);
    let Some(token) = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) else {
        return Ok(None);
    };

    let Some(session) = storage.get_session(&token).await? else {
        return Ok(None);
    };
    if session.is_expired() {
        storage.delete_session(&token).await?;
        return Ok(None);
    }

    Ok(storage
        .get_user(session.user_id)
        .await?
        .map(|user| (user, token)))
}

// ---------------------------------------------------------------------------
// RequireAuth extractor
// ---------------------------------------------------------------------------

/// Axum extractor that requires a logged-in user.
pub struct RequireAuth {
    pub user: User,
    /// The session token, so logout can delete it.
    pub token: String,
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AuthRejection;

    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let app_state = AppState::from_ref(state);
        async move {
            let (user, token) = current_user(parts, app_state.storage.as_ref())
                .await?
                .ok_or(AuthRejection::LoginRequired)?;
            Ok(RequireAuth { user, token })
        }
    }
}

// ---------------------------------------------------------------------------
// OptionalAuth extractor
// ---------------------------------------------------------------------------

/// Axum extractor that yields `Some(user)` for a live session, `None` otherwise.
///
/// Storage failures are logged and treated as a guest.
pub struct OptionalAuth(pub Option<User>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let app_state = AppState::from_ref(state);
        async move {
            match current_user(parts, app_state.storage.as_ref()).await {
                Ok(found) => Ok(OptionalAuth(found.map(|(user, _)| user))),
                Err(e) => {
                    tracing::warn!(error = %e, "session lookup failed; continuing as guest");
                    Ok(OptionalAuth(None))
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// RequireGuest extractor
// ---------------------------------------------------------------------------

/// Axum extractor for routes only a logged-out visitor may use.
pub struct RequireGuest;

impl<S> FromRequestParts<S> for RequireGuest
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AuthRejection;

    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let app_state = AppState::from_ref(state);
        async move {
            match current_user(parts, app_state.storage.as_ref()).await? {
                Some(_) => Err(AuthRejection::AlreadyLoggedIn),
                None => Ok(RequireGuest),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Session issuing
// ---------------------------------------------------------------------------

/// 32 random bytes, hex-encoded.
pub fn new_token() -> String {
    hex::encode(rand::random::<[u8; 32]>())
}

/// The session cookie carrying `token`.
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// A cookie that, passed to [`CookieJar::remove`], clears the session cookie.
pub fn session_removal() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

/// Persist a new session for `user_id` and return its cookie.
pub async fn start_session(
    state: &AppState,
    user_id: UserId,
) -> Result<Cookie<'static>, StorageError> {
    let expires_at = (chrono::Utc::now() + chrono::Duration::hours(state.config.session_ttl_hours))
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
    let session = Session {
        token: new_token(),
        user_id,
        expires_at,
    };
    state.storage.create_session(&session).await?;
    tracing::debug!(user_id, "session started");
    Ok(session_cookie(session.token, state.config.secure_cookies))
}
