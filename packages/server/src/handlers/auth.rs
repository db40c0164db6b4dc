//! Authentication handlers.
//!
//! - `POST /auth/join`               — local signup.
//! - `POST /auth/login`              — local login.
//! - `POST|GET /auth/logout`         — end the session.
//! - `GET  /auth/{provider}`         — start an OAuth login.
//! - `GET  /auth/{provider}/callback` — finish an OAuth login.
//!
//! Every outcome is a `302`; failures carry a notice in the query string.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Form,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use devtalk::{validate_join, NewUser, Provider, User};
use devtalk_api::{messages, JoinForm, LoginForm, OAuthCallbackQuery};

use crate::{
    credentials,
    error::{Found, PageError},
    middleware::auth::{new_token, session_removal, start_session, RequireAuth, RequireGuest},
    oauth::{authenticate, provider_label, OAuthError},
    storage::StorageError,
};

use super::AppState;

/// Cookie holding the `state` issued with an OAuth redirect.
pub const OAUTH_STATE_COOKIE: &str = "devtalk.oauth_state";

// ---------------------------------------------------------------------------
// Local accounts
// ---------------------------------------------------------------------------

/// `POST /auth/join` — create a local account.
///
/// Invalid input redirects to `/join?error=invalid`; an email already used by
/// a local account redirects to `/join?error=exist`. The new user is not
/// logged in.
#[utoipa::path(
    post,
    path = "/auth/join",
    tag = "Auth",
    request_body(content = JoinForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "회원가입 성공 후 메인 페이지로 리다이렉트"),
    )
)]
pub async fn join(
    State(state): State<AppState>,
    _guest: RequireGuest,
    Form(form): Form<JoinForm>,
) -> Result<Found, PageError> {
    let email = form.email.trim();
    let nick = form.nick.trim();
    if let Err(e) = validate_join(email, nick, &form.password) {
        tracing::debug!(error = %e, "rejected signup");
        return Ok(Found::to("/join?error=invalid"));
    }

    if state.storage.find_local_user(email).await?.is_some() {
        return Ok(Found::to("/join?error=exist"));
    }

    let hash = credentials::hash_password(&form.password)
        .await
        .map_err(|e| PageError::Internal(e.to_string()))?;
    match state
        .storage
        .create_user(&NewUser::local(email, nick, hash))
        .await
    {
        Ok(user) => {
            tracing::info!(user_id = user.id, "local user joined");
            Ok(Found::to("/"))
        }
        Err(StorageError::Conflict(_)) => Ok(Found::to("/join?error=exist")),
        Err(e) => Err(e.into()),
    }
}

/// `POST /auth/login` — log in with email and password.
///
/// Failures redirect to `/?loginError=…` without creating a session.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "로그인 성공 시 메인으로, 실패 시 loginError와 함께 메인으로"),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    _guest: RequireGuest,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, PageError> {
    let Some(user) = state.storage.find_local_user(form.email.trim()).await? else {
        return Ok(login_failed(messages::NOT_REGISTERED));
    };

    let matches = match user.password.as_deref() {
        Some(hash) => credentials::verify_password(&form.password, hash)
            .await
            .map_err(|e| PageError::Internal(e.to_string()))?,
        None => false,
    };
    if !matches {
        return Ok(login_failed(messages::WRONG_PASSWORD));
    }

    let cookie = start_session(&state, user.id).await?;
    tracing::info!(user_id = user.id, "logged in");
    Ok((jar.add(cookie), Found::to("/")).into_response())
}

fn login_failed(message: &str) -> Response {
    Found::with_query("/", "loginError", message).into_response()
}

/// `POST /auth/logout` and `GET /auth/logout` — end the current session.
#[utoipa::path(
    method(get, post),
    path = "/auth/logout",
    tag = "Auth",
    security(("session" = [])),
    responses(
        (status = 302, description = "로그아웃 성공 후 메인 페이지로 리다이렉트"),
        (status = 401, description = "로그인 필요", body = devtalk_api::MessageResponse),
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    auth: RequireAuth,
    jar: CookieJar,
) -> Result<(CookieJar, Found), PageError> {
    state.storage.delete_session(&auth.token).await?;
    tracing::info!(user_id = auth.user.id, "logged out");
    Ok((jar.remove(session_removal()), Found::to("/")))
}

// ---------------------------------------------------------------------------
// OAuth
// ---------------------------------------------------------------------------

fn oauth_provider(name: &str) -> Option<Provider> {
    name.parse::<Provider>().ok().filter(Provider::is_oauth)
}

fn state_cookie(value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((OAUTH_STATE_COOKIE, value))
        .path("/auth")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

fn state_removal() -> Cookie<'static> {
    Cookie::build(OAUTH_STATE_COOKIE).path("/auth").build()
}

/// `GET /auth/{provider}` — redirect to the provider's consent screen.
///
/// Unknown or unconfigured providers render the 404 page.
#[utoipa::path(
    get,
    path = "/auth/{provider}",
    tag = "Auth",
    params(("provider" = String, Path, description = "kakao, naver 또는 google")),
    responses(
        (status = 302, description = "제공자 인증 페이지로 리다이렉트"),
        (status = 404, description = "설정되지 않은 제공자", body = String, content_type = "text/html"),
    )
)]
pub async fn oauth_start(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    jar: CookieJar,
) -> Result<(CookieJar, Found), PageError> {
    let not_found = || PageError::NotFound(format!("GET /auth/{provider} 라우터가 없습니다."));
    let p = oauth_provider(&provider).ok_or_else(not_found)?;

    let csrf = new_token();
    let url = match state.oauth.authorize_url(p, &csrf) {
        Ok(url) => url,
        Err(OAuthError::NotConfigured(_)) => return Err(not_found()),
        Err(e) => return Err(PageError::Internal(e.to_string())),
    };

    let jar = jar.add(state_cookie(csrf, state.config.secure_cookies));
    Ok((jar, Found(url)))
}

/// `GET /auth/{provider}/callback` — complete an OAuth login.
///
/// Any failure redirects to `/?error={provider}로그인 실패`.
#[utoipa::path(
    get,
    path = "/auth/{provider}/callback",
    tag = "Auth",
    params(
        ("provider" = String, Path, description = "kakao, naver 또는 google"),
        OAuthCallbackQuery,
    ),
    responses(
        (status = 302, description = "인증 성공 시 메인 페이지로, 실패 시 error와 함께 메인으로"),
    )
)]
pub async fn oauth_callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<OAuthCallbackQuery>,
    jar: CookieJar,
) -> Result<Response, PageError> {
    let p = oauth_provider(&provider).ok_or_else(|| {
        PageError::NotFound(format!("GET /auth/{provider}/callback 라우터가 없습니다."))
    })?;

    let expected = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.remove(state_removal());

    let result = match complete_oauth(&state, p, query, expected).await {
        Ok(user) => start_session(&state, user.id)
            .await
            .map(|cookie| (user, cookie))
            .map_err(OAuthError::from),
        Err(e) => Err(e),
    };

    match result {
        Ok((user, cookie)) => {
            tracing::info!(user_id = user.id, provider = %p, "oauth login");
            Ok((jar.add(cookie), Found::to("/")).into_response())
        }
        Err(e) => {
            tracing::warn!(provider = %p, error = %e, "oauth login failed");
            let notice = format!("{}로그인 실패", provider_label(p));
            Ok((jar, Found::with_query("/", "error", &notice)).into_response())
        }
    }
}

async fn complete_oauth(
    state: &AppState,
    provider: Provider,
    query: OAuthCallbackQuery,
    expected_state: Option<String>,
) -> Result<User, OAuthError> {
    if let Some(error) = query.error {
        return Err(OAuthError::Denied(error));
    }
    let code = query.code.ok_or(OAuthError::MissingCode)?;
    let returned = query.state.ok_or(OAuthError::StateMismatch)?;
    if expected_state.as_deref() != Some(returned.as_str()) {
        return Err(OAuthError::StateMismatch);
    }

    let profile = state.oauth.fetch_profile(provider, &code, &returned).await?;
    authenticate(state.storage.as_ref(), provider, profile).await
}
