//! Rendered pages.
//!
//! - `GET /`          — every post, newest first.
//! - `GET /profile`   — the logged-in user's follows and posts.
//! - `GET /join`      — signup form (guests only).
//! - `GET /hashtag`   — posts tagged with `?hashtag=`.
//!
//! Unmatched routes fall through to [`not_found`].

use axum::{
    extract::{Query, State},
    http::{Method, Uri},
    response::{Html, IntoResponse, Response},
};
use devtalk::{normalize_hashtag, TimelinePost};
use devtalk_api::{messages, HashtagQuery, NoticeQuery};

use crate::{
    error::{Found, PageError},
    middleware::auth::{OptionalAuth, RequireAuth, RequireGuest},
    render::PageLocals,
};

use super::AppState;

/// `GET /` — main timeline.
#[utoipa::path(
    get,
    path = "/",
    tag = "Page",
    params(NoticeQuery),
    responses(
        (status = 200, description = "메인 페이지", body = String, content_type = "text/html"),
        (status = 500, description = "서버 오류 페이지", body = String, content_type = "text/html"),
    )
)]
pub async fn render_main(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(notice): Query<NoticeQuery>,
) -> Result<Html<String>, PageError> {
    let locals = PageLocals::load(state.storage.as_ref(), &state.config, user).await?;
    let twits = state.storage.list_posts().await?;

    let mut ctx = locals.context("DevTalk");
    ctx.insert("twits", &twits);
    ctx.insert("notice", &notice.error.or(notice.login_error));
    Ok(Html(state.templates.render("main.html", &ctx)?))
}

/// `GET /profile` — follow lists and own posts.
#[utoipa::path(
    get,
    path = "/profile",
    tag = "Page",
    security(("session" = [])),
    responses(
        (status = 200, description = "내 정보 페이지", body = String, content_type = "text/html"),
        (status = 401, description = "로그인 필요", body = devtalk_api::MessageResponse),
    )
)]
pub async fn render_profile(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<Html<String>, PageError> {
    let profile = state
        .storage
        .get_profile(auth.user.id)
        .await?
        .ok_or_else(|| PageError::NotFound(messages::NO_USER.into()))?;

    tracing::debug!(
        user_id = profile.user.id,
        followers = profile.followers.len(),
        followings = profile.followings.len(),
        posts = profile.posts.len(),
        "rendering profile"
    );

    let locals = PageLocals::load(state.storage.as_ref(), &state.config, Some(auth.user)).await?;
    let mut ctx = locals.context("내 정보 - DevTalk");
    ctx.insert("user", &profile);
    Ok(Html(state.templates.render("profile.html", &ctx)?))
}

/// `GET /join` — signup form.
#[utoipa::path(
    get,
    path = "/join",
    tag = "Page",
    params(NoticeQuery),
    responses(
        (status = 200, description = "회원가입 페이지", body = String, content_type = "text/html"),
        (status = 302, description = "이미 로그인한 경우 메인으로"),
    )
)]
pub async fn render_join(
    State(state): State<AppState>,
    _guest: RequireGuest,
    Query(notice): Query<NoticeQuery>,
) -> Result<Html<String>, PageError> {
    let locals = PageLocals::load(state.storage.as_ref(), &state.config, None).await?;
    let join_error = match notice.error.as_deref() {
        Some("exist") => Some(messages::JOIN_EXISTS),
        Some("invalid") => Some(messages::JOIN_INVALID),
        _ => None,
    };

    let mut ctx = locals.context("회원가입 - DevTalk");
    ctx.insert("joinError", &join_error);
    Ok(Html(state.templates.render("join.html", &ctx)?))
}

/// `GET /hashtag?hashtag=X` — posts carrying a tag.
///
/// The query is matched case-insensitively and may include the leading `#`.
/// A missing or blank query redirects to `/`; an unknown tag lists nothing.
#[utoipa::path(
    get,
    path = "/hashtag",
    tag = "Page",
    params(HashtagQuery),
    responses(
        (status = 200, description = "해시태그 검색 결과", body = String, content_type = "text/html"),
        (status = 302, description = "검색어가 없으면 메인으로"),
        (status = 500, description = "서버 오류 페이지", body = String, content_type = "text/html"),
    )
)]
pub async fn render_hashtag(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<HashtagQuery>,
) -> Result<Response, PageError> {
    let raw = query.hashtag.as_deref().unwrap_or_default().trim();
    let Some(title) = normalize_hashtag(raw) else {
        return Ok(Found::to("/").into_response());
    };

    let twits: Vec<TimelinePost> = match state.storage.find_hashtag(&title).await? {
        Some(hashtag) => state.storage.find_posts_by_hashtag(hashtag.id).await?,
        None => Vec::new(),
    };

    let locals = PageLocals::load(state.storage.as_ref(), &state.config, user).await?;
    let mut ctx = locals.context(&format!("{raw} | DevTalk"));
    ctx.insert("twits", &twits);
    Ok(Html(state.templates.render("main.html", &ctx)?).into_response())
}

/// Fallback for unmatched routes.
pub async fn not_found(method: Method, uri: Uri) -> PageError {
    PageError::NotFound(format!("{method} {} 라우터가 없습니다.", uri.path()))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use tower::ServiceExt;

    use crate::handlers::test_support::*;
    use crate::router::app;

    #[tokio::test]
    async fn main_lists_posts_for_guests() {
        let state = test_state();
        let alice = seed_user(&state, "a@example.com", "alice").await;
        state
            .storage
            .create_post(alice.id, "첫 글 #hello", None)
            .await
            .unwrap();

        let resp = app(state).oneshot(empty("GET", "/", None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_string(resp).await;
        assert!(html.contains("<title>DevTalk</title>"));
        assert!(html.contains("첫 글 #hello"));
        assert!(html.contains("login-form"));
    }

    #[tokio::test]
    async fn main_shows_login_notice() {
        let resp = app(test_state())
            .oneshot(empty("GET", "/?loginError=%EB%B9%84%EB%B0%80", None))
            .await
            .unwrap();
        assert!(body_string(resp).await.contains("비밀"));
    }

    #[tokio::test]
    async fn main_shows_follow_button_state() {
        let state = test_state();
        let alice = seed_user(&state, "a@example.com", "alice").await;
        let bob = seed_user(&state, "b@example.com", "bob").await;
        state.storage.create_post(bob.id, "bob says hi", None).await.unwrap();
        state.storage.add_follow(alice.id, bob.id).await.unwrap();
        let token = seed_session(&state, alice.id).await;

        let resp = app(state)
            .oneshot(empty("GET", "/", Some(&token)))
            .await
            .unwrap();
        let html = body_string(resp).await;
        assert!(html.contains("안녕하세요! alice님"));
        assert!(html.contains("class=\"btn twit-unfollow\""));
        assert!(!html.contains("class=\"btn twit-follow\""));
    }

    #[tokio::test]
    async fn profile_requires_login() {
        let resp = app(test_state())
            .oneshot(empty("GET", "/profile", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(resp).await["message"], "로그인 필요");
    }

    #[tokio::test]
    async fn profile_lists_follows_and_posts() {
        let state = test_state();
        let alice = seed_user(&state, "a@example.com", "alice").await;
        let bob = seed_user(&state, "b@example.com", "bob").await;
        let carol = seed_user(&state, "c@example.com", "carol").await;
        state.storage.add_follow(alice.id, bob.id).await.unwrap();
        state.storage.add_follow(carol.id, alice.id).await.unwrap();
        state.storage.create_post(alice.id, "내 글", None).await.unwrap();
        let token = seed_session(&state, alice.id).await;

        let resp = app(state)
            .oneshot(empty("GET", "/profile", Some(&token)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_string(resp).await;
        assert!(html.contains("<title>내 정보 - DevTalk</title>"));
        assert!(html.contains("bob"));
        assert!(html.contains("carol"));
        assert!(html.contains("내 글"));
    }

    #[tokio::test]
    async fn join_page_for_guests_only() {
        let state = test_state();
        let resp = app(state.clone())
            .oneshot(empty("GET", "/join?error=exist", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_string(resp).await;
        assert!(html.contains("<title>회원가입 - DevTalk</title>"));
        assert!(html.contains("이미 가입된 이메일입니다."));

        let user = seed_user(&state, "a@example.com", "alice").await;
        let token = seed_session(&state, user.id).await;
        let resp = app(state)
            .oneshot(empty("GET", "/join", Some(&token)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert!(location(&resp).starts_with("/?error="));
    }

    #[tokio::test]
    async fn hashtag_without_query_redirects_home() {
        for uri in ["/hashtag", "/hashtag?hashtag=", "/hashtag?hashtag=%20%20"] {
            let resp = app(test_state()).oneshot(empty("GET", uri, None)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::FOUND, "{uri}");
            assert_eq!(location(&resp), "/");
        }
    }

    #[tokio::test]
    async fn hashtag_lists_only_tagged_posts() {
        let state = test_state();
        let alice = seed_user(&state, "a@example.com", "alice").await;
        let tagged = state.storage.create_post(alice.id, "sunny #weather", None).await.unwrap();
        state.storage.create_post(alice.id, "untagged post", None).await.unwrap();
        let tag = state.storage.find_or_create_hashtag("weather").await.unwrap();
        state.storage.tag_post(tagged.id, tag.id).await.unwrap();

        let resp = app(state)
            .oneshot(empty("GET", "/hashtag?hashtag=%23Weather", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_string(resp).await;
        assert!(html.contains("<title>#Weather | DevTalk</title>"));
        assert!(html.contains("sunny #weather"));
        assert!(!html.contains("untagged post"));
    }

    #[tokio::test]
    async fn unknown_hashtag_lists_nothing() {
        let state = test_state();
        let alice = seed_user(&state, "a@example.com", "alice").await;
        state.storage.create_post(alice.id, "some post", None).await.unwrap();

        let resp = app(state)
            .oneshot(empty("GET", "/hashtag?hashtag=nothing", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(!body_string(resp).await.contains("some post"));
    }

    #[tokio::test]
    async fn unknown_route_renders_404_page() {
        let resp = app(test_state())
            .oneshot(empty("GET", "/nowhere", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let html = body_string(resp).await;
        // tera escapes the slash
        assert!(html.contains("GET &#x2F;nowhere 라우터가 없습니다."));
    }
}
