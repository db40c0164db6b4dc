//! `GET /api-docs/openapi.json` — the OpenAPI 3 document for every route.

use axum::Json;
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

use crate::middleware::auth::SESSION_COOKIE;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "DevTalk API",
        version = "1.0.0",
        description = "DevTalk SNS 프로젝트 API 문서",
        contact(name = "DevTalk Team"),
    ),
    paths(
        super::page::render_main,
        super::page::render_profile,
        super::page::render_join,
        super::page::render_hashtag,
        super::auth::join,
        super::auth::login,
        super::auth::logout,
        super::auth::oauth_start,
        super::auth::oauth_callback,
        super::post::upload_image,
        super::post::create_post,
        super::post::delete_post,
        super::post::update_post,
        super::user::follow,
        super::user::unfollow,
        super::user::remove_follower,
    ),
    components(schemas(
        devtalk::User,
        devtalk::Post,
        devtalk::Hashtag,
        devtalk::Provider,
        devtalk::UserSummary,
        devtalk_api::MessageResponse,
        devtalk_api::JoinForm,
        devtalk_api::LoginForm,
        devtalk_api::CreatePostForm,
        devtalk_api::ImageUploadForm,
        devtalk_api::UpdatePostRequest,
        devtalk_api::UpdatePostResponse,
        devtalk_api::UploadResponse,
    )),
    modifiers(&SessionCookie),
    tags(
        (name = "Page", description = "페이지 렌더링"),
        (name = "Auth", description = "인증"),
        (name = "Post", description = "게시글"),
        (name = "User", description = "팔로우"),
    )
)]
pub struct ApiDoc;

/// Registers the `session` security scheme (the session cookie).
struct SessionCookie;

impl Modify for SessionCookie {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "session",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE))),
        );
    }
}

/// `GET /api-docs/openapi.json`
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
