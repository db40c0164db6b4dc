//! Post handlers.
//!
//! - `POST   /post/img`  — upload an image, returns its `/img/…` reference.
//! - `POST   /post`      — create a post and link its hashtags.
//! - `PUT    /post/{id}` — edit the content of one's own post.
//! - `DELETE /post/{id}` — delete one's own post.

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Form, Json,
};
use axum_extra::extract::WithRejection;
use devtalk::{extract_hashtags, validate_content, Post, PostId, UserId};
use devtalk_api::{
    messages, CreatePostForm, MessageResponse, UpdatePostRequest, UpdatePostResponse,
    UploadResponse,
};

use crate::{
    error::{AppError, Found},
    middleware::auth::RequireAuth,
    upload::{save_upload, MAX_UPLOAD_BYTES},
};

use super::AppState;

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::BadRequest(e.body_text())
    }
}

/// `POST /post/img` — store an uploaded image.
///
/// Reads the multipart field `img`. Returns 413 for files over 5 MiB and 400
/// when the field is missing.
#[utoipa::path(
    post,
    path = "/post/img",
    tag = "Post",
    security(("session" = [])),
    request_body(content = devtalk_api::ImageUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "업로드된 이미지 경로", body = UploadResponse),
        (status = 400, description = "img 필드 없음", body = MessageResponse),
        (status = 401, description = "로그인 필요", body = MessageResponse),
        (status = 413, description = "5MB 초과", body = MessageResponse),
    )
)]
pub async fn upload_image(
    State(state): State<AppState>,
    auth: RequireAuth,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("img") {
            continue;
        }
        let original = field.file_name().unwrap_or("upload").to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::PayloadTooLarge);
        }

        let url = save_upload(&state.config.upload_dir, &original, &bytes).await?;
        tracing::info!(user_id = auth.user.id, %url, "image uploaded");
        return Ok(Json(UploadResponse { url }));
    }
    Err(AppError::BadRequest(messages::IMAGE_REQUIRED.into()))
}

/// `POST /post` — publish a post.
///
/// Hashtags in the content are linked after the post is stored. Redirects
/// to `/`.
#[utoipa::path(
    post,
    path = "/post",
    tag = "Post",
    security(("session" = [])),
    request_body(content = CreatePostForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 302, description = "게시글 작성 후 메인으로"),
        (status = 400, description = "내용이 비었거나 140자 초과", body = MessageResponse),
        (status = 401, description = "로그인 필요", body = MessageResponse),
        (status = 500, description = "서버 오류", body = MessageResponse),
    )
)]
pub async fn create_post(
    State(state): State<AppState>,
    auth: RequireAuth,
    Form(form): Form<CreatePostForm>,
) -> Result<Found, AppError> {
    validate_content(&form.content).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let post = state
        .storage
        .create_post(auth.user.id, &form.content, form.image())
        .await?;

    let tags = extract_hashtags(&post.content);
    for title in &tags {
        let hashtag = state.storage.find_or_create_hashtag(title).await?;
        state.storage.tag_post(post.id, hashtag.id).await?;
    }

    tracing::info!(post_id = post.id, user_id = auth.user.id, hashtags = tags.len(), "post created");
    Ok(Found::to("/"))
}

/// Load post `id` and check that `user` wrote it.
async fn owned_post(state: &AppState, id: PostId, user: UserId) -> Result<Post, AppError> {
    let post = state
        .storage
        .get_post(id)
        .await?
        .ok_or_else(|| AppError::NotFound(messages::POST_NOT_FOUND.into()))?;
    if post.user_id != user {
        return Err(AppError::Forbidden);
    }
    Ok(post)
}

/// `DELETE /post/{id}` — delete one's own post.
#[utoipa::path(
    delete,
    path = "/post/{id}",
    tag = "Post",
    security(("session" = [])),
    params(("id" = i64, Path, description = "게시글 ID")),
    responses(
        (status = 200, description = "삭제되었습니다", body = MessageResponse),
        (status = 401, description = "로그인 필요", body = MessageResponse),
        (status = 403, description = "권한이 없습니다", body = MessageResponse),
        (status = 404, description = "게시글을 찾을 수 없습니다", body = MessageResponse),
        (status = 500, description = "서버 오류", body = MessageResponse),
    )
)]
pub async fn delete_post(
    State(state): State<AppState>,
    auth: RequireAuth,
    WithRejection(Path(id), _): WithRejection<Path<PostId>, AppError>,
) -> Result<Json<MessageResponse>, AppError> {
    owned_post(&state, id, auth.user.id).await?;
    state.storage.delete_post(id).await?;
    tracing::info!(post_id = id, user_id = auth.user.id, "post deleted");
    Ok(Json(MessageResponse::new(messages::DELETED)))
}

/// `PUT /post/{id}` — replace the content of one's own post.
///
/// Only the content changes; hashtag links made at creation are kept.
#[utoipa::path(
    put,
    path = "/post/{id}",
    tag = "Post",
    security(("session" = [])),
    params(("id" = i64, Path, description = "게시글 ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "수정되었습니다", body = UpdatePostResponse),
        (status = 400, description = "내용이 비었거나 140자 초과", body = MessageResponse),
        (status = 401, description = "로그인 필요", body = MessageResponse),
        (status = 403, description = "권한이 없습니다", body = MessageResponse),
        (status = 404, description = "게시글을 찾을 수 없습니다", body = MessageResponse),
        (status = 500, description = "서버 오류", body = MessageResponse),
    )
)]
pub async fn update_post(
    State(state): State<AppState>,
    auth: RequireAuth,
    WithRejection(Path(id), _): WithRejection<Path<PostId>, AppError>,
    WithRejection(Json(req), _): WithRejection<Json<UpdatePostRequest>, AppError>,
) -> Result<Json<UpdatePostResponse>, AppError> {
    owned_post(&state, id, auth.user.id).await?;
    validate_content(&req.content).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let post = state.storage.update_post_content(id, &req.content).await?;
    tracing::info!(post_id = id, user_id = auth.user.id, "post updated");
    Ok(Json(UpdatePostResponse {
        message: messages::UPDATED.into(),
        post,
    }))
}
