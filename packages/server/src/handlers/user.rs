//! Follow-graph handlers.
//!
//! - `POST   /user/{id}/follow`    — the requester follows `id`.
//! - `DELETE /user/{id}/following` — the requester stops following `id`.
//! - `DELETE /user/{id}/follower`  — `id` stops following the requester.
//!
//! The target id is not checked for existence; all three operations are
//! idempotent.

use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::WithRejection;
use devtalk::UserId;
use devtalk_api::{messages, MessageResponse};

use crate::{error::AppError, middleware::auth::RequireAuth};

use super::AppState;

/// `POST /user/{id}/follow` — follow a user. Responds with the plain text `success`.
#[utoipa::path(
    post,
    path = "/user/{id}/follow",
    tag = "User",
    security(("session" = [])),
    params(("id" = i64, Path, description = "팔로우할 사용자 ID")),
    responses(
        (status = 200, description = "팔로우 성공", body = String, content_type = "text/plain"),
        (status = 401, description = "로그인 필요", body = MessageResponse),
        (status = 500, description = "서버 오류", body = MessageResponse),
    )
)]
pub async fn follow(
    State(state): State<AppState>,
    auth: RequireAuth,
    WithRejection(Path(id), _): WithRejection<Path<UserId>, AppError>,
) -> Result<&'static str, AppError> {
    state.storage.add_follow(auth.user.id, id).await?;
    tracing::info!(follower = auth.user.id, following = id, "followed");
    Ok(messages::FOLLOWED)
}

/// `DELETE /user/{id}/following` — unfollow a user.
#[utoipa::path(
    delete,
    path = "/user/{id}/following",
    tag = "User",
    security(("session" = [])),
    params(("id" = i64, Path, description = "팔로우를 취소할 사용자 ID")),
    responses(
        (status = 200, description = "팔로우를 취소했습니다.", body = MessageResponse),
        (status = 401, description = "로그인 필요", body = MessageResponse),
        (status = 500, description = "서버 오류", body = MessageResponse),
    )
)]
pub async fn unfollow(
    State(state): State<AppState>,
    auth: RequireAuth,
    WithRejection(Path(id), _): WithRejection<Path<UserId>, AppError>,
) -> Result<Json<MessageResponse>, AppError> {
    state.storage.remove_follow(auth.user.id, id).await?;
    tracing::info!(follower = auth.user.id, following = id, "unfollowed");
    Ok(Json(MessageResponse::new(messages::UNFOLLOWED)))
}

/// `DELETE /user/{id}/follower` — remove a follower.
#[utoipa::path(
    delete,
    path = "/user/{id}/follower",
    tag = "User",
    security(("session" = [])),
    params(("id" = i64, Path, description = "제거할 팔로워 ID")),
    responses(
        (status = 200, description = "팔로워가 제거되었습니다", body = MessageResponse),
        (status = 401, description = "로그인 필요", body = MessageResponse),
        (status = 500, description = "서버 오류", body = MessageResponse),
    )
)]
pub async fn remove_follower(
    State(state): State<AppState>,
    auth: RequireAuth,
    WithRejection(Path(id), _): WithRejection<Path<UserId>, AppError>,
) -> Result<Json<MessageResponse>, AppError> {
    state.storage.remove_follow(id, auth.user.id).await?;
    tracing::info!(follower = id, following = auth.user.id, "follower removed");
    Ok(Json(MessageResponse::new(messages::FOLLOWER_REMOVED)))
}
