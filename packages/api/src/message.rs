//! The `{ "message": ... }` body shared by JSON successes and errors.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The JSON body returned by every message-only response.
///
/// ```json
/// { "message": "권한이 없습니다" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "삭제되었습니다")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Fixed user-facing messages.
///
/// | constant | used for |
/// |----------|----------|
/// | `FORBIDDEN` | 403 when the requester does not own the post |
/// | `POST_NOT_FOUND` | 404 for an unknown post id |
/// | `SERVER_ERROR` | 500 on any data-access failure |
/// | `LOGIN_REQUIRED` | 401 from login-gated routes |
/// | `NOT_REGISTERED`, `WRONG_PASSWORD` | `?loginError=` notices after a failed login |
/// | `JOIN_EXISTS`, `JOIN_INVALID` | signup form notices for `?error=exist` / `?error=invalid` |
pub mod messages {
    pub const FORBIDDEN: &str = "권한이 없습니다";
    pub const POST_NOT_FOUND: &str = "게시글을 찾을 수 없습니다";
    pub const SERVER_ERROR: &str = "서버 오류";
    pub const LOGIN_REQUIRED: &str = "로그인 필요";
    pub const ALREADY_LOGGED_IN: &str = "이미 로그인한 상태입니다";
    pub const NO_USER: &str = "no user";
    pub const FILE_TOO_LARGE: &str = "파일 크기는 5MB를 넘을 수 없습니다";
    pub const DELETED: &str = "삭제되었습니다";
    pub const UPDATED: &str = "수정되었습니다";
    pub const UNFOLLOWED: &str = "팔로우를 취소했습니다.";
    pub const FOLLOWER_REMOVED: &str = "팔로워가 제거되었습니다";
    pub const FOLLOWED: &str = "success";
    pub const NOT_REGISTERED: &str = "가입되지 않은 회원입니다.";
    pub const WRONG_PASSWORD: &str = "비밀번호가 일치하지 않습니다.";
    pub const JOIN_EXISTS: &str = "이미 가입된 이메일입니다.";
    pub const JOIN_INVALID: &str = "입력값을 확인해주세요.";
    pub const IMAGE_REQUIRED: &str = "img 필드가 필요합니다";
}
