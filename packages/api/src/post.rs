//! Post types — `POST /post`, `POST /post/img`, `PUT /post/{id}`.

use devtalk::Post;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Form body for `POST /post` (`application/x-www-form-urlencoded`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct CreatePostForm {
    /// Post text, 1 to 140 characters. `#tokens` become hashtags.
    #[schema(max_length = 140, example = "오늘 날씨가 좋네요 #맑음 #산책")]
    #[serde(default)]
    pub content: String,

    /// Reference returned earlier by `POST /post/img`. Blank is treated as absent.
    #[serde(default)]
    pub url: Option<String>,
}

impl CreatePostForm {
    /// The image reference, with blank values treated as absent.
    pub fn image(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}

/// JSON body for `PUT /post/{id}`. Only the content can change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct UpdatePostRequest {
    #[serde(default)]
    #[schema(max_length = 140, example = "수정된 내용입니다 #태그")]
    pub content: String,
}

/// Response to a successful `PUT /post/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct UpdatePostResponse {
    #[schema(example = "수정되었습니다")]
    pub message: String,

    /// The post as stored after the update.
    pub post: Post,
}

/// Multipart body for `POST /post/img`. Documentation only; the handler
/// reads the stream field by field.
#[derive(Debug, ToSchema)]
pub struct ImageUploadForm {
    /// Image file, at most 5 MiB.
    #[schema(value_type = String, format = Binary)]
    pub img: Vec<u8>,
}

/// Response to a successful `POST /post/img`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct UploadResponse {
    #[schema(example = "/img/filename1718000000000.jpg")]
    pub url: String,
}
