//! Error types returned by handlers.
//!
//! JSON endpoints return [`AppError`], which serialises to a
//! [`MessageResponse`] body with a fixed message. Rendered pages return
//! [`PageError`], which the error-page middleware turns into `error.html`.
//! In both cases diagnostic detail is logged, never sent to the client.

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use devtalk_api::{messages, MessageResponse};

use crate::storage::StorageError;

/// An error that a JSON handler can return; converts directly to an HTTP response.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    /// The requester does not own the resource.
    Forbidden,
    NotFound(String),
    Conflict(String),
    PayloadTooLarge,
    /// Detail is logged; the client only sees the generic message.
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Forbidden => (StatusCode::FORBIDDEN, messages::FORBIDDEN.into()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::PayloadTooLarge => {
                (StatusCode::PAYLOAD_TOO_LARGE, messages::FILE_TOO_LARGE.into())
            }
            AppError::Internal(detail) => {
                tracing::error!(%detail, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, messages::SERVER_ERROR.into())
            }
        };
        (status, Json(MessageResponse::new(message))).into_response()
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound => AppError::NotFound(messages::POST_NOT_FOUND.into()),
            StorageError::Conflict(msg) => AppError::Conflict(msg),
            StorageError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Internal(format!("io error: {e}"))
    }
}

// ---------------------------------------------------------------------------
// Page errors
// ---------------------------------------------------------------------------

/// A failure on a rendered page, forwarded to the error-page middleware.
#[derive(Debug)]
pub enum PageError {
    NotFound(String),
    Internal(String),
}

/// Marker left in the response extensions by [`PageError`]; the error-page
/// middleware replaces such responses with the rendered error view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFailure {
    pub status: StatusCode,
    pub message: String,
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let failure = match self {
            PageError::NotFound(message) => PageFailure {
                status: StatusCode::NOT_FOUND,
                message,
            },
            PageError::Internal(detail) => {
                tracing::error!(%detail, "page failed");
                PageFailure {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: messages::SERVER_ERROR.into(),
                }
            }
        };
        let mut response = (failure.status, failure.message.clone()).into_response();
        response.extensions_mut().insert(failure);
        response
    }
}

impl From<StorageError> for PageError {
    fn from(e: StorageError) -> Self {
        PageError::Internal(e.to_string())
    }
}

impl From<tera::Error> for PageError {
    fn from(e: tera::Error) -> Self {
        // tera nests the useful part in `source`
        let mut detail = e.to_string();
        let mut source = std::error::Error::source(&e);
        while let Some(s) = source {
            detail.push_str(": ");
            detail.push_str(&s.to_string());
            source = s.source();
        }
        PageError::Internal(detail)
    }
}

// ---------------------------------------------------------------------------
// Found
// ---------------------------------------------------------------------------

/// A `302 Found` redirect, the status browsers expect after a form post.
///
/// Axum's own `Redirect::to` answers `303`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Found(pub String);

impl Found {
    pub fn to(location: impl Into<String>) -> Self {
        Found(location.into())
    }

    /// Redirect to `path` with a single urlencoded query parameter.
    pub fn with_query(path: &str, key: &str, value: &str) -> Self {
        Found(format!("{path}?{key}={}", urlencoding::encode(value)))
    }
}

impl IntoResponse for Found {
    fn into_response(self) -> Response {
        (StatusCode::FOUND, [(header::LOCATION, self.0)]).into_response()
    }
}
