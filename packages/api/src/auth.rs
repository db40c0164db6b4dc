//! Authentication forms — `POST /auth/join`, `POST /auth/login` and the OAuth callback.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Form body for `POST /auth/join` (`application/x-www-form-urlencoded`).
///
/// Absent fields read as empty and fail validation like any other bad input.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(default)]
pub struct JoinForm {
    #[schema(example = "user@example.com")]
    pub email: String,

    #[schema(max_length = 15, example = "사용자")]
    pub nick: String,

    #[schema(min_length = 8)]
    pub password: String,
}

/// Form body for `POST /auth/login`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(default)]
pub struct LoginForm {
    #[schema(example = "user@example.com")]
    pub email: String,

    #[schema(example = "password123")]
    pub password: String,
}

/// Query the provider appends when redirecting back to `/auth/{provider}/callback`.
///
/// Providers send `error` (and no `code`) when the user declines consent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}
