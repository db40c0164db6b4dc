//! OAuth login through Kakao, Naver and Google.
//!
//! The provider round-trip (authorization URL, code exchange, profile fetch)
//! sits behind the [`OAuthClient`] trait; [`HttpOAuthClient`] is the real
//! implementation. Everything after the profile is fetched is provider
//! independent: [`ProviderProfile::from_json`] maps the raw profile through a
//! per-provider table of JSON pointers, and [`authenticate`] finds or creates
//! the matching user.
//!
//! | Provider | sns id | display name | email |
//! |----------|--------|--------------|-------|
//! | kakao | `/id` | `/properties/nickname` | `/kakao_account/email` |
//! | naver | `/response/id` | `/response/nickname` | `/naver_account/email` |
//! | google | `/sub` | `/name` | `/naver_account/email` |
//!
//! Naver and Google both read the email from `naver_account.email`, which
//! neither provider actually sends, so those accounts end up without an
//! email. Kept as-is pending a product decision.

pub mod http;

pub use http::HttpOAuthClient;

use async_trait::async_trait;
use devtalk::{validation::MAX_NICK_CHARS, NewUser, Provider, User};
use serde_json::Value;

use crate::storage::{Storage, StorageError};

// ---------------------------------------------------------------------------
// OAuthError
// ---------------------------------------------------------------------------

/// Anything that can go wrong between `/auth/{provider}` and a logged-in user.
///
/// Every variant ends in the same failure redirect; the detail is only logged.
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("provider {0} is not configured")]
    NotConfigured(Provider),

    #[error("provider denied the request: {0}")]
    Denied(String),

    #[error("callback carried no authorization code")]
    MissingCode,

    #[error("state parameter does not match the issued state")]
    StateMismatch,

    #[error("provider request failed: {0}")]
    Http(String),

    #[error("profile is missing {0}")]
    MissingField(&'static str),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<reqwest::Error> for OAuthError {
    fn from(e: reqwest::Error) -> Self {
        OAuthError::Http(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Profile mapping
// ---------------------------------------------------------------------------

/// The provider-independent view of a fetched profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub sns_id: String,
    pub display_name: String,
    pub email: Option<String>,
}

struct FieldMap {
    sns_id: &'static str,
    display_name: &'static str,
    email: &'static str,
}

fn field_map(provider: Provider) -> Option<FieldMap> {
    match provider {
        Provider::Kakao => Some(FieldMap {
            sns_id: "/id",
            display_name: "/properties/nickname",
            email: "/kakao_account/email",
        }),
        Provider::Naver => Some(FieldMap {
            sns_id: "/response/id",
            display_name: "/response/nickname",
            email: "/naver_account/email",
        }),
        Provider::Google => Some(FieldMap {
            sns_id: "/sub",
            display_name: "/name",
            email: "/naver_account/email",
        }),
        Provider::Local => None,
    }
}

/// Strings as-is, numbers in decimal (Kakao ids are numeric).
fn scalar(value: &Value, pointer: &str) -> Option<String> {
    match value.pointer(pointer)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl ProviderProfile {
    /// Map a raw provider profile. Display names longer than a nick allows
    /// are truncated.
    pub fn from_json(provider: Provider, raw: &Value) -> Result<Self, OAuthError> {
        let map = field_map(provider).ok_or(OAuthError::NotConfigured(provider))?;
        let sns_id = scalar(raw, map.sns_id).ok_or(OAuthError::MissingField("id"))?;
        let display_name =
            scalar(raw, map.display_name).ok_or(OAuthError::MissingField("display name"))?;
        Ok(Self {
            sns_id,
            display_name: display_name.chars().take(MAX_NICK_CHARS).collect(),
            email: scalar(raw, map.email),
        })
    }
}

// ---------------------------------------------------------------------------
// OAuthClient
// ---------------------------------------------------------------------------

/// The provider side of an OAuth login.
#[async_trait]
pub trait OAuthClient: Send + Sync + 'static {
    /// Where to send the browser to start a login. `state` must come back
    /// unchanged on the callback.
    fn authorize_url(&self, provider: Provider, state: &str) -> Result<String, OAuthError>;

    /// Exchange an authorization `code` and fetch the mapped profile.
    async fn fetch_profile(
        &self,
        provider: Provider,
        code: &str,
        state: &str,
    ) -> Result<ProviderProfile, OAuthError>;
}

// ---------------------------------------------------------------------------
// Find-or-create
// ---------------------------------------------------------------------------

/// Korean label used in the failure notice, e.g. `카카오로그인 실패`.
pub fn provider_label(provider: Provider) -> &'static str {
    match provider {
        Provider::Kakao => "카카오",
        Provider::Naver => "네이버",
        Provider::Google => "구글",
        Provider::Local => "",
    }
}

/// Return the user registered for `(provider, profile.sns_id)`, creating it on
/// first login.
pub async fn authenticate(
    storage: &dyn Storage,
    provider: Provider,
    profile: ProviderProfile,
) -> Result<User, OAuthError> {
    if let Some(user) = storage.find_sns_user(provider, &profile.sns_id).await? {
        return Ok(user);
    }

    let new_user = NewUser {
        email: profile.email,
        nick: profile.display_name,
        password: None,
        provider,
        sns_id: Some(profile.sns_id.clone()),
    };
    match storage.create_user(&new_user).await {
        Ok(user) => {
            tracing::info!(user_id = user.id, %provider, "created user from oauth login");
            Ok(user)
        }
        // A concurrent first login created it between the lookup and the insert.
        Err(StorageError::Conflict(detail)) => {
            let existing = storage.find_sns_user(provider, &profile.sns_id).await?;
            winner_after_conflict(existing, detail)
        }
        Err(e) => Err(e.into()),
    }
}

/// The account a racing login created, or the original conflict if the
/// insert collided with something else.
fn winner_after_conflict(existing: Option<User>, detail: String) -> Result<User, OAuthError> {
    existing.ok_or(OAuthError::Storage(StorageError::Conflict(detail)))
}
