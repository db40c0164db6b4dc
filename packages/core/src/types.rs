//! Core records for the DevTalk social network.
//!
//! Field names serialise in the shape the views and the JSON API expose:
//! camelCase scalars, with the association fields (`UserId`, `User`,
//! `Followers`, `Followings`, `Posts`) capitalised the way the templates
//! address them.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub type UserId = i64;
pub type PostId = i64;
pub type HashtagId = i64;

/// Current time as an RFC 3339 UTC string with millisecond precision.
///
/// All stored timestamps use this exact format so that lexicographic order
/// equals chronological order.
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// The identity service a user authenticated through.
///
/// Serialises as a lowercase string (e.g. `"kakao"`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Email + password account created through `/auth/join`.
    Local,
    Kakao,
    Naver,
    Google,
}

impl Provider {
    /// Every external OAuth provider, in the order they are offered on the login form.
    pub const OAUTH: [Provider; 3] = [Provider::Kakao, Provider::Naver, Provider::Google];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Local => "local",
            Provider::Kakao => "kakao",
            Provider::Naver => "naver",
            Provider::Google => "google",
        }
    }

    pub fn is_oauth(&self) -> bool {
        !matches!(self, Provider::Local)
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a [`Provider`] from its lowercase wire-format string.
impl std::str::FromStr for Provider {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Provider::Local),
            "kakao" => Ok(Provider::Kakao),
            "naver" => Ok(Provider::Naver),
            "google" => Ok(Provider::Google),
            _ => Err(format!(
                "unknown provider {:?}; expected one of: local, kakao, naver, google",
                s
            )),
        }
    }
}

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,

    /// Unique among local accounts. OAuth accounts may have none.
    #[schema(format = "email")]
    pub email: Option<String>,

    /// Display name, at most 15 characters for local signups.
    #[schema(max_length = 15)]
    pub nick: String,

    /// Argon2 PHC string; present only for local accounts. Never serialised.
    #[serde(skip)]
    pub password: Option<String>,

    pub provider: Provider,

    /// The provider's identifier for this user. `None` for local accounts.
    pub sns_id: Option<String>,

    #[schema(format = "date-time")]
    pub created_at: String,

    #[schema(format = "date-time")]
    pub updated_at: String,
}

impl User {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            nick: self.nick.clone(),
        }
    }
}

/// Fields required to create a [`User`]. The repository assigns id and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: Option<String>,
    pub nick: String,
    /// Already-hashed password for local accounts.
    pub password: Option<String>,
    pub provider: Provider,
    pub sns_id: Option<String>,
}

impl NewUser {
    pub fn local(email: impl Into<String>, nick: impl Into<String>, password_hash: String) -> Self {
        Self {
            email: Some(email.into()),
            nick: nick.into(),
            password: Some(password_hash),
            provider: Provider::Local,
            sns_id: None,
        }
    }
}

/// The `{id, nick}` projection used wherever another user is listed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct UserSummary {
    pub id: UserId,
    pub nick: String,
}

/// A short post on the timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,

    #[schema(max_length = 140)]
    pub content: String,

    /// Reference path of an uploaded image (e.g. `/img/cat1718000000000.png`).
    pub img: Option<String>,

    /// The author. Only this user may update or delete the post.
    #[serde(rename = "UserId")]
    pub user_id: UserId,

    #[schema(format = "date-time")]
    pub created_at: String,

    #[schema(format = "date-time")]
    pub updated_at: String,
}

/// A post together with its author's summary, as listed on the main and hashtag pages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct TimelinePost {
    #[serde(flatten)]
    pub post: Post,

    #[serde(rename = "User")]
    pub user: UserSummary,
}

/// A tag extracted from post content. Titles are lowercase and unique.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Hashtag {
    pub id: HashtagId,

    #[schema(max_length = 15)]
    pub title: String,

    #[schema(format = "date-time")]
    pub created_at: String,
}

/// A user with both directions of the follow graph and their own posts,
/// as shown on the profile page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    #[serde(flatten)]
    pub user: User,

    #[serde(rename = "Followers")]
    pub followers: Vec<UserSummary>,

    #[serde(rename = "Followings")]
    pub followings: Vec<UserSummary>,

    /// Newest first.
    #[serde(rename = "Posts")]
    pub posts: Vec<Post>,
}
