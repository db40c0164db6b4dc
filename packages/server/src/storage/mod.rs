//! Storage abstraction layer for the DevTalk server.
//!
//! The [`Storage`] trait is the repository contract between the HTTP handler
//! layer and persistence. Ownership checks and input validation live in the
//! handlers; storage is purely a data access layer.
//!
//! # Implementations
//!
//! | Type | When to use |
//! |------|-------------|
//! | [`MemoryStorage`] | Tests, conformance suite, throwaway local runs |
//! | [`SqliteStorage`] | Production; durable single-file database |
//!
//! [`MemoryStorage`]: memory::MemoryStorage
//! [`SqliteStorage`]: sqlite::SqliteStorage

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use devtalk::{
    Hashtag, HashtagId, NewUser, Post, PostId, Profile, Provider, TimelinePost, User, UserId,
    UserSummary,
};

// ---------------------------------------------------------------------------
// StorageError
// ---------------------------------------------------------------------------

/// Errors that storage operations can return.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The item to update or delete does not exist.
    #[error("not found")]
    NotFound,

    /// A uniqueness constraint was violated (e.g. a second local account
    /// with the same email).
    #[error("conflict: {0}")]
    Conflict(String),

    /// An unexpected error in the underlying storage backend.
    #[error("internal storage error: {0}")]
    Internal(String),
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A login session: an opaque cookie token bound to a user until `expires_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user_id: UserId,
    /// RFC 3339 UTC timestamp in the [`devtalk::timestamp_now`] format, so it
    /// compares lexicographically against the current time.
    pub expires_at: String,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= devtalk::timestamp_now()
    }
}

// ---------------------------------------------------------------------------
// Storage trait
// ---------------------------------------------------------------------------

/// The persistence contract for a DevTalk server.
///
/// All methods are `async` and return `Result<_, StorageError>`. Implementations
/// must be `Send + Sync + 'static` so they can be held in an `Arc<dyn Storage>`.
///
/// Listings of posts are always newest first (`created_at` descending, ties
/// broken by id descending). Listings of users are ordered by id ascending.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    // --- Users ---------------------------------------------------------------

    /// Create a user, assigning its id and timestamps.
    ///
    /// Returns [`StorageError::Conflict`] if a local account already uses the
    /// email, or an OAuth account already has the same (provider, sns_id).
    async fn create_user(&self, user: &NewUser) -> Result<User, StorageError>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError>;

    /// Find the local (email + password) account registered with `email`.
    async fn find_local_user(&self, email: &str) -> Result<Option<User>, StorageError>;

    /// Find the account created through `provider` for its user `sns_id`.
    async fn find_sns_user(
        &self,
        provider: Provider,
        sns_id: &str,
    ) -> Result<Option<User>, StorageError>;

    // --- Follows -------------------------------------------------------------

    /// Record that `follower` follows `following`. Idempotent. Neither id is
    /// checked for existence.
    async fn add_follow(&self, follower: UserId, following: UserId) -> Result<(), StorageError>;

    /// Remove a follow edge. Idempotent (no error if it didn't exist).
    async fn remove_follow(&self, follower: UserId, following: UserId)
        -> Result<(), StorageError>;

    /// Users who follow `id`.
    async fn list_followers(&self, id: UserId) -> Result<Vec<UserSummary>, StorageError>;

    /// Users that `id` follows.
    async fn list_followings(&self, id: UserId) -> Result<Vec<UserSummary>, StorageError>;

    // --- Posts ---------------------------------------------------------------

    async fn create_post(
        &self,
        author: UserId,
        content: &str,
        img: Option<&str>,
    ) -> Result<Post, StorageError>;

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, StorageError>;

    /// Replace a post's content and bump `updated_at`. Returns the stored post,
    /// or [`StorageError::NotFound`].
    async fn update_post_content(&self, id: PostId, content: &str) -> Result<Post, StorageError>;

    /// Delete a post and its hashtag links. Hashtags themselves are kept.
    /// Returns [`StorageError::NotFound`] if the post does not exist.
    async fn delete_post(&self, id: PostId) -> Result<(), StorageError>;

    /// Every post with its author, newest first.
    async fn list_posts(&self) -> Result<Vec<TimelinePost>, StorageError>;

    /// Posts written by `author`, newest first.
    async fn list_posts_by_user(&self, author: UserId) -> Result<Vec<Post>, StorageError>;

    // --- Hashtags ------------------------------------------------------------

    /// Return the hashtag titled `title`, creating it if needed.
    async fn find_or_create_hashtag(&self, title: &str) -> Result<Hashtag, StorageError>;

    /// Exact-title lookup.
    async fn find_hashtag(&self, title: &str) -> Result<Option<Hashtag>, StorageError>;

    /// Link a post to a hashtag. Idempotent.
    async fn tag_post(&self, post: PostId, hashtag: HashtagId) -> Result<(), StorageError>;

    /// Posts linked to `hashtag`, with their authors, newest first.
    async fn find_posts_by_hashtag(
        &self,
        hashtag: HashtagId,
    ) -> Result<Vec<TimelinePost>, StorageError>;

    // --- Sessions ------------------------------------------------------------

    /// Store a new session. Sessions already expired are purged first.
    async fn create_session(&self, session: &Session) -> Result<(), StorageError>;

    async fn get_session(&self, token: &str) -> Result<Option<Session>, StorageError>;

    /// Remove a session. No-op if the token is unknown.
    async fn delete_session(&self, token: &str) -> Result<(), StorageError>;

    // --- Composite -----------------------------------------------------------

    /// A user together with followers, followings and their own posts.
    async fn get_profile(&self, id: UserId) -> Result<Option<Profile>, StorageError> {
        let Some(user) = self.get_user(id).await? else {
            return Ok(None);
        };
        let followers = self.list_followers(id).await?;
        let followings = self.list_followings(id).await?;
        let posts = self.list_posts_by_user(id).await?;
        Ok(Some(Profile {
            user,
            followers,
            followings,
            posts,
        }))
    }
}
