//! In-memory storage implementation.
//!
//! All data is held in RAM behind a [`RwLock`] and is lost when the process
//! exits. Use this for tests, the conformance suite, and throwaway runs.
//!
//! Rows live in [`BTreeMap`]s keyed by their auto-incremented id, so id order
//! is iteration order; the two many-to-many relations are sets of id pairs.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use devtalk::{
    timestamp_now, Hashtag, HashtagId, NewUser, Post, PostId, Provider, TimelinePost, User,
    UserId, UserSummary,
};

use super::{Session, Storage, StorageError};

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Inner {
    users: BTreeMap<UserId, User>,
    posts: BTreeMap<PostId, Post>,
    hashtags: BTreeMap<HashtagId, Hashtag>,
    /// (follower, following)
    follows: HashSet<(UserId, UserId)>,
    /// (post, hashtag)
    post_hashtags: HashSet<(PostId, HashtagId)>,
    sessions: HashMap<String, Session>,
    last_user_id: UserId,
    last_post_id: PostId,
    last_hashtag_id: HashtagId,
}

impl Inner {
    fn summaries(&self, ids: impl Iterator<Item = UserId>) -> Vec<UserSummary> {
        let mut ids: Vec<UserId> = ids.collect();
        ids.sort_unstable();
        ids.into_iter()
            .filter_map(|id| self.users.get(&id).map(User::summary))
            .collect()
    }

    /// Attach authors and sort newest first. Posts whose author is missing are dropped.
    fn timeline<'a>(&self, posts: impl Iterator<Item = &'a Post>) -> Vec<TimelinePost> {
        let mut out: Vec<TimelinePost> = posts
            .filter_map(|p| {
                self.users.get(&p.user_id).map(|u| TimelinePost {
                    post: p.clone(),
                    user: u.summary(),
                })
            })
            .collect();
        out.sort_by(|a, b| newest_first(&a.post, &b.post));
        out
    }
}

fn newest_first(a: &Post, b: &Post) -> std::cmp::Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}

// ---------------------------------------------------------------------------
// MemoryStorage
// ---------------------------------------------------------------------------

/// Thread-safe, in-memory implementation of [`Storage`].
pub struct MemoryStorage {
    inner: RwLock<Inner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Storage impl
// ---------------------------------------------------------------------------

#[async_trait]
impl Storage for MemoryStorage {
    // --- Users ---------------------------------------------------------------

    async fn create_user(&self, user: &NewUser) -> Result<User, StorageError> {
        let mut inner = self.inner.write().unwrap();

        let duplicate = inner.users.values().any(|u| {
            if user.provider == Provider::Local {
                u.provider == Provider::Local && u.email.is_some() && u.email == user.email
            } else {
                u.provider == user.provider && u.sns_id.is_some() && u.sns_id == user.sns_id
            }
        });
        if duplicate {
            return Err(StorageError::Conflict(format!(
                "{} user already exists",
                user.provider
            )));
        }

        inner.last_user_id += 1;
        let now = timestamp_now();
        let created = User {
            id: inner.last_user_id,
            email: user.email.clone(),
            nick: user.nick.clone(),
            password: user.password.clone(),
            provider: user.provider,
            sns_id: user.sns_id.clone(),
            created_at: now.clone(),
            updated_at: now,
        };
        inner.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let inner = self.inner.read().unwrap();
        Ok(inner.users.get(&id).cloned())
    }

    async fn find_local_user(&self, email: &str) -> Result<Option<User>, StorageError> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .users
            .values()
            .find(|u| u.provider == Provider::Local && u.email.as_deref() == Some(email))
            .cloned())
    }

    async fn find_sns_user(
        &self,
        provider: Provider,
        sns_id: &str,
    ) -> Result<Option<User>, StorageError> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .users
            .values()
            .find(|u| u.provider == provider && u.sns_id.as_deref() == Some(sns_id))
            .cloned())
    }

    // --- Follows -------------------------------------------------------------

    async fn add_follow(&self, follower: UserId, following: UserId) -> Result<(), StorageError> {
        let mut inner = self.inner.write().unwrap();
        inner.follows.insert((follower, following));
        Ok(())
    }

    async fn remove_follow(
        &self,
        follower: UserId,
        following: UserId,
    ) -> Result<(), StorageError> {
        let mut inner = self.inner.write().unwrap();
        inner.follows.remove(&(follower, following));
        Ok(())
    }

    async fn list_followers(&self, id: UserId) -> Result<Vec<UserSummary>, StorageError> {
        let inner = self.inner.read().unwrap();
        let ids = inner
            .follows
            .iter()
            .filter(|(_, following)| *following == id)
            .map(|(follower, _)| *follower);
        Ok(inner.summaries(ids))
    }

    async fn list_followings(&self, id: UserId) -> Result<Vec<UserSummary>, StorageError> {
        let inner = self.inner.read().unwrap();
        let ids = inner
            .follows
            .iter()
            .filter(|(follower, _)| *follower == id)
            .map(|(_, following)| *following);
        Ok(inner.summaries(ids))
    }

    // --- Posts ---------------------------------------------------------------

    async fn create_post(
        &self,
        author: UserId,
        content: &str,
        img: Option<&str>,
    ) -> Result<Post, StorageError> {
        let mut inner = self.inner.write().unwrap();
        inner.last_post_id += 1;
        let now = timestamp_now();
        let post = Post {
            id: inner.last_post_id,
            content: content.to_string(),
            img: img.map(str::to_string),
            user_id: author,
            created_at: now.clone(),
            updated_at: now,
        };
        inner.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, StorageError> {
        let inner = self.inner.read().unwrap();
        Ok(inner.posts.get(&id).cloned())
    }

    async fn update_post_content(&self, id: PostId, content: &str) -> Result<Post, StorageError> {
        let mut inner = self.inner.write().unwrap();
        let post = inner.posts.get_mut(&id).ok_or(StorageError::NotFound)?;
        post.content = content.to_string();
        post.updated_at = timestamp_now();
        Ok(post.clone())
    }

    async fn delete_post(&self, id: PostId) -> Result<(), StorageError> {
        let mut inner = self.inner.write().unwrap();
        inner.posts.remove(&id).ok_or(StorageError::NotFound)?;
        inner.post_hashtags.retain(|(post, _)| *post != id);
        Ok(())
    }

    async fn list_posts(&self) -> Result<Vec<TimelinePost>, StorageError> {
        let inner = self.inner.read().unwrap();
        Ok(inner.timeline(inner.posts.values()))
    }

    async fn list_posts_by_user(&self, author: UserId) -> Result<Vec<Post>, StorageError> {
        let inner = self.inner.read().unwrap();
        let mut posts: Vec<Post> = inner
            .posts
            .values()
            .filter(|p| p.user_id == author)
            .cloned()
            .collect();
        posts.sort_by(newest_first);
        Ok(posts)
    }

    // --- Hashtags ------------------------------------------------------------

    async fn find_or_create_hashtag(&self, title: &str) -> Result<Hashtag, StorageError> {
        let mut inner = self.inner.write().unwrap();
        if let Some(existing) = inner.hashtags.values().find(|h| h.title == title) {
            return Ok(existing.clone());
        }
        inner.last_hashtag_id += 1;
        let hashtag = Hashtag {
            id: inner.last_hashtag_id,
            title: title.to_string(),
            created_at: timestamp_now(),
        };
        inner.hashtags.insert(hashtag.id, hashtag.clone());
        Ok(hashtag)
    }

    async fn find_hashtag(&self, title: &str) -> Result<Option<Hashtag>, StorageError> {
        let inner = self.inner.read().unwrap();
        Ok(inner.hashtags.values().find(|h| h.title == title).cloned())
    }

    async fn tag_post(&self, post: PostId, hashtag: HashtagId) -> Result<(), StorageError> {
        let mut inner = self.inner.write().unwrap();
        inner.post_hashtags.insert((post, hashtag));
        Ok(())
    }

    async fn find_posts_by_hashtag(
        &self,
        hashtag: HashtagId,
    ) -> Result<Vec<TimelinePost>, StorageError> {
        let inner = self.inner.read().unwrap();
        let posts = inner
            .post_hashtags
            .iter()
            .filter(|(_, h)| *h == hashtag)
            .filter_map(|(p, _)| inner.posts.get(p));
        Ok(inner.timeline(posts))
    }

    // --- Sessions ------------------------------------------------------------

    async fn create_session(&self, session: &Session) -> Result<(), StorageError> {
        let mut inner = self.inner.write().unwrap();
        let now = devtalk::timestamp_now();
        inner.sessions.retain(|_, s| s.expires_at > now);
        if inner.sessions.contains_key(&session.token) {
            return Err(StorageError::Conflict("session token already exists".into()));
        }
        inner
            .sessions
            .insert(session.token.clone(), session.clone());
        Ok(())
    }

    async fn get_session(&self, token: &str) -> Result<Option<Session>, StorageError> {
        let inner = self.inner.read().unwrap();
        Ok(inner.sessions.get(token).cloned())
    }

    async fn delete_session(&self, token: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.write().unwrap();
        inner.sessions.remove(token);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
