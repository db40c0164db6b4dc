//! SQLite-backed storage implementation.
//!
//! Uses `rusqlite` (with bundled SQLite) wrapped in an `Arc<Mutex<Connection>>`
//! to satisfy the `Send + Sync` requirements. All blocking calls are offloaded
//! to a thread-pool via `tokio::task::spawn_blocking`.
//!
//! # Schema
//!
//! - `users` — local and OAuth accounts; partial unique indexes enforce
//!   email uniqueness for local accounts and (provider, sns_id) for the rest.
//! - `follows` — (follower_id, following_id) edges.
//! - `posts` — timeline posts.
//! - `hashtags` — unique lowercase titles.
//! - `post_hashtags` — (post_id, hashtag_id) links.
//! - `sessions` — login session tokens.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use devtalk::{
    timestamp_now, Hashtag, HashtagId, NewUser, Post, PostId, Provider, TimelinePost, User,
    UserId, UserSummary,
};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{Session, Storage, StorageError};

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    email       TEXT,
    nick        TEXT NOT NULL,
    password    TEXT,
    provider    TEXT NOT NULL DEFAULT 'local',
    sns_id      TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_users_local_email
    ON users(email) WHERE provider = 'local';
CREATE UNIQUE INDEX IF NOT EXISTS idx_users_sns
    ON users(provider, sns_id) WHERE provider <> 'local';

CREATE TABLE IF NOT EXISTS follows (
    follower_id   INTEGER NOT NULL,
    following_id  INTEGER NOT NULL,
    PRIMARY KEY (follower_id, following_id)
);
CREATE INDEX IF NOT EXISTS idx_follows_following ON follows(following_id);

CREATE TABLE IF NOT EXISTS posts (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL,
    content     TEXT NOT NULL,
    img         TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_posts_user       ON posts(user_id);
CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts(created_at);

CREATE TABLE IF NOT EXISTS hashtags (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS post_hashtags (
    post_id     INTEGER NOT NULL,
    hashtag_id  INTEGER NOT NULL,
    PRIMARY KEY (post_id, hashtag_id)
);
CREATE INDEX IF NOT EXISTS idx_post_hashtags_hashtag ON post_hashtags(hashtag_id);

CREATE TABLE IF NOT EXISTS sessions (
    token       TEXT PRIMARY KEY,
    user_id     INTEGER NOT NULL,
    expires_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_sessions_expires ON sessions(expires_at);
";

const USER_COLUMNS: &str = "id, email, nick, password, provider, sns_id, created_at, updated_at";
const POST_COLUMNS: &str = "id, content, img, user_id, created_at, updated_at";

/// Post columns prefixed for joins, followed by the author's nick.
const TIMELINE_SELECT: &str = "SELECT p.id, p.content, p.img, p.user_id, p.created_at, p.updated_at, u.nick
     FROM posts p JOIN users u ON u.id = p.user_id";

const NEWEST_FIRST: &str = "ORDER BY created_at DESC, id DESC";

// ---------------------------------------------------------------------------
// SqliteStorage
// ---------------------------------------------------------------------------

/// SQLite-backed implementation of [`Storage`].
///
/// Holds a single database connection protected by a `Mutex`. All operations
/// run inside `spawn_blocking` to avoid blocking the async runtime.
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    /// Open (or create) the SQLite database at `path` and apply the schema.
    pub fn open(path: &str) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database (data is lost when dropped).
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking thread-pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StorageError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap();
            f(&conn)
        })
        .await
        .map_err(|e| StorageError::Internal(format!("task join error: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// Error conversions and row mapping
// ---------------------------------------------------------------------------

fn map_err(e: rusqlite::Error) -> StorageError {
    match &e {
        rusqlite::Error::SqliteFailure(f, _)
            if f.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StorageError::Conflict(e.to_string())
        }
        _ => StorageError::Internal(e.to_string()),
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let provider: String = row.get(4)?;
    let provider: Provider = provider.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, e.into())
    })?;
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        nick: row.get(2)?,
        password: row.get(3)?,
        provider,
        sns_id: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        content: row.get(1)?,
        img: row.get(2)?,
        user_id: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn timeline_from_row(row: &Row<'_>) -> rusqlite::Result<TimelinePost> {
    let post = post_from_row(row)?;
    let user = UserSummary {
        id: post.user_id,
        nick: row.get(6)?,
    };
    Ok(TimelinePost { post, user })
}

fn hashtag_from_row(row: &Row<'_>) -> rusqlite::Result<Hashtag> {
    Ok(Hashtag {
        id: row.get(0)?,
        title: row.get(1)?,
        created_at: row.get(2)?,
    })
}

fn query_summaries(
    conn: &Connection,
    sql: &str,
    id: UserId,
) -> Result<Vec<UserSummary>, StorageError> {
    let mut stmt = conn.prepare(sql).map_err(map_err)?;
    let rows = stmt
        .query_map(params![id], |row| {
            Ok(UserSummary {
                id: row.get(0)?,
                nick: row.get(1)?,
            })
        })
        .map_err(map_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(map_err)?;
    Ok(rows)
}

fn get_post_sync(conn: &Connection, id: PostId) -> Result<Option<Post>, StorageError> {
    conn.query_row(
        &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"),
        params![id],
        post_from_row,
    )
    .optional()
    .map_err(map_err)
}

// ---------------------------------------------------------------------------
// Storage impl
// ---------------------------------------------------------------------------

#[async_trait]
impl Storage for SqliteStorage {
    // --- Users ---------------------------------------------------------------

    async fn create_user(&self, user: &NewUser) -> Result<User, StorageError> {
        let user = user.clone();

        self.with_conn(move |conn| {
            let now = timestamp_now();
            conn.execute(
                "INSERT INTO users (email, nick, password, provider, sns_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                params![
                    user.email,
                    user.nick,
                    user.password,
                    user.provider.as_str(),
                    user.sns_id,
                    now,
                ],
            )
            .map_err(map_err)?;

            Ok(User {
                id: conn.last_insert_rowid(),
                email: user.email,
                nick: user.nick,
                password: user.password,
                provider: user.provider,
                sns_id: user.sns_id,
                created_at: now.clone(),
                updated_at: now,
            })
        })
        .await
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        self.with_conn(move |conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                user_from_row,
            )
            .optional()
            .map_err(map_err)
        })
        .await
    }

    async fn find_local_user(&self, email: &str) -> Result<Option<User>, StorageError> {
        let email = email.to_string();

        self.with_conn(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {USER_COLUMNS} FROM users WHERE provider = 'local' AND email = ?1"
                ),
                params![email],
                user_from_row,
            )
            .optional()
            .map_err(map_err)
        })
        .await
    }

    async fn find_sns_user(
        &self,
        provider: Provider,
        sns_id: &str,
    ) -> Result<Option<User>, StorageError> {
        let sns_id = sns_id.to_string();

        self.with_conn(move |conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE provider = ?1 AND sns_id = ?2"),
                params![provider.as_str(), sns_id],
                user_from_row,
            )
            .optional()
            .map_err(map_err)
        })
        .await
    }

    // --- Follows -------------------------------------------------------------

    async fn add_follow(&self, follower: UserId, following: UserId) -> Result<(), StorageError> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO follows (follower_id, following_id) VALUES (?1, ?2)",
                params![follower, following],
            )
            .map_err(map_err)?;
            Ok(())
        })
        .await
    }

    async fn remove_follow(
        &self,
        follower: UserId,
        following: UserId,
    ) -> Result<(), StorageError> {
        self.with_conn(move |conn| {
            conn.execute(
                "DELETE FROM follows WHERE follower_id = ?1 AND following_id = ?2",
                params![follower, following],
            )
            .map_err(map_err)?;
            Ok(())
        })
        .await
    }

    async fn list_followers(&self, id: UserId) -> Result<Vec<UserSummary>, StorageError> {
        self.with_conn(move |conn| {
            query_summaries(
                conn,
                "SELECT u.id, u.nick FROM follows f JOIN users u ON u.id = f.follower_id
                 WHERE f.following_id = ?1 ORDER BY u.id ASC",
                id,
            )
        })
        .await
    }

    async fn list_followings(&self, id: UserId) -> Result<Vec<UserSummary>, StorageError> {
        self.with_conn(move |conn| {
            query_summaries(
                conn,
                "SELECT u.id, u.nick FROM follows f JOIN users u ON u.id = f.following_id
                 WHERE f.follower_id = ?1 ORDER BY u.id ASC",
                id,
            )
        })
        .await
    }

    // --- Posts ---------------------------------------------------------------

    async fn create_post(
        &self,
        author: UserId,
        content: &str,
        img: Option<&str>,
    ) -> Result<Post, StorageError> {
        let content = content.to_string();
        let img = img.map(str::to_string);

        self.with_conn(move |conn| {
            let now = timestamp_now();
            conn.execute(
                "INSERT INTO posts (user_id, content, img, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![author, content, img, now],
            )
            .map_err(map_err)?;

            Ok(Post {
                id: conn.last_insert_rowid(),
                content,
                img,
                user_id: author,
                created_at: now.clone(),
                updated_at: now,
            })
        })
        .await
    }

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, StorageError> {
        self.with_conn(move |conn| get_post_sync(conn, id)).await
    }

    async fn update_post_content(&self, id: PostId, content: &str) -> Result<Post, StorageError> {
        let content = content.to_string();

        self.with_conn(move |conn| {
            let changed = conn
                .execute(
                    "UPDATE posts SET content = ?1, updated_at = ?2 WHERE id = ?3",
                    params![content, timestamp_now(), id],
                )
                .map_err(map_err)?;
            if changed == 0 {
                return Err(StorageError::NotFound);
            }
            get_post_sync(conn, id)?.ok_or(StorageError::NotFound)
        })
        .await
    }

    async fn delete_post(&self, id: PostId) -> Result<(), StorageError> {
        self.with_conn(move |conn| {
            conn.execute("DELETE FROM post_hashtags WHERE post_id = ?1", params![id])
                .map_err(map_err)?;
            let deleted = conn
                .execute("DELETE FROM posts WHERE id = ?1", params![id])
                .map_err(map_err)?;
            if deleted == 0 {
                return Err(StorageError::NotFound);
            }
            Ok(())
        })
        .await
    }

    async fn list_posts(&self) -> Result<Vec<TimelinePost>, StorageError> {
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "{TIMELINE_SELECT} ORDER BY p.created_at DESC, p.id DESC"
                ))
                .map_err(map_err)?;
            let posts = stmt
                .query_map([], timeline_from_row)
                .map_err(map_err)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(map_err)?;
            Ok(posts)
        })
        .await
    }

    async fn list_posts_by_user(&self, author: UserId) -> Result<Vec<Post>, StorageError> {
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {POST_COLUMNS} FROM posts WHERE user_id = ?1 {NEWEST_FIRST}"
                ))
                .map_err(map_err)?;
            let posts = stmt
                .query_map(params![author], post_from_row)
                .map_err(map_err)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(map_err)?;
            Ok(posts)
        })
        .await
    }

    // --- Hashtags ------------------------------------------------------------

    async fn find_or_create_hashtag(&self, title: &str) -> Result<Hashtag, StorageError> {
        let title = title.to_string();

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO hashtags (title, created_at) VALUES (?1, ?2)",
                params![title, timestamp_now()],
            )
            .map_err(map_err)?;
            conn.query_row(
                "SELECT id, title, created_at FROM hashtags WHERE title = ?1",
                params![title],
                hashtag_from_row,
            )
            .map_err(map_err)
        })
        .await
    }

    async fn find_hashtag(&self, title: &str) -> Result<Option<Hashtag>, StorageError> {
        let title = title.to_string();

        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT id, title, created_at FROM hashtags WHERE title = ?1",
                params![title],
                hashtag_from_row,
            )
            .optional()
            .map_err(map_err)
        })
        .await
    }

    async fn tag_post(&self, post: PostId, hashtag: HashtagId) -> Result<(), StorageError> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO post_hashtags (post_id, hashtag_id) VALUES (?1, ?2)",
                params![post, hashtag],
            )
            .map_err(map_err)?;
            Ok(())
        })
        .await
    }

    async fn find_posts_by_hashtag(
        &self,
        hashtag: HashtagId,
    ) -> Result<Vec<TimelinePost>, StorageError> {
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "{TIMELINE_SELECT}
                     JOIN post_hashtags ph ON ph.post_id = p.id
                     WHERE ph.hashtag_id = ?1
                     ORDER BY p.created_at DESC, p.id DESC"
                ))
                .map_err(map_err)?;
            let posts = stmt
                .query_map(params![hashtag], timeline_from_row)
                .map_err(map_err)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(map_err)?;
            Ok(posts)
        })
        .await
    }

    // --- Sessions ------------------------------------------------------------

    async fn create_session(&self, session: &Session) -> Result<(), StorageError> {
        let session = session.clone();

        let now = devtalk::timestamp_now();

        self.with_conn(move |conn| {
            conn.execute("DELETE FROM sessions WHERE expires_at <= ?1", params![now])
                .map_err(map_err)?;
            conn.execute(
                "INSERT INTO sessions (token, user_id, expires_at) VALUES (?1, ?2, ?3)",
                params![session.token, session.user_id, session.expires_at],
            )
            .map_err(map_err)?;
            Ok(())
        })
        .await
    }

    async fn get_session(&self, token: &str) -> Result<Option<Session>, StorageError> {
        let token = token.to_string();

        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT token, user_id, expires_at FROM sessions WHERE token = ?1",
                params![token],
                |row| {
                    Ok(Session {
                        token: row.get(0)?,
                        user_id: row.get(1)?,
                        expires_at: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(map_err)
        })
        .await
    }

    async fn delete_session(&self, token: &str) -> Result<(), StorageError> {
        let token = token.to_string();

        self.with_conn(move |conn| {
            conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])
                .map_err(map_err)?;
            Ok(())
        })
        .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
