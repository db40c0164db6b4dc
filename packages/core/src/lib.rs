//! Domain layer for the DevTalk social network.
//!
//! This crate holds the records the server persists and renders, plus the
//! small amount of pure logic that sits in front of persistence: input
//! validation and hashtag extraction. It has no knowledge of HTTP or storage.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`types`] | Records: [`User`], [`Post`], [`Hashtag`], [`Provider`], summaries and views |
//! | [`validation`] | Post content and local signup checks via [`validate_content`] / [`validate_join`] |
//! | [`hashtag`] | `#tag` extraction from post content and search-query normalisation |
//!
//! # Quick start
//!
//! ```rust
//! use devtalk::{extract_hashtags, validate_content};
//!
//! let content = "hello #Rust #world #rust";
//! validate_content(content).expect("content should be valid");
//! assert_eq!(extract_hashtags(content), vec!["rust", "world"]);
//! ```

pub mod hashtag;
pub mod types;
pub mod validation;

pub use hashtag::{extract_hashtags, normalize_hashtag, MAX_HASHTAG_CHARS};
pub use types::{
    timestamp_now, Hashtag, HashtagId, NewUser, Post, PostId, Profile, Provider, TimelinePost,
    User, UserId, UserSummary,
};
pub use validation::{
    validate_content, validate_join, ValidationError, MAX_CONTENT_CHARS, MAX_NICK_CHARS,
    MIN_PASSWORD_CHARS,
};
