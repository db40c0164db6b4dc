//! Request and response types for the DevTalk HTTP API.
//!
//! Handlers in `devtalk-server` accept and return these types; the OpenAPI
//! document is generated from the same derivations, so the documented
//! schemas cannot drift from what the server actually parses.
//!
//! # Endpoints covered
//!
//! | Method | Path | Type |
//! |--------|------|------|
//! | GET | `/hashtag` | [`HashtagQuery`] → HTML |
//! | POST | `/auth/join` | [`JoinForm`] → `302` |
//! | POST | `/auth/login` | [`LoginForm`] → `302` |
//! | GET | `/auth/{provider}/callback` | [`OAuthCallbackQuery`] → `302` |
//! | POST | `/post/img` | multipart `img` → [`UploadResponse`] |
//! | POST | `/post` | [`CreatePostForm`] → `302` |
//! | PUT | `/post/{id}` | [`UpdatePostRequest`] → [`UpdatePostResponse`] |
//! | DELETE | `/post/{id}` | → [`MessageResponse`] |
//! | POST | `/user/{id}/follow` | → `200 success` |
//! | DELETE | `/user/{id}/following` | → [`MessageResponse`] |
//! | DELETE | `/user/{id}/follower` | → [`MessageResponse`] |
//!
//! Every JSON error body is a [`MessageResponse`].

pub mod auth;
pub mod message;
pub mod page;
pub mod post;

pub use auth::{JoinForm, LoginForm, OAuthCallbackQuery};
pub use message::{messages, MessageResponse};
pub use page::{HashtagQuery, NoticeQuery};
pub use post::{
    CreatePostForm, ImageUploadForm, UpdatePostRequest, UpdatePostResponse, UploadResponse,
};
