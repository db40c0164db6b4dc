//! HTTP request handlers for all DevTalk endpoints.
//!
//! Each submodule covers one group of routes. Handlers are async functions
//! that receive Axum extractors and return either a rendered page
//! (`Result<_, PageError>`), a redirect, or JSON (`Result<_, AppError>`).
//!
//! Ownership checks (only the author may edit or delete a post) live here,
//! not in storage.

pub mod auth;
pub mod docs;
pub mod page;
pub mod post;
pub mod user;

use std::sync::Arc;

use crate::{config::ServerConfig, oauth::OAuthClient, render::Templates, storage::Storage};

/// Shared application state threaded through all Axum handlers via [`axum::extract::State`].
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub config: ServerConfig,
    pub templates: Arc<Templates>,
    pub oauth: Arc<dyn OAuthClient>,
}
