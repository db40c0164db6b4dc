//! Assembles the Axum [`Router`] from all handler modules.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    config::ServerConfig,
    handlers::{auth, docs, page, post as posts, user, AppState},
    middleware::error_page::render_error_page,
    oauth::OAuthClient,
    render::Templates,
    storage::Storage,
    upload::{MAX_UPLOAD_BYTES, PUBLIC_PREFIX},
};

/// Room for the multipart envelope around a maximum-size image.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the complete application router with shared state.
///
/// Fails only if the embedded templates do not compile.
pub fn build_router(
    storage: Arc<dyn Storage>,
    config: ServerConfig,
    oauth: Arc<dyn OAuthClient>,
) -> Result<Router, tera::Error> {
    let state = AppState {
        storage,
        config,
        templates: Arc::new(Templates::new()?),
        oauth,
    };
    Ok(app(state))
}

/// The router for an already-assembled [`AppState`].
pub fn app(state: AppState) -> Router {
    let uploads = ServeDir::new(&state.config.upload_dir);

    Router::new()
        // Pages
        .route("/", get(page::render_main))
        .route("/profile", get(page::render_profile))
        .route("/join", get(page::render_join))
        .route("/hashtag", get(page::render_hashtag))
        // Auth
        .route("/auth/join", post(auth::join))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout).get(auth::logout))
        .route("/auth/{provider}", get(auth::oauth_start))
        .route("/auth/{provider}/callback", get(auth::oauth_callback))
        // Posts
        .route(
            "/post/img",
            post(posts::upload_image)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD)),
        )
        .route("/post", post(posts::create_post))
        .route(
            "/post/{id}",
            put(posts::update_post).delete(posts::delete_post),
        )
        // Follows
        .route("/user/{id}/follow", post(user::follow))
        .route("/user/{id}/following", delete(user::unfollow))
        .route("/user/{id}/follower", delete(user::remove_follower))
        // Docs
        .route("/api-docs/openapi.json", get(docs::openapi_json))
        // Uploaded images
        .nest_service(PUBLIC_PREFIX, uploads)
        .fallback(page::not_found)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            render_error_page,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
