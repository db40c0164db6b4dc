//! Turns page failures into the rendered `error.html` view.
//!
//! Page handlers return [`PageError`](crate::error::PageError), which leaves a
//! [`PageFailure`] marker in the response extensions. This middleware looks
//! for the marker on the way out and swaps the body for the error view,
//! keeping the status code. JSON responses never carry the marker and pass
//! through untouched.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{Html, IntoResponse, Response},
};

use crate::{error::PageFailure, handlers::AppState};

pub async fn render_error_page(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let Some(failure) = response.extensions_mut().remove::<PageFailure>() else {
        return response;
    };

    match state.templates.render_error(failure.status, &failure.message) {
        Ok(html) => (failure.status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to render error page");
            (failure.status, failure.message).into_response()
        }
    }
}
