//! Query strings accepted by the rendered pages.

use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

/// Query for `GET /hashtag`. A missing or blank `hashtag` redirects to `/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HashtagQuery {
    /// Tag to search for, with or without the leading `#`.
    pub hashtag: Option<String>,
}

/// Notices passed back to the main page by failed logins and redirects.
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct NoticeQuery {
    pub error: Option<String>,
    pub login_error: Option<String>,
}
