//! Image uploads for posts.
//!
//! Files land in [`ServerConfig::upload_dir`](crate::config::ServerConfig)
//! under `{stem}{unix_millis}{ext}` and are served back from `/img/`.

use std::path::Path;

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// URL prefix uploaded files are served under.
pub const PUBLIC_PREFIX: &str = "/img";

/// Build the stored filename for an upload named `original`.
///
/// Only the final path component of `original` is used, so a client-supplied
/// name can never escape the upload directory.
pub fn upload_filename(original: &str, millis: i64) -> String {
    let name = Path::new(original)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.starts_with('.'))
        .unwrap_or("upload");
    let path = Path::new(name);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("upload");
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}{millis}.{ext}"),
        None => format!("{stem}{millis}"),
    }
}

/// Write `bytes` into `dir` and return the public reference (`/img/{file}`).
pub async fn save_upload(dir: &Path, original: &str, bytes: &[u8]) -> std::io::Result<String> {
    let filename = upload_filename(original, chrono::Utc::now().timestamp_millis());
    tokio::fs::write(dir.join(&filename), bytes).await?;
    tracing::debug!(%filename, size = bytes.len(), "stored upload");
    Ok(format!("{PUBLIC_PREFIX}/{filename}"))
}
