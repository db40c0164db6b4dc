//! Server configuration, populated from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

use devtalk::Provider;

/// Client id/secret pair registered with an OAuth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCredentials {
    pub client_id: String,
    /// Kakao apps may run without a secret; the others require one.
    pub client_secret: Option<String>,
}

/// Runtime configuration for a DevTalk server.
///
/// All fields are populated from environment variables with sensible
/// defaults, so a server can be started with zero configuration. OAuth
/// providers without a client id are simply not offered.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `DEVTALK_BIND` | `0.0.0.0:8001` | TCP socket address to listen on |
/// | `DEVTALK_PUBLIC_URL` | `http://localhost:8001` | External base URL, used for OAuth redirect URIs |
/// | `DEVTALK_DB` | (absent = in-memory) | Path to the SQLite database file |
/// | `DEVTALK_UPLOAD_DIR` | `uploads` | Directory uploaded images are written to and served from |
/// | `DEVTALK_SESSION_TTL_HOURS` | `24` | Lifetime of a login session |
/// | `DEVTALK_SECURE_COOKIES` | `false` | Set the `Secure` attribute on cookies |
/// | `KAKAO_ID` / `KAKAO_SECRET` | (absent) | Kakao OAuth credentials |
/// | `NAVER_CLIENT_ID` / `NAVER_CLIENT_SECRET` | (absent) | Naver OAuth credentials |
/// | `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET` | (absent) | Google OAuth credentials |
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address the server binds to.
    pub bind_addr: SocketAddr,

    /// Base URL the browser reaches the server at, without a trailing slash.
    pub public_url: String,

    /// Path to the SQLite database file.
    /// `None` means use an in-memory store (data is lost on restart).
    pub db_path: Option<String>,

    pub upload_dir: PathBuf,

    pub session_ttl_hours: i64,

    pub secure_cookies: bool,

    pub kakao: Option<ProviderCredentials>,
    pub naver: Option<ProviderCredentials>,
    pub google: Option<ProviderCredentials>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8001)),
            public_url: "http://localhost:8001".into(),
            db_path: None,
            upload_dir: PathBuf::from("uploads"),
            session_ttl_hours: 24,
            secure_cookies: false,
            kakao: None,
            naver: None,
            google: None,
        }
    }
}

impl ServerConfig {
    /// Populate config from environment variables, applying defaults where absent.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_addr: SocketAddr = std::env::var("DEVTALK_BIND")
            .map(|v| {
                v.parse()
                    .expect("DEVTALK_BIND must be a valid socket address (e.g. 0.0.0.0:8001)")
            })
            .unwrap_or(defaults.bind_addr);

        let public_url = std::env::var("DEVTALK_PUBLIC_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or(defaults.public_url);

        let session_ttl_hours = std::env::var("DEVTALK_SESSION_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|h| *h > 0)
            .unwrap_or(defaults.session_ttl_hours);

        let secure_cookies = std::env::var("DEVTALK_SECURE_COOKIES")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            bind_addr,
            public_url,
            db_path: std::env::var("DEVTALK_DB").ok(),
            upload_dir: std::env::var("DEVTALK_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            session_ttl_hours,
            secure_cookies,
            kakao: credentials_from_env("KAKAO_ID", "KAKAO_SECRET"),
            naver: credentials_from_env("NAVER_CLIENT_ID", "NAVER_CLIENT_SECRET"),
            google: credentials_from_env("GOOGLE_CLIENT_ID", "GOOGLE_CLIENT_SECRET"),
        }
    }

    /// Credentials for an OAuth provider, or `None` if it is not configured.
    pub fn credentials(&self, provider: Provider) -> Option<&ProviderCredentials> {
        match provider {
            Provider::Kakao => self.kakao.as_ref(),
            Provider::Naver => self.naver.as_ref(),
            Provider::Google => self.google.as_ref(),
            Provider::Local => None,
        }
    }

    /// The redirect URI registered with `provider`.
    pub fn callback_url(&self, provider: Provider) -> String {
        format!("{}/auth/{provider}/callback", self.public_url)
    }
}

fn credentials_from_env(id_var: &str, secret_var: &str) -> Option<ProviderCredentials> {
    let client_id = std::env::var(id_var).ok().filter(|v| !v.is_empty())?;
    Some(ProviderCredentials {
        client_id,
        client_secret: std::env::var(secret_var).ok().filter(|v| !v.is_empty()),
    })
}
