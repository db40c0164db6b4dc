//! Shared helpers for the DevTalk conformance test suite.
//!
//! Provides [`spawn_server`], which binds a `TcpListener` on an ephemeral
//! port, wires up an in-process server backed by `MemoryStorage`, and returns
//! both the local URL and the underlying storage so tests can seed data
//! without going through the HTTP layer.
//!
//! OAuth providers are replaced by [`FakeProvider`], which never leaves the
//! process: its consent URL points at a fake host and the code `"granted"` is
//! exchanged for a fixed profile.

use std::sync::Arc;

use async_trait::async_trait;
use devtalk::Provider;
use devtalk_server::{
    build_router,
    config::{ProviderCredentials, ServerConfig},
    oauth::{OAuthClient, OAuthError, ProviderProfile},
    MemoryStorage, Storage,
};

/// The code [`FakeProvider`] accepts.
pub const GRANTED_CODE: &str = "granted";

/// Profile returned for [`GRANTED_CODE`].
pub const FAKE_SNS_ID: &str = "kakao-1001";
pub const FAKE_NICK: &str = "카카오손님";

/// In-process stand-in for the Kakao consent and token endpoints.
///
/// Only Kakao is configured; Naver and Google report `NotConfigured`.
pub struct FakeProvider;

#[async_trait]
impl OAuthClient for FakeProvider {
    fn authorize_url(&self, provider: Provider, state: &str) -> Result<String, OAuthError> {
        match provider {
            Provider::Kakao => Ok(format!(
                "https://kauth.invalid/oauth/authorize?client_id=conformance&state={state}"
            )),
            other => Err(OAuthError::NotConfigured(other)),
        }
    }

    async fn fetch_profile(
        &self,
        provider: Provider,
        code: &str,
        _state: &str,
    ) -> Result<ProviderProfile, OAuthError> {
        if provider != Provider::Kakao {
            return Err(OAuthError::NotConfigured(provider));
        }
        if code != GRANTED_CODE {
            return Err(OAuthError::Http(format!("invalid code {code}")));
        }
        Ok(ProviderProfile {
            sns_id: FAKE_SNS_ID.into(),
            display_name: FAKE_NICK.into(),
            email: None,
        })
    }
}

/// Start an ephemeral in-process server and return `(base_url, storage)`.
///
/// The server runs in a background `tokio` task bound to an OS-assigned port
/// on `127.0.0.1`, e.g. `http://127.0.0.1:51234`. Uploaded images go to a
/// fresh directory under the system temp dir.
///
/// # Panics
///
/// Panics if the TCP listener cannot be bound or the server fails to start.
pub async fn spawn_server() -> (String, Arc<MemoryStorage>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("get local addr");
    let base_url = format!("http://{addr}");

    let upload_dir = std::env::temp_dir().join(format!(
        "devtalk-conformance-{}",
        hex::encode(rand::random::<[u8; 8]>())
    ));
    std::fs::create_dir_all(&upload_dir).expect("create upload dir");

    let mem_storage = Arc::new(MemoryStorage::new());
    let storage: Arc<dyn Storage> = Arc::clone(&mem_storage) as Arc<dyn Storage>;

    let config = ServerConfig {
        bind_addr: addr,
        public_url: base_url.clone(),
        db_path: None,
        upload_dir,
        session_ttl_hours: 1,
        secure_cookies: false,
        kakao: Some(ProviderCredentials {
            client_id: "conformance".into(),
            client_secret: None,
        }),
        naver: None,
        google: None,
    };
    let router = build_router(storage, config, Arc::new(FakeProvider)).expect("templates compile");

    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("conformance server error");
    });

    (base_url, mem_storage)
}

/// A browser-like client: keeps cookies, never follows redirects.
///
/// Redirects are left unfollowed so tests can assert on `Location`.
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .expect("build reqwest client")
}
