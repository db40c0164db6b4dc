//! [`OAuthClient`] backed by the providers' real HTTP endpoints.

use std::time::Duration;

use async_trait::async_trait;
use devtalk::Provider;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;

use super::{OAuthClient, OAuthError, ProviderProfile};
use crate::config::ServerConfig;

struct Endpoints {
    authorize: &'static str,
    token: &'static str,
    profile: &'static str,
    scope: Option<&'static str>,
}

fn endpoints(provider: Provider) -> Option<Endpoints> {
    match provider {
        Provider::Kakao => Some(Endpoints {
            authorize: "https://kauth.kakao.com/oauth/authorize",
            token: "https://kauth.kakao.com/oauth/token",
            profile: "https://kapi.kakao.com/v2/user/me",
            scope: None,
        }),
        Provider::Naver => Some(Endpoints {
            authorize: "https://nid.naver.com/oauth2.0/authorize",
            token: "https://nid.naver.com/oauth2.0/token",
            profile: "https://openapi.naver.com/v1/nid/me",
            scope: None,
        }),
        Provider::Google => Some(Endpoints {
            authorize: "https://accounts.google.com/o/oauth2/v2/auth",
            token: "https://oauth2.googleapis.com/token",
            profile: "https://openidconnect.googleapis.com/v1/userinfo",
            scope: Some("openid profile email"),
        }),
        Provider::Local => None,
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Talks to Kakao, Naver and Google using the credentials in [`ServerConfig`].
pub struct HttpOAuthClient {
    config: ServerConfig,
    http: reqwest::Client,
}

impl HttpOAuthClient {
    pub fn new(config: ServerConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { config, http })
    }
}

#[async_trait]
impl OAuthClient for HttpOAuthClient {
    fn authorize_url(&self, provider: Provider, state: &str) -> Result<String, OAuthError> {
        let creds = self
            .config
            .credentials(provider)
            .ok_or(OAuthError::NotConfigured(provider))?;
        let ep = endpoints(provider).ok_or(OAuthError::NotConfigured(provider))?;

        let redirect_uri = self.config.callback_url(provider);
        let mut params = vec![
            ("response_type", "code"),
            ("client_id", creds.client_id.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("state", state),
        ];
        if let Some(scope) = ep.scope {
            params.push(("scope", scope));
        }
        let url = Url::parse_with_params(ep.authorize, &params)
            .map_err(|e| OAuthError::Http(e.to_string()))?;
        Ok(url.into())
    }

    async fn fetch_profile(
        &self,
        provider: Provider,
        code: &str,
        state: &str,
    ) -> Result<ProviderProfile, OAuthError> {
        let creds = self
            .config
            .credentials(provider)
            .ok_or(OAuthError::NotConfigured(provider))?;
        let ep = endpoints(provider).ok_or(OAuthError::NotConfigured(provider))?;

        let redirect_uri = self.config.callback_url(provider);
        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("client_id", creds.client_id.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
            ("code", code),
            ("state", state),
        ];
        if let Some(secret) = creds.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        let token: TokenResponse = self
            .http
            .post(ep.token)
            .form(&form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let raw: Value = self
            .http
            .get(ep.profile)
            .bearer_auth(&token.access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        tracing::debug!(%provider, "fetched oauth profile");
        ProviderProfile::from_json(provider, &raw)
    }
}
