//! OAuth 2.0 authorization-code client for the identity provider.
//!
//! Only the pieces the relay needs: build the consent URL, exchange the
//! callback code for tokens, and fetch the userinfo profile. Token refresh is
//! not needed because trust is anchored at login and cached in the session.

use serde::Deserialize;
use url::Url;
use uuid::Uuid;

use crate::config::Config;

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("invalid provider URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("token exchange failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider response missing {0}")]
    MissingField(&'static str),
}

/// Profile fields returned by the provider's userinfo endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// Provider endpoints plus client credentials.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
}

impl OAuthConfig {
    /// Google OpenID Connect endpoints with credentials from the app config.
    pub fn google(config: &Config) -> Self {
        Self {
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_url: "https://openidconnect.googleapis.com/v1/userinfo".to_string(),
            redirect_uri: config.oauth_redirect_uri.clone(),
            scopes: vec![
                "openid".to_string(),
                "email".to_string(),
                "profile".to_string(),
            ],
        }
    }
}

/// Manages the OAuth 2.0 authorization code flow against a single provider.
pub struct OAuthClient {
    config: OAuthConfig,
    client: reqwest::Client,
}

impl OAuthClient {
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.config.client_id.is_empty() && !self.config.client_secret.is_empty()
    }

    /// Random nonce tying the consent redirect to the callback request.
    pub fn generate_state() -> String {
        Uuid::new_v4().simple().to_string()
    }

    /// Build the consent-screen URL the browser is redirected to.
    pub fn authorize_url(&self, state: &str) -> Result<String, OAuthError> {
        let mut url = Url::parse(&self.config.auth_url)?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("state", state);
        Ok(url.to_string())
    }

    /// Exchange an authorization code for an access token, then fetch the
    /// userinfo profile with it.
    pub async fn exchange(&self, code: &str) -> Result<UserInfo, OAuthError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let token = self
            .client
            .post(&self.config.token_url)
            .form(&form)
            .send()
            .await?
            .error_for_status()?
            .json::<TokenResponse>()
            .await?;

        let access_token = token
            .access_token
            .ok_or(OAuthError::MissingField("access_token"))?;

        let userinfo = self
            .client
            .get(&self.config.userinfo_url)
            .bearer_auth(&access_token)
            .send()
            .await?
            .error_for_status()?
            .json::<UserInfo>()
            .await?;

        if userinfo.sub.is_empty() {
            return Err(OAuthError::MissingField("sub"));
        }

        Ok(userinfo)
    }
}
