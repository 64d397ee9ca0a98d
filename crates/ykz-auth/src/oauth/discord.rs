//! Discord OAuth2 authorization-code flow.
//!
//! 1. [`DiscordOAuth::authorization_url`] builds the redirect for `/login`.
//! 2. [`DiscordOAuth::exchange_code`] trades the callback `code` for a token.
//! 3. [`DiscordOAuth::fetch_identity`] reads `/users/@me` with that token.
//!
//! [`DiscordOAuth::complete`] runs steps 2 and 3.

use serde::Deserialize;
use url::Url;

use crate::config::DiscordConfig;
use crate::error::AuthError;
use crate::session::Identity;

const PROVIDER: &str = "discord";

/// Token endpoint response. Only the access token is used.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Bearer token for the REST API.
    pub access_token: String,
    /// Token type, normally `Bearer`.
    #[serde(default)]
    pub token_type: Option<String>,
    /// Granted scopes, space separated.
    #[serde(default)]
    pub scope: Option<String>,
}

/// OAuth error body returned by the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthErrorResponse {
    /// Error code.
    pub error: String,
    /// Human-readable description.
    #[serde(default)]
    pub error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DiscordUser {
    id: String,
    username: String,
    #[serde(default)]
    discriminator: Option<String>,
    #[serde(default)]
    avatar: Option<String>,
}

impl From<DiscordUser> for Identity {
    fn from(user: DiscordUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            discriminator: user.discriminator.unwrap_or_else(|| "0".to_string()),
            avatar: user.avatar.filter(|a| !a.is_empty()),
        }
    }
}

/// Discord OAuth client bound to one callback URL.
#[derive(Debug, Clone)]
pub struct DiscordOAuth {
    config: DiscordConfig,
    callback_url: String,
    http_client: reqwest::Client,
}

impl DiscordOAuth {
    /// Creates a client for `config` that redirects back to `callback_url`.
    pub fn new(config: DiscordConfig, callback_url: impl Into<String>) -> Result<Self, AuthError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AuthError::configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            callback_url: callback_url.into(),
            http_client,
        })
    }

    /// Callback URL registered with the provider.
    #[must_use]
    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    /// Builds the provider authorization URL for `state`.
    pub fn authorization_url(&self, state: &str) -> Result<Url, AuthError> {
        let mut url = Url::parse(&self.config.authorize_url).map_err(|e| {
            AuthError::configuration(format!("invalid authorize_url: {e}"))
        })?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.callback_url)
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("state", state);
        Ok(url)
    }

    /// Exchanges an authorization code for an access token.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, AuthError> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.callback_url.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::identity_provider(PROVIDER, format!("token request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            if let Ok(oauth_error) = serde_json::from_str::<OAuthErrorResponse>(&body) {
                return Err(AuthError::identity_provider(
                    PROVIDER,
                    format!(
                        "{}: {}",
                        oauth_error.error,
                        oauth_error.error_description.unwrap_or_default()
                    ),
                ));
            }
            return Err(AuthError::identity_provider(
                PROVIDER,
                format!("token exchange failed: HTTP {status} - {body}"),
            ));
        }

        response.json().await.map_err(|e| {
            AuthError::identity_provider(PROVIDER, format!("failed to parse token response: {e}"))
        })
    }

    /// Fetches the profile of the token owner.
    pub async fn fetch_identity(&self, access_token: &str) -> Result<Identity, AuthError> {
        let endpoint = format!("{}/users/@me", self.config.api_base.trim_end_matches('/'));
        let response = self
            .http_client
            .get(&endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::identity_provider(PROVIDER, format!("profile request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AuthError::identity_provider(
                PROVIDER,
                format!("profile request failed: HTTP {}", response.status()),
            ));
        }

        let user: DiscordUser = response.json().await.map_err(|e| {
            AuthError::identity_provider(PROVIDER, format!("failed to parse profile: {e}"))
        })?;
        Ok(user.into())
    }

    /// Runs the code exchange and profile fetch.
    pub async fn complete(&self, code: &str) -> Result<Identity, AuthError> {
        let token = self.exchange_code(code).await?;
        let identity = self.fetch_identity(&token.access_token).await?;
        tracing::info!(user_id = %identity.id, username = %identity.username, "Discord login completed");
        Ok(identity)
    }
}
