//! Access-layer configuration.
//!
//! These sections are embedded in the server's `AppConfig` and deserialized
//! from TOML or environment variables.
//!
//! # Example (TOML)
//!
//! ```toml
//! [access]
//! private = true
//! admin_only = false
//! owner_id = "123456789012345678"
//!
//! [session]
//! secret = "a-long-random-string"
//! ttl = "7d"
//!
//! [discord]
//! client_id = "1234"
//! client_secret = "shh"
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Deployment-wide visibility policy and owner override.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AccessConfig {
    /// `SITE_PRIVATE`: every non-public path requires a bound identity.
    pub private: bool,

    /// `SITE_ADMIN_ONLY`: with `private`, every non-public path also
    /// requires a positive authorization verdict.
    pub admin_only: bool,

    /// Identity id that is always authorized, bypassing the remote check.
    pub owner_id: Option<String>,
}

impl AccessConfig {
    /// Returns the owner override id if one is configured and non-blank.
    #[must_use]
    pub fn owner(&self) -> Option<&str> {
        self.owner_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Session cookie and store settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Secret the cookie signing key is derived from.
    pub secret: String,

    /// Name of the session cookie.
    pub cookie_name: String,

    /// Mark the cookie `Secure` (HTTPS-only).
    pub secure_cookie: bool,

    /// Idle lifetime of a stored session.
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,

    /// How often expired sessions are swept from the store.
    #[serde(with = "humantime_serde")]
    pub cleanup_interval: Duration,
}

/// Secret used when nothing is configured. Startup warns about it.
pub const DEFAULT_SESSION_SECRET: &str = "change_me";

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SESSION_SECRET.to_string(),
            cookie_name: "ykz.sid".to_string(),
            secure_cookie: false,
            ttl: Duration::from_secs(7 * 24 * 3600),
            cleanup_interval: Duration::from_secs(600),
        }
    }
}

impl SessionConfig {
    /// Returns `true` when the built-in placeholder secret is in use.
    #[must_use]
    pub fn uses_default_secret(&self) -> bool {
        self.secret == DEFAULT_SESSION_SECRET
    }
}

/// Discord OAuth application settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// OAuth client id.
    pub client_id: String,

    /// OAuth client secret.
    pub client_secret: String,

    /// Explicit callback URL (`DISCORD_CALLBACK_URL`).
    pub callback_url: Option<String>,

    /// Legacy alias for the callback URL (`DISCORD_REDIRECT_URI`).
    pub redirect_uri: Option<String>,

    /// Scopes requested at login.
    pub scopes: Vec<String>,

    /// Provider authorization endpoint.
    pub authorize_url: String,

    /// Provider token endpoint.
    pub token_url: String,

    /// Base of the provider REST API (`/users/@me` is appended).
    pub api_base: String,

    /// Timeout for calls to the provider.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            callback_url: None,
            redirect_uri: None,
            scopes: vec!["identify".to_string()],
            authorize_url: "https://discord.com/oauth2/authorize".to_string(),
            token_url: "https://discord.com/api/oauth2/token".to_string(),
            api_base: "https://discord.com/api".to_string(),
            request_timeout: Duration::from_secs(15),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_ignores_blank_values() {
        let mut cfg = AccessConfig::default();
        assert_eq!(cfg.owner(), None);

        cfg.owner_id = Some("   ".into());
        assert_eq!(cfg.owner(), None);

        cfg.owner_id = Some(" 42 ".into());
        assert_eq!(cfg.owner(), Some("42"));
    }

    #[test]
    fn defaults_match_deployment_expectations() {
        let session = SessionConfig::default();
        assert!(session.uses_default_secret());
        assert_eq!(session.cookie_name, "ykz.sid");

        let discord = DiscordConfig::default();
        assert_eq!(discord.scopes, vec!["identify".to_string()]);

        let access = AccessConfig::default();
        assert!(!access.private);
        assert!(!access.admin_only);
    }
}
