//! Identity provider integration.
//!
//! Only Discord's authorization-code flow is supported. The callback URL
//! handed to the provider must match the registered one byte for byte, so it
//! is normalized once at startup with [`normalize_callback_url`].

pub mod discord;

use rand::RngCore;

pub use discord::{DiscordOAuth, OAuthErrorResponse, TokenResponse};

/// Generates a random OAuth `state` value (16 bytes, hex encoded).
#[must_use]
pub fn generate_state() -> String {
    let mut buf = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

/// Trims whitespace and trailing slashes from a URL-ish value.
///
/// Returns `None` if nothing is left.
#[must_use]
pub fn normalize_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Resolves the OAuth callback URL.
///
/// The first non-blank of the explicit callback URL, the legacy redirect URI
/// alias, and `base_url + "/auth/callback"` wins.
#[must_use]
pub fn normalize_callback_url(
    callback_url: Option<&str>,
    redirect_uri: Option<&str>,
    base_url: Option<&str>,
) -> Option<String> {
    callback_url
        .and_then(normalize_url)
        .or_else(|| redirect_uri.and_then(normalize_url))
        .or_else(|| {
            base_url
                .and_then(normalize_url)
                .map(|base| format!("{base}/auth/callback"))
        })
}
