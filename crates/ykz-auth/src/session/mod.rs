//! Per-browser session state.
//!
//! A [`Session`] is the only mutable state the dashboard owns. It is keyed by
//! an opaque [`SessionId`] carried in a signed cookie and holds the operator
//! identity plus the cached authorization [`Verdict`].

pub mod manager;
pub mod store;

use std::fmt;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub use manager::{CurrentIdentity, SessionHandle, SessionManager, session_layer};
pub use store::{MemorySessionStore, SessionStore};

/// Opaque session identifier (32 random bytes, hex encoded).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    const BYTES: usize = 32;

    /// Generates a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        let mut buf = [0u8; Self::BYTES];
        rand::thread_rng().fill_bytes(&mut buf);
        Self(hex::encode(buf))
    }

    /// Parses an identifier taken from a cookie. Anything that is not
    /// exactly 64 lowercase hex characters is rejected.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let well_formed = raw.len() == Self::BYTES * 2
            && raw
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        well_formed.then(|| Self(raw.to_string()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Only a prefix ends up in logs.
        write!(f, "{}…", &self.0[..8.min(self.0.len())])
    }
}

/// Authenticated operator profile captured from the identity provider.
///
/// Immutable for the lifetime of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable external id (Discord snowflake).
    pub id: String,
    /// Display name.
    pub username: String,
    /// Legacy discriminator (`"0"` for migrated accounts).
    pub discriminator: String,
    /// Avatar hash, if the user has one.
    pub avatar: Option<String>,
}

impl Identity {
    /// `username#discriminator` as shown in the top bar.
    #[must_use]
    pub fn tag(&self) -> String {
        format!("{}#{}", self.username, self.discriminator)
    }

    /// CDN URL of the avatar image, if the user has one.
    #[must_use]
    pub fn avatar_url(&self) -> Option<String> {
        self.avatar.as_ref().map(|hash| {
            format!(
                "https://cdn.discordapp.com/avatars/{}/{}.png?size=64",
                urlencode(&self.id),
                urlencode(hash)
            )
        })
    }
}

fn urlencode(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

/// Cached authorization decision and when it was computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether the identity was authorized.
    pub is_admin: bool,
    /// When the decision was made.
    #[serde(with = "time::serde::rfc3339")]
    pub checked_at: OffsetDateTime,
}

/// Server-side session record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bound operator identity, if logged in.
    pub identity: Option<Identity>,
    /// Cached authorization verdict.
    pub verdict: Option<Verdict>,
    /// Pending OAuth `state` for the login in flight.
    pub oauth_state: Option<String>,
    /// When the record was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(OffsetDateTime::now_utc())
    }
}

impl Session {
    /// Creates an empty session.
    #[must_use]
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            identity: None,
            verdict: None,
            oauth_state: None,
            created_at: now,
        }
    }

    /// Creates a session bound to `identity` with no cached verdict.
    #[must_use]
    pub fn authenticated(identity: Identity, now: OffsetDateTime) -> Self {
        Self {
            identity: Some(identity),
            ..Self::new(now)
        }
    }

    /// Returns the id of the bound identity.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.id.as_str())
    }

    /// Returns `true` if an identity is bound.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Records a verdict. The stored timestamp never moves backwards.
    pub fn record_verdict(&mut self, is_admin: bool, now: OffsetDateTime) {
        let checked_at = match self.verdict {
            Some(prev) if prev.checked_at > now => prev.checked_at,
            _ => now,
        };
        self.verdict = Some(Verdict {
            is_admin,
            checked_at,
        });
    }

    /// Removes and returns the pending OAuth state. Single use.
    pub fn take_oauth_state(&mut self) -> Option<String> {
        self.oauth_state.take()
    }
}
