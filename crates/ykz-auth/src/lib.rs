//! # ykz-auth
//!
//! Access layer for the YKZ control dashboard.
//!
//! This crate provides:
//! - Signed-cookie sessions backed by a pluggable store
//! - Discord OAuth login
//! - The authorization gate (owner bypass, 30-second verdict cache,
//!   remote admin check)
//! - The deployment-wide access policy (`SITE_PRIVATE` / `SITE_ADMIN_ONLY`)
//!
//! ## Modules
//!
//! - [`config`] - Access, session and Discord configuration sections
//! - [`error`] - Error types
//! - [`gate`] - Authorization gate and the [`AdminDirectory`] seam
//! - [`oauth`] - Discord OAuth client and callback URL normalization
//! - [`policy`] - Global access policy
//! - [`session`] - Session model, store and cookie middleware

pub mod config;
pub mod error;
pub mod gate;
pub mod oauth;
pub mod policy;
pub mod session;

pub use config::{AccessConfig, DEFAULT_SESSION_SECRET, DiscordConfig, SessionConfig};
pub use error::{AuthError, ErrorCategory};
pub use gate::{
    AdminDirectory, AuthorizationGate, DenyReason, FRESHNESS_WINDOW, GateDecision, GateStep,
};
pub use oauth::{DiscordOAuth, generate_state, normalize_callback_url, normalize_url};
pub use policy::{AccessPolicy, PathRule, Requirement};
pub use session::{
    CurrentIdentity, Identity, MemorySessionStore, Session, SessionHandle, SessionId,
    SessionManager, SessionStore, Verdict, session_layer,
};

/// Type alias for authentication/authorization results.
pub type AuthResult<T> = Result<T, AuthError>;
