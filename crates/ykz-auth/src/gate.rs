//! Authorization gate.
//!
//! Decides whether the identity bound to a session may reach a protected
//! resource. Evaluation order:
//!
//! 1. no identity → [`GateDecision::Deny`] with [`DenyReason::Unauthenticated`]
//! 2. identity is the configured owner → allow, no remote call
//! 3. cached verdict younger than [`FRESHNESS_WINDOW`] → reuse it
//! 4. otherwise ask the [`AdminDirectory`] once and cache the answer
//!
//! A directory failure is an error, never a denial.
//!
//! The gate is split into [`AuthorizationGate::precheck`] and
//! [`AuthorizationGate::record_remote`] so it can be driven without any I/O;
//! [`AuthorizationGate::authorize`] combines both around a directory call.

use async_trait::async_trait;
use time::{Duration, OffsetDateTime};

use crate::config::AccessConfig;
use crate::error::AuthError;
use crate::session::Session;

/// How long a cached verdict is trusted.
pub const FRESHNESS_WINDOW: Duration = Duration::seconds(30);

/// Remote source of truth for the admin list.
#[async_trait]
pub trait AdminDirectory: Send + Sync {
    /// Returns whether `user_id` is an administrator.
    ///
    /// Transport and parse failures must surface as
    /// [`AuthError::DirectoryUnavailable`].
    async fn is_admin(&self, user_id: &str) -> Result<bool, AuthError>;
}

/// Why access was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No identity bound; callers redirect to the login entry point.
    Unauthenticated,
    /// Identity bound but not an administrator.
    Forbidden,
}

/// Outcome of a gate evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// The request may proceed.
    Allow,
    /// The request is refused.
    Deny(DenyReason),
}

impl GateDecision {
    fn from_verdict(is_admin: bool) -> Self {
        if is_admin {
            Self::Allow
        } else {
            Self::Deny(DenyReason::Forbidden)
        }
    }

    /// Returns `true` for [`GateDecision::Allow`].
    #[must_use]
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Result of the I/O-free part of the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateStep {
    /// The gate reached a decision without the directory.
    Decided(GateDecision),
    /// The directory must be asked about this user id.
    RemoteCheck {
        /// Id of the bound identity.
        user_id: String,
    },
}

/// Session-gated role authorization with owner bypass and a short-lived cache.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationGate {
    owner_id: Option<String>,
}

impl AuthorizationGate {
    /// Creates a gate with an optional owner override id.
    #[must_use]
    pub fn new(owner_id: Option<String>) -> Self {
        Self {
            owner_id: owner_id.filter(|id| !id.trim().is_empty()),
        }
    }

    /// Creates a gate from the access configuration.
    #[must_use]
    pub fn from_config(config: &AccessConfig) -> Self {
        Self::new(config.owner().map(str::to_string))
    }

    /// Returns the configured owner override id.
    #[must_use]
    pub fn owner_id(&self) -> Option<&str> {
        self.owner_id.as_deref()
    }

    /// Evaluates everything that does not need the directory.
    ///
    /// The owner branch records a positive verdict in `session`.
    pub fn precheck(&self, session: &mut Session, now: OffsetDateTime) -> GateStep {
        let Some(user_id) = session.user_id().map(str::to_string) else {
            return GateStep::Decided(GateDecision::Deny(DenyReason::Unauthenticated));
        };

        if self.owner_id.as_deref() == Some(user_id.as_str()) {
            session.record_verdict(true, now);
            return GateStep::Decided(GateDecision::Allow);
        }

        if let Some(verdict) = session.verdict
            && now - verdict.checked_at < FRESHNESS_WINDOW
        {
            return GateStep::Decided(GateDecision::from_verdict(verdict.is_admin));
        }

        GateStep::RemoteCheck { user_id }
    }

    /// Stores a directory answer in `session` and turns it into a decision.
    pub fn record_remote(
        &self,
        session: &mut Session,
        is_admin: bool,
        now: OffsetDateTime,
    ) -> GateDecision {
        session.record_verdict(is_admin, now);
        GateDecision::from_verdict(is_admin)
    }

    /// Runs the full gate, consulting `directory` only when required.
    ///
    /// On error the session is left untouched.
    pub async fn authorize<D>(
        &self,
        session: &mut Session,
        directory: &D,
        now: OffsetDateTime,
    ) -> Result<GateDecision, AuthError>
    where
        D: AdminDirectory + ?Sized,
    {
        match self.precheck(session, now) {
            GateStep::Decided(decision) => Ok(decision),
            GateStep::RemoteCheck { user_id } => {
                let is_admin = directory.is_admin(&user_id).await.map_err(|e| {
                    tracing::warn!(user_id = %user_id, error = %e, "Admin check failed");
                    e
                })?;
                tracing::debug!(user_id = %user_id, is_admin, "Admin verdict refreshed");
                Ok(self.record_remote(session, is_admin, now))
            }
        }
    }
}
