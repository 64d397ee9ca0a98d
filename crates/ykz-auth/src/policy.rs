//! Deployment-wide access policy.
//!
//! Two independent switches drive the policy: `private` forces a login for
//! every path outside the open list, `admin_only` (together with `private`)
//! additionally sends those paths through the authorization gate.

use crate::config::AccessConfig;

/// How a path entry is matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathRule {
    /// The request path must equal the entry.
    Exact(String),
    /// The request path must start with the entry.
    Prefix(String),
}

impl PathRule {
    /// Returns `true` if `path` matches this rule.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(p) => path == p,
            Self::Prefix(p) => path.starts_with(p.as_str()),
        }
    }
}

/// What the global policy demands for a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Pass through; route guards still apply.
    Open,
    /// A bound identity is required.
    Login,
    /// A bound identity and a positive gate verdict are required.
    Admin,
}

/// Paths that stay reachable in private mode so login and logout keep working.
pub fn default_open_paths() -> Vec<PathRule> {
    vec![
        PathRule::Exact("/".into()),
        PathRule::Exact("/check".into()),
        PathRule::Exact("/login".into()),
        PathRule::Exact("/auth/callback".into()),
        PathRule::Exact("/logout".into()),
    ]
}

/// Global access policy, built once at startup.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    private: bool,
    admin_only: bool,
    open_paths: Vec<PathRule>,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::new(false, false)
    }
}

impl AccessPolicy {
    /// Creates a policy with the default open paths.
    #[must_use]
    pub fn new(private: bool, admin_only: bool) -> Self {
        Self {
            private,
            admin_only,
            open_paths: default_open_paths(),
        }
    }

    /// Creates a policy from the access configuration.
    #[must_use]
    pub fn from_config(config: &AccessConfig) -> Self {
        Self::new(config.private, config.admin_only)
    }

    /// Adds an extra always-open path.
    #[must_use]
    pub fn with_open_path(mut self, rule: PathRule) -> Self {
        self.open_paths.push(rule);
        self
    }

    /// Returns `true` when private mode is on.
    #[must_use]
    pub fn is_private(&self) -> bool {
        self.private
    }

    /// Returns `true` if `path` is on the open list.
    #[must_use]
    pub fn is_open_path(&self, path: &str) -> bool {
        self.open_paths.iter().any(|rule| rule.matches(path))
    }

    /// Returns the requirement the global policy places on `path`.
    #[must_use]
    pub fn requirement(&self, path: &str) -> Requirement {
        if !self.private || self.is_open_path(path) {
            return Requirement::Open;
        }
        if self.admin_only {
            Requirement::Admin
        } else {
            Requirement::Login
        }
    }
}
