//! Page-level error outcomes.
//!
//! Protected routes never fall through to framework error pages: every
//! failure maps to one of these variants.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use ykz_auth::{AuthError, ErrorCategory, Identity};

use crate::views::{Page, message_card, render_page};

/// A deliberate error outcome for an HTML route.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    /// No identity bound: redirect to the login entry point.
    #[error("login required")]
    LoginRequired,

    /// Identity bound but not authorized.
    #[error("access denied")]
    Forbidden { identity: Option<Identity> },

    /// The bot API could not be reached or answered with garbage.
    #[error("bot API error: {message}")]
    Upstream {
        identity: Option<Identity>,
        message: String,
    },

    /// Anything else.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl PageError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::LoginRequired => StatusCode::SEE_OTHER,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::Upstream { .. } | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AuthError> for PageError {
    fn from(err: AuthError) -> Self {
        match err.category() {
            ErrorCategory::Authentication => Self::LoginRequired,
            ErrorCategory::Authorization => Self::Forbidden { identity: None },
            ErrorCategory::Upstream => Self::Upstream {
                identity: None,
                message: err.to_string(),
            },
            _ => Self::Internal {
                message: err.to_string(),
            },
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            Self::LoginRequired => Redirect::to("/login").into_response(),
            Self::Forbidden { identity } => {
                let body = message_card("🚫 لا تملك صلاحية", "لازم تكون أدمن.");
                let html = render_page(Page::new("No Access", "").identity(identity.as_ref()), &body);
                (status, Html(html)).into_response()
            }
            Self::Upstream { identity, message } => {
                tracing::error!(error = %message, "Bot API failure on page route");
                let body = message_card("API Error", &message);
                let html = render_page(Page::new("Error", "").identity(identity.as_ref()), &body);
                (status, Html(html)).into_response()
            }
            Self::Internal { message } => {
                tracing::error!(error = %message, "Internal error on page route");
                let body = message_card("Server Error", &message);
                (status, Html(render_page(Page::new("Error", ""), &body))).into_response()
            }
        }
    }
}
