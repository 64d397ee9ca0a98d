//! Bot API error types.
//!
//! Most calls never fail: they return an [`ApiResponse`](crate::ApiResponse)
//! envelope instead. Errors only arise where a caller needs a typed value
//! out of a response (for example the admin check) or when the client
//! itself cannot be built.

use thiserror::Error;

/// Errors raised while building the client or decoding a typed response.
#[derive(Debug, Error)]
pub enum BotApiError {
    /// The client configuration is invalid.
    #[error("Invalid bot API configuration: {0}")]
    InvalidConfig(String),

    /// The request never produced a response (connect, timeout, read).
    #[error("Bot API unreachable: {0}")]
    Transport(String),

    /// The response body was not JSON.
    #[error("Bot API returned a non-JSON body (HTTP {status}): {raw}")]
    NotJson {
        /// HTTP status of the response.
        status: u16,
        /// Raw body text.
        raw: String,
    },

    /// The body was JSON but did not have the expected shape.
    #[error("Unexpected bot API response: {0}")]
    Decode(String),
}

impl BotApiError {
    /// Returns `true` if the bot API could not be reached at all.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Result alias for typed bot API calls.
pub type BotApiResult<T> = Result<T, BotApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_details() {
        let err = BotApiError::NotJson {
            status: 502,
            raw: "Bad Gateway".into(),
        };
        assert_eq!(
            err.to_string(),
            "Bot API returned a non-JSON body (HTTP 502): Bad Gateway"
        );
        assert!(BotApiError::Transport("timed out".into()).is_transport());
        assert!(!BotApiError::Decode("missing is_admin".into()).is_transport());
    }
}
