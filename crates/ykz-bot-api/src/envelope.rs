//! Uniform response envelope.
//!
//! Every bot API call resolves to an [`ApiResponse`]; callers branch on the
//! variant or on [`ApiResponse::is_ok`] and never see a transport fault.

use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::error::BotApiError;

/// Outcome of one bot API call.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// A JSON body came back. Whether the call *succeeded* is decided by
    /// [`is_success`] on `data`, not by the HTTP status.
    Success {
        /// HTTP status code.
        status: u16,
        /// Parsed body.
        data: Value,
    },
    /// A body came back but it was not JSON.
    Failure {
        /// HTTP status code.
        status: u16,
        /// Raw body text.
        raw: String,
    },
    /// No response (connect failure, timeout, broken read).
    TransportError {
        /// Description of the failure.
        message: String,
    },
}

/// The single success predicate shared by every caller.
///
/// A boolean `ok` field decides on its own. Only when `ok` is missing or
/// not a boolean does `status == "ok"` count as success.
#[must_use]
pub fn is_success(body: &Value) -> bool {
    match body.get("ok") {
        Some(Value::Bool(ok)) => *ok,
        _ => body.get("status").and_then(Value::as_str) == Some("ok"),
    }
}

impl ApiResponse {
    /// Builds the envelope from a status and the raw body text.
    #[must_use]
    pub fn from_body(status: u16, body: &str) -> Self {
        match serde_json::from_str(body) {
            Ok(data) => Self::Success { status, data },
            Err(_) => Self::Failure {
                status,
                raw: body.to_string(),
            },
        }
    }

    /// Returns `true` if the call succeeded according to [`is_success`].
    #[must_use]
    pub fn is_ok(&self) -> bool {
        match self {
            Self::Success { data, .. } => is_success(data),
            Self::Failure { .. } | Self::TransportError { .. } => false,
        }
    }

    /// Returns the parsed body, if any.
    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        match self {
            Self::Success { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Returns the HTTP status, if a response arrived.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Success { status, .. } | Self::Failure { status, .. } => Some(*status),
            Self::TransportError { .. } => None,
        }
    }

    /// Human-readable failure detail for status messages.
    ///
    /// This is the remote `error` field, the raw body, or the transport
    /// message. Empty details are treated as absent.
    #[must_use]
    pub fn diagnostic(&self) -> Option<String> {
        let detail = match self {
            Self::Success { data, .. } => match data.get("error") {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => return None,
                Some(other) => other.to_string(),
            },
            Self::Failure { raw, .. } => raw.clone(),
            Self::TransportError { message } => message.clone(),
        };
        (!detail.is_empty()).then_some(detail)
    }

    /// Renders the loosely-typed JSON envelope exposed by status routes.
    #[must_use]
    pub fn to_envelope(&self) -> Value {
        match self {
            Self::Success { data, .. } => data.clone(),
            Self::Failure { status, raw } => json!({ "ok": false, "status": status, "raw": raw }),
            Self::TransportError { message } => json!({ "ok": false, "error": message }),
        }
    }

    /// Decodes the parsed body into `T`.
    ///
    /// Non-JSON bodies and transport errors are errors; so is a body that
    /// does not match `T`.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, BotApiError> {
        match self {
            Self::Success { data, .. } => {
                serde_json::from_value(data).map_err(|e| BotApiError::Decode(e.to_string()))
            }
            Self::Failure { status, raw } => Err(BotApiError::NotJson { status, raw }),
            Self::TransportError { message } => Err(BotApiError::Transport(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicate_precedence() {
        assert!(is_success(&json!({ "ok": true })));
        assert!(is_success(&json!({ "status": "ok" })));
        assert!(is_success(&json!({ "ok": true, "status": "error" })));
        // A boolean `ok` outranks the status token.
        assert!(!is_success(&json!({ "ok": false, "status": "ok" })));
        // A non-boolean `ok` is ignored.
        assert!(is_success(&json!({ "ok": "yes", "status": "ok" })));
        assert!(!is_success(&json!({ "ok": 1 })));
        assert!(!is_success(&json!({})));
        assert!(!is_success(&json!([1, 2])));
        assert!(!is_success(&json!({ "status": "OK" })));
    }

    #[test]
    fn non_json_body_becomes_failure() {
        let resp = ApiResponse::from_body(502, "<h1>Bad Gateway</h1>");
        assert_eq!(
            resp,
            ApiResponse::Failure {
                status: 502,
                raw: "<h1>Bad Gateway</h1>".into()
            }
        );
        assert!(!resp.is_ok());
        assert_eq!(
            resp.to_envelope(),
            json!({ "ok": false, "status": 502, "raw": "<h1>Bad Gateway</h1>" })
        );
        assert_eq!(resp.diagnostic().as_deref(), Some("<h1>Bad Gateway</h1>"));
    }

    #[test]
    fn json_body_is_success_regardless_of_status() {
        let resp = ApiResponse::from_body(500, r#"{"ok":false,"error":"boom"}"#);
        assert!(matches!(resp, ApiResponse::Success { status: 500, .. }));
        assert!(!resp.is_ok());
        assert_eq!(resp.diagnostic().as_deref(), Some("boom"));
    }

    #[test]
    fn transport_error_envelope() {
        let resp = ApiResponse::TransportError {
            message: "connection refused".into(),
        };
        assert!(!resp.is_ok());
        assert_eq!(resp.status(), None);
        assert_eq!(
            resp.to_envelope(),
            json!({ "ok": false, "error": "connection refused" })
        );
    }

    #[test]
    fn diagnostic_absent_for_clean_success() {
        let resp = ApiResponse::from_body(200, r#"{"ok":true}"#);
        assert_eq!(resp.diagnostic(), None);
        let resp = ApiResponse::from_body(200, r#"{"ok":false,"error":{"code":7}}"#);
        assert_eq!(resp.diagnostic().as_deref(), Some(r#"{"code":7}"#));
    }

    #[test]
    fn decode_distinguishes_failures() {
        #[derive(Debug, serde::Deserialize)]
        struct Flag {
            #[allow(dead_code)]
            flag: bool,
        }

        assert!(ApiResponse::from_body(200, r#"{"flag":true}"#)
            .decode::<Flag>()
            .is_ok());
        assert!(matches!(
            ApiResponse::from_body(200, r#"{"other":1}"#).decode::<Flag>(),
            Err(BotApiError::Decode(_))
        ));
        assert!(matches!(
            ApiResponse::from_body(503, "down").decode::<Flag>(),
            Err(BotApiError::NotJson { status: 503, .. })
        ));
    }
}
