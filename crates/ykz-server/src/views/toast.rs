//! One-shot status messages carried in the redirect URL.
//!
//! An action redirects to `<page>?toast=<message>&type=ok|err`. The page
//! renders the message once and the layout script strips both parameters
//! from the address bar, so a refresh does not replay it.

use axum::response::Redirect;
use serde::Deserialize;
use ykz_bot_api::ApiResponse;

/// Longest message placed in a redirect URL, in characters.
pub const MAX_TOAST_CHARS: usize = 400;

/// Toast classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Ok,
    Err,
}

impl ToastKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Err => "err",
        }
    }
}

/// A status message to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
}

/// `toast` and `type` query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToastQuery {
    #[serde(default)]
    pub toast: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl ToastQuery {
    /// Returns the toast to render, if any. Unknown types render as errors.
    #[must_use]
    pub fn toast(&self) -> Option<Toast> {
        let message = self.toast.as_deref().filter(|m| !m.trim().is_empty())?;
        let kind = match self.kind.as_deref() {
            Some("ok") => ToastKind::Ok,
            _ => ToastKind::Err,
        };
        Some(Toast {
            message: truncate(message),
            kind,
        })
    }
}

fn truncate(message: &str) -> String {
    message.chars().take(MAX_TOAST_CHARS).collect()
}

/// Builds `path` with the toast parameters appended.
#[must_use]
pub fn toast_location(path: &str, kind: ToastKind, message: &str) -> String {
    let sep = if path.contains('?') { '&' } else { '?' };
    format!(
        "{path}{sep}toast={}&type={}",
        urlencoding::encode(&truncate(message)),
        kind.as_str()
    )
}

/// Redirects to `path` with a toast describing `response`.
///
/// Success shows `ok_msg`; failure shows `err_msg` followed by the remote
/// diagnostic, if there is one.
#[must_use]
pub fn redirect_with_toast(
    path: &str,
    response: &ApiResponse,
    ok_msg: &str,
    err_msg: &str,
) -> Redirect {
    if response.is_ok() {
        return Redirect::to(&toast_location(path, ToastKind::Ok, ok_msg));
    }
    let message = match response.diagnostic() {
        Some(detail) => format!("{err_msg}: {detail}"),
        None => err_msg.to_string(),
    };
    Redirect::to(&toast_location(path, ToastKind::Err, &message))
}

/// Redirects to `path` with an error toast that did not come from the bot API.
#[must_use]
pub fn redirect_with_error(path: &str, message: &str) -> Redirect {
    Redirect::to(&toast_location(path, ToastKind::Err, message))
}
