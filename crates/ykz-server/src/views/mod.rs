//! Server-rendered HTML.

pub mod layout;
pub mod toast;

pub use layout::{Page, error_card, html_escape, icon, message_card, render_json, render_page};
pub use toast::{
    MAX_TOAST_CHARS, Toast, ToastKind, ToastQuery, redirect_with_error, redirect_with_toast,
};
