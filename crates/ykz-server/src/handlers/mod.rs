//! Route handlers.
//!
//! Public routes live in [`auth`] and [`check`]; everything in [`pages`] and
//! [`actions`] sits behind the admin route guard.

pub mod actions;
pub mod auth;
pub mod check;
pub mod pages;

use axum::response::Html;
use ykz_auth::{CurrentIdentity, Identity};
use ykz_bot_api::ApiResponse;

use crate::extract::QueryParams;
use crate::views::{Page, ToastQuery, error_card, html_escape, icon, render_json, render_page};

pub async fn home(
    CurrentIdentity(identity): CurrentIdentity,
    QueryParams(query): QueryParams<ToastQuery>,
) -> Html<String> {
    let action = match identity {
        Some(_) => "<a class=\"btn\" href=\"/dashboard\">Open Dashboard</a>",
        None => "<a class=\"btn\" href=\"/login\">Login with Discord</a>",
    };
    let body = format!(
        "<div class=\"card\"><h1>YKZ Control Panel</h1><p class=\"msg\">لوحة تحكم الإدارة.</p>{action}</div>\n"
    );
    render("YKZ Control Panel", "/", identity.as_ref(), &query, &body)
}

/// Renders a page with the toast carried in `query`, if any.
pub(crate) fn render(
    title: &str,
    path: &str,
    identity: Option<&Identity>,
    query: &ToastQuery,
    body: &str,
) -> Html<String> {
    let toast = query.toast();
    let page = Page::new(title, path)
        .identity(identity)
        .toast(toast.as_ref());
    Html(render_page(page, body))
}

/// A card showing the data of a bot API read, or an inline error.
pub(crate) fn data_section(heading: &str, response: &ApiResponse) -> String {
    match response.data() {
        Some(data) if response.is_ok() => format!(
            "<div class=\"card\"><h2>{}</h2>{}</div>\n",
            html_escape(heading),
            render_json(data)
        ),
        _ => {
            let detail = response
                .diagnostic()
                .unwrap_or_else(|| "request failed".to_string());
            error_card(&detail)
        }
    }
}

/// A labelled form input.
pub(crate) fn field(name: &str, label: &str, kind: &str, value: &str) -> String {
    format!(
        "<label>{}<input name=\"{}\" type=\"{}\" value=\"{}\"/></label>",
        html_escape(label),
        html_escape(name),
        html_escape(kind),
        html_escape(value)
    )
}

/// A POST form with a single submit button.
pub(crate) fn action_form(
    action: &str,
    fields: &str,
    button: &str,
    icon_name: &str,
    danger: bool,
) -> String {
    let class = if danger { " class=\"danger\"" } else { "" };
    format!(
        "<form method=\"post\" action=\"{}\" class=\"row\">{fields}<button type=\"submit\"{class}>{}{}</button></form>\n",
        html_escape(action),
        icon(icon_name),
        html_escape(button)
    )
}
