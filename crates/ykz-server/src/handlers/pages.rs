//! Protected pages. Each reads from the bot API and renders the result;
//! a failed read becomes an inline error card, not an error status.

use axum::extract::State;
use axum::response::Html;
use serde::Deserialize;
use ykz_auth::CurrentIdentity;
use ykz_bot_api::{DEFAULT_LOG_LIMIT, MAX_LOG_LIMIT};

use super::{action_form, data_section, field, render};
use crate::extract::QueryParams;
use crate::server::AppState;
use crate::views::ToastQuery;

#[derive(Debug, Default, Deserialize)]
pub struct BalanceQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogsQuery {
    /// Kept as text so a malformed value falls back to the default.
    pub limit: Option<String>,
}

impl LogsQuery {
    fn limit(&self) -> Option<u32> {
        self.limit.as_deref().and_then(|l| l.trim().parse().ok())
    }
}

pub async fn dashboard(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    QueryParams(toast): QueryParams<ToastQuery>,
) -> Html<String> {
    let stats = state.bot_api.stats().await;
    let body = data_section("Stats", &stats);
    render("Dashboard", "/dashboard", identity.as_ref(), &toast, &body)
}

pub async fn settings(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    QueryParams(toast): QueryParams<ToastQuery>,
) -> Html<String> {
    let settings = state.bot_api.settings().await;
    let mut body = data_section("Current settings", &settings);
    body.push_str("<div class=\"card\"><h2>Update setting</h2>");
    body.push_str(&action_form(
        "/settings/update",
        &format!(
            "{}{}",
            field("key", "Key", "text", ""),
            field("value", "Value", "text", "")
        ),
        "Save",
        "save",
        false,
    ));
    body.push_str(
        "<p class=\"msg\">Values that parse as JSON (numbers, true/false, null) are sent typed.</p></div>\n",
    );
    render("Settings", "/settings", identity.as_ref(), &toast, &body)
}

pub async fn balance(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    QueryParams(toast): QueryParams<ToastQuery>,
    QueryParams(query): QueryParams<BalanceQuery>,
) -> Html<String> {
    let user_id = query
        .user_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());

    let mut body = String::from("<div class=\"card\"><h2>Lookup</h2>");
    body.push_str(&format!(
        "<form method=\"get\" action=\"/balance\" class=\"row\">{}<button type=\"submit\">Lookup</button></form></div>\n",
        field("user_id", "User ID", "text", user_id.unwrap_or(""))
    ));

    if let Some(user_id) = user_id {
        let balance = state.bot_api.balance(user_id).await;
        body.push_str(&data_section(&format!("Balance of {user_id}"), &balance));
    }

    body.push_str("<div class=\"card\"><h2>Update balance</h2>");
    body.push_str(&action_form(
        "/balance/update",
        &format!(
            "{}{}<label>Mode<select name=\"mode\"><option value=\"add\">add</option><option value=\"set\">set</option></select></label>",
            field("user_id", "User ID", "text", user_id.unwrap_or("")),
            field("amount", "Amount", "number", "")
        ),
        "Apply",
        "save",
        false,
    ));
    body.push_str("</div>\n");
    render("Balance", "/balance", identity.as_ref(), &toast, &body)
}

fn shop_item_fields() -> String {
    [
        field("name", "Name", "text", ""),
        field("price", "Price", "number", ""),
        field("description", "Description", "text", ""),
        field("role_id", "Role ID", "text", ""),
        field("stock", "Stock", "number", ""),
    ]
    .concat()
}

pub async fn shop(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    QueryParams(toast): QueryParams<ToastQuery>,
) -> Html<String> {
    let items = state.bot_api.shop().await;
    let mut body = data_section("Items", &items);

    body.push_str("<div class=\"card\"><h2>Add item</h2>");
    body.push_str(&action_form("/shop/add", &shop_item_fields(), "Add", "add", false));
    body.push_str("</div>\n<div class=\"card\"><h2>Update item</h2>");
    body.push_str(&action_form(
        "/shop/update",
        &format!("{}{}", field("id", "Item ID", "text", ""), shop_item_fields()),
        "Save",
        "save",
        false,
    ));
    body.push_str("</div>\n<div class=\"card\"><h2>Delete item</h2>");
    body.push_str(&action_form(
        "/shop/delete",
        &field("id", "Item ID", "text", ""),
        "Delete",
        "delete",
        true,
    ));
    body.push_str("</div>\n");
    render("Shop", "/shop", identity.as_ref(), &toast, &body)
}

pub async fn xp(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    QueryParams(toast): QueryParams<ToastQuery>,
) -> Html<String> {
    let xp = state.bot_api.xp().await;
    let mut body = data_section("XP configuration", &xp);
    body.push_str("<div class=\"card\"><h2>Update XP</h2>");
    body.push_str(&action_form(
        "/xp/update",
        &[
            field("min_xp", "Min XP", "number", ""),
            field("max_xp", "Max XP", "number", ""),
            field("cooldown_seconds", "Cooldown (s)", "number", ""),
            field("multiplier", "Multiplier", "text", ""),
        ]
        .concat(),
        "Save",
        "save",
        false,
    ));
    body.push_str("<p class=\"msg\">Empty fields are left unchanged.</p></div>\n");
    render("XP", "/xp", identity.as_ref(), &toast, &body)
}

pub async fn logs(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    QueryParams(toast): QueryParams<ToastQuery>,
    QueryParams(query): QueryParams<LogsQuery>,
) -> Html<String> {
    let limit = ykz_bot_api::clamp_log_limit(query.limit());
    let logs = state.bot_api.logs(Some(limit)).await;

    let mut body = format!(
        "<div class=\"card\"><form method=\"get\" action=\"/logs\" class=\"row\">{}<button type=\"submit\">Show</button></form><p class=\"msg\">Default {DEFAULT_LOG_LIMIT}, at most {MAX_LOG_LIMIT}.</p></div>\n",
        field("limit", "Limit", "number", &limit.to_string())
    );
    body.push_str(&data_section(&format!("Last {limit} entries"), &logs));
    render("Logs", "/logs", identity.as_ref(), &toast, &body)
}

pub async fn admins(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    QueryParams(toast): QueryParams<ToastQuery>,
) -> Html<String> {
    let admins = state.bot_api.admins().await;
    let mut body = data_section("Admins", &admins);
    body.push_str("<div class=\"card\"><h2>Add admin</h2>");
    body.push_str(&action_form(
        "/admins/add",
        &field("user_id", "User ID", "text", ""),
        "Add",
        "add",
        false,
    ));
    body.push_str("</div>\n<div class=\"card\"><h2>Remove admin</h2>");
    body.push_str(&action_form(
        "/admins/remove",
        &field("user_id", "User ID", "text", ""),
        "Remove",
        "delete",
        true,
    ));
    body.push_str("</div>\n");
    render("Admins", "/admins", identity.as_ref(), &toast, &body)
}
