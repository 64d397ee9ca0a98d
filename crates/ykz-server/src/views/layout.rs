//! Page shell and shared HTML fragments.
//!
//! Every dynamic value goes through [`html_escape`] before it is written.

use serde_json::Value;
use ykz_auth::Identity;

use super::toast::{Toast, ToastKind};

const STYLES: &str = r#"
:root {
    --bg0: #070812;
    --bg1: #0b1020;
    --card: rgba(255, 255, 255, 0.055);
    --text: #f8fafc;
    --muted: rgba(248, 250, 252, 0.72);
    --line: rgba(255, 255, 255, 0.10);
    --accent: #8b5cf6;
    --accent2: #22d3ee;
    --good: #22c55e;
    --danger: #ef4444;
    --radius: 18px;
}
* { box-sizing: border-box; }
html, body { height: 100%; }
body {
    margin: 0;
    font-family: ui-sans-serif, system-ui, -apple-system, "Segoe UI", Roboto, "Noto Sans Arabic", Arial, sans-serif;
    color: var(--text);
    background:
        radial-gradient(900px 520px at 12% 8%, rgba(139, 92, 246, 0.38), transparent 62%),
        radial-gradient(900px 520px at 88% 26%, rgba(34, 211, 238, 0.20), transparent 62%),
        linear-gradient(180deg, var(--bg0), var(--bg1));
}
a { color: inherit; text-decoration: none; }
.wrap { display: flex; min-height: 100%; }
.side {
    width: 272px; padding: 18px 14px; position: sticky; top: 0; height: 100vh;
    background: linear-gradient(180deg, rgba(255, 255, 255, 0.07), rgba(255, 255, 255, 0.03));
    border-right: 1px solid var(--line);
}
.brand {
    display: flex; gap: 12px; align-items: center; padding: 14px; margin: 6px 6px 14px;
    border: 1px solid var(--line); border-radius: 16px;
    background: linear-gradient(135deg, rgba(139, 92, 246, 0.28), rgba(34, 211, 238, 0.10));
}
.brandTitle { font-weight: 900; font-size: 16px; }
.brandSub { font-size: 12px; color: var(--muted); }
.nav a {
    display: flex; align-items: center; gap: 10px; padding: 11px 12px; margin: 6px;
    border-radius: 14px; color: var(--muted); border: 1px solid transparent;
}
.nav a:hover { color: var(--text); border-color: var(--line); background: rgba(255, 255, 255, 0.06); }
.nav a.active { color: var(--text); border-color: rgba(139, 92, 246, 0.45); }
.nav a.danger { color: #fca5a5; }
.navSep { height: 1px; margin: 12px 10px; background: var(--line); }
.ico svg, .btn svg {
    width: 18px; height: 18px; stroke: currentColor; fill: none; stroke-width: 1.8;
    stroke-linecap: round; stroke-linejoin: round; display: block;
}
.main { flex: 1; padding: 24px 26px; }
.topbar { display: flex; justify-content: space-between; align-items: center; margin-bottom: 18px; }
.topbar .title { font-size: 22px; font-weight: 800; }
.who { display: flex; gap: 10px; align-items: center; }
.avatar { width: 40px; height: 40px; border-radius: 999px; }
.whoId { font-size: 12px; color: var(--muted); }
.card {
    background: var(--card); border: 1px solid var(--line); border-radius: var(--radius);
    padding: 18px 20px; margin-bottom: 16px;
}
.card h1, .card h2 { margin-top: 0; }
.msg { color: var(--muted); }
.row { display: flex; flex-wrap: wrap; gap: 10px; align-items: end; }
label { display: flex; flex-direction: column; gap: 4px; font-size: 13px; color: var(--muted); }
input, select, textarea {
    background: rgba(0, 0, 0, 0.25); color: var(--text); border: 1px solid var(--line);
    border-radius: 10px; padding: 8px 10px;
}
button, .btn {
    display: inline-flex; gap: 6px; align-items: center; cursor: pointer;
    background: linear-gradient(135deg, var(--accent), #6d28d9); color: white;
    border: 0; border-radius: 12px; padding: 9px 14px; font-weight: 700;
}
button.danger { background: linear-gradient(135deg, var(--danger), #b91c1c); }
table { width: 100%; border-collapse: collapse; }
th, td { text-align: left; padding: 8px 10px; border-bottom: 1px solid var(--line); vertical-align: top; }
th { color: var(--muted); font-weight: 600; }
.error { border-color: rgba(239, 68, 68, 0.5); }
.toast {
    position: fixed; top: 18px; right: 18px; z-index: 10; max-width: 420px;
    padding: 12px 16px; border-radius: 14px; border: 1px solid var(--line); background: #111827;
}
.toast.ok { border-color: var(--good); }
.toast.err { border-color: var(--danger); }
"#;

/// Strips the one-shot toast parameters from the address bar.
const TOAST_SCRIPT: &str = r#"<script>
(function () {
    var url = new URL(window.location.href);
    if (url.searchParams.has('toast') || url.searchParams.has('type')) {
        url.searchParams.delete('toast');
        url.searchParams.delete('type');
        window.history.replaceState(null, '', url.pathname + url.search + url.hash);
    }
    var t = document.getElementById('toast');
    if (t) { setTimeout(function () { t.remove(); }, 6000); }
})();
</script>"#;

const NAV_ITEMS: [(&str, &str, &str); 7] = [
    ("/dashboard", "Dashboard", "dashboard"),
    ("/settings", "Settings", "settings"),
    ("/balance", "Balance", "balance"),
    ("/shop", "Shop", "shop"),
    ("/xp", "XP", "xp"),
    ("/logs", "Logs", "logs"),
    ("/admins", "Admins", "admins"),
];

/// Inline SVG icon by name. Unknown names yield an empty string.
#[must_use]
pub fn icon(name: &str) -> &'static str {
    match name {
        "dashboard" => {
            r#"<svg viewBox="0 0 24 24" aria-hidden="true"><path d="M3 13h8V3H3v10z"/><path d="M13 21h8V11h-8v10z"/><path d="M13 3h8v6h-8z"/><path d="M3 17h8v4H3z"/></svg>"#
        }
        "settings" => {
            r#"<svg viewBox="0 0 24 24" aria-hidden="true"><path d="M12 15.5a3.5 3.5 0 1 0 0-7 3.5 3.5 0 0 0 0 7z"/><path d="M19.4 15a7.9 7.9 0 0 0 .1-2l2-1.5-2-3.5-2.4 1a8 8 0 0 0-1.7-1L15 3H9l-.4 3a8 8 0 0 0-1.7 1l-2.4-1-2 3.5 2 1.5a7.9 7.9 0 0 0 .1 2l-2 1.5 2 3.5 2.4-1a8 8 0 0 0 1.7 1l.4 3h6l.4-3a8 8 0 0 0 1.7-1l2.4 1 2-3.5-2-1.5z"/></svg>"#
        }
        "balance" => {
            r#"<svg viewBox="0 0 24 24" aria-hidden="true"><path d="M3 7h18v10H3z"/><path d="M12 15a2 2 0 1 0 0-4 2 2 0 0 0 0 4z"/></svg>"#
        }
        "shop" => {
            r#"<svg viewBox="0 0 24 24" aria-hidden="true"><path d="M6 7h15l-1.5 9h-13z"/><path d="M6 7l-2-3H2"/><path d="M9 22a1 1 0 1 0 0-2 1 1 0 0 0 0 2z"/><path d="M18 22a1 1 0 1 0 0-2 1 1 0 0 0 0 2z"/></svg>"#
        }
        "xp" => {
            r#"<svg viewBox="0 0 24 24" aria-hidden="true"><path d="M12 2l2.7 6.2 6.8.6-5.2 4.5 1.6 6.7L12 16.9 6.1 20l1.6-6.7L2.5 8.8l6.8-.6L12 2z"/></svg>"#
        }
        "logs" => {
            r#"<svg viewBox="0 0 24 24" aria-hidden="true"><path d="M8 6h13"/><path d="M8 12h13"/><path d="M8 18h13"/><path d="M3 6h.01"/><path d="M3 12h.01"/><path d="M3 18h.01"/></svg>"#
        }
        "admins" => {
            r#"<svg viewBox="0 0 24 24" aria-hidden="true"><path d="M12 2l8 4v6c0 5-3.4 9.4-8 10-4.6-.6-8-5-8-10V6l8-4z"/><path d="M9 12l2 2 4-5"/></svg>"#
        }
        "logout" => {
            r#"<svg viewBox="0 0 24 24" aria-hidden="true"><path d="M10 17l5-5-5-5"/><path d="M15 12H3"/><path d="M21 3v18"/></svg>"#
        }
        "save" => {
            r#"<svg viewBox="0 0 24 24" aria-hidden="true"><path d="M19 21H5a2 2 0 0 1-2-2V5a2 2 0 0 1 2-2h11l5 5v11a2 2 0 0 1-2 2z"/><path d="M17 21v-8H7v8"/><path d="M7 3v5h8"/></svg>"#
        }
        "add" => r#"<svg viewBox="0 0 24 24" aria-hidden="true"><path d="M12 5v14"/><path d="M5 12h14"/></svg>"#,
        "delete" => {
            r#"<svg viewBox="0 0 24 24" aria-hidden="true"><path d="M3 6h18"/><path d="M8 6V4h8v2"/><path d="M6 6l1 16h10l1-16"/></svg>"#
        }
        _ => "",
    }
}

/// Escapes text for HTML element and attribute context.
#[must_use]
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}

/// Everything the shell needs besides the body.
#[derive(Debug, Clone, Copy)]
pub struct Page<'a> {
    pub title: &'a str,
    /// Request path, used to highlight the active nav entry.
    pub path: &'a str,
    pub identity: Option<&'a Identity>,
    pub toast: Option<&'a Toast>,
}

impl<'a> Page<'a> {
    #[must_use]
    pub fn new(title: &'a str, path: &'a str) -> Self {
        Self {
            title,
            path,
            identity: None,
            toast: None,
        }
    }

    #[must_use]
    pub fn identity(mut self, identity: Option<&'a Identity>) -> Self {
        self.identity = identity;
        self
    }

    #[must_use]
    pub fn toast(mut self, toast: Option<&'a Toast>) -> Self {
        self.toast = toast;
        self
    }
}

fn nav_item(path: &str, href: &str, label: &str, icon_name: &str, danger: bool) -> String {
    let active = path == href || path.starts_with(&format!("{href}/"));
    let mut class = String::new();
    if active {
        class.push_str("active");
    }
    if danger {
        if !class.is_empty() {
            class.push(' ');
        }
        class.push_str("danger");
    }
    format!(
        "<a href=\"{href}\" class=\"{class}\"><span class=\"ico\">{}</span><span>{}</span></a>\n",
        icon(icon_name),
        html_escape(label)
    )
}

fn render_nav(path: &str) -> String {
    let path = path.to_ascii_lowercase();
    let mut nav = String::with_capacity(2048);
    nav.push_str("<aside class=\"side\" id=\"side\">\n");
    nav.push_str("<div class=\"brand\"><div>");
    nav.push_str("<div class=\"brandTitle\">YKZ Control</div>");
    nav.push_str("<div class=\"brandSub\">Admin dashboard</div>");
    nav.push_str("</div></div>\n<nav class=\"nav\">\n");
    for (href, label, icon_name) in NAV_ITEMS {
        nav.push_str(&nav_item(&path, href, label, icon_name, false));
    }
    nav.push_str("<div class=\"navSep\"></div>\n");
    nav.push_str(&nav_item(&path, "/logout", "Logout", "logout", true));
    nav.push_str("</nav>\n</aside>\n");
    nav
}

fn render_topbar(title: &str, identity: &Identity) -> String {
    let mut top = String::with_capacity(512);
    top.push_str("<div class=\"topbar\">\n<div class=\"title\">");
    top.push_str(&html_escape(title));
    top.push_str("</div>\n<div class=\"who\">");
    if let Some(url) = identity.avatar_url() {
        top.push_str("<img class=\"avatar\" src=\"");
        top.push_str(&html_escape(&url));
        top.push_str("\" alt=\"avatar\"/>");
    }
    top.push_str("<div><div class=\"whoName\">");
    top.push_str(&html_escape(&identity.tag()));
    top.push_str("</div><div class=\"whoId\">ID: ");
    top.push_str(&html_escape(&identity.id));
    top.push_str("</div></div></div>\n</div>\n");
    top
}

fn render_toast(toast: &Toast) -> String {
    let class = match toast.kind {
        ToastKind::Ok => "ok",
        ToastKind::Err => "err",
    };
    format!(
        "<div id=\"toast\" class=\"toast {class}\" role=\"status\">{}</div>\n",
        html_escape(&toast.message)
    )
}

/// Renders a full HTML document around `body`.
///
/// Navigation and the top bar are only shown when an identity is bound.
#[must_use]
pub fn render_page(page: Page<'_>, body: &str) -> String {
    let mut html = String::with_capacity(STYLES.len() + body.len() + 4096);
    html.push_str("<!doctype html>\n<html lang=\"ar\">\n<head>\n<meta charset=\"utf-8\"/>\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"/>\n");
    html.push_str("<title>");
    html.push_str(&html_escape(page.title));
    html.push_str("</title>\n<style>");
    html.push_str(STYLES);
    html.push_str("</style>\n</head>\n<body>\n");

    if let Some(toast) = page.toast {
        html.push_str(&render_toast(toast));
    }

    match page.identity {
        Some(identity) => {
            html.push_str("<div class=\"wrap\">\n");
            html.push_str(&render_nav(page.path));
            html.push_str("<main class=\"main\">\n");
            html.push_str(&render_topbar(page.title, identity));
            html.push_str(body);
            html.push_str("</main>\n</div>\n");
        }
        None => {
            html.push_str("<main class=\"main\">\n");
            html.push_str(body);
            html.push_str("</main>\n");
        }
    }

    html.push_str(TOAST_SCRIPT);
    html.push_str("\n</body>\n</html>");
    html
}

/// A card with a heading and a message.
#[must_use]
pub fn message_card(heading: &str, message: &str) -> String {
    format!(
        "<div class=\"card\"><h1>{}</h1><p class=\"msg\">{}</p></div>\n",
        html_escape(heading),
        html_escape(message)
    )
}

/// Inline error card shown when a page read fails.
#[must_use]
pub fn error_card(message: &str) -> String {
    format!(
        "<div class=\"card error\"><h2>Bot API error</h2><p class=\"msg\">{}</p></div>\n",
        html_escape(message)
    )
}

/// Renders arbitrary JSON: arrays of objects as tables, objects as
/// key/value tables, arrays of scalars as lists.
#[must_use]
pub fn render_json(value: &Value) -> String {
    match value {
        Value::Object(map) if map.is_empty() => "<p class=\"msg\">(empty)</p>".to_string(),
        Value::Object(map) => {
            let mut out = String::from("<table class=\"kv\">\n");
            for (key, v) in map {
                out.push_str("<tr><th>");
                out.push_str(&html_escape(key));
                out.push_str("</th><td>");
                out.push_str(&render_json(v));
                out.push_str("</td></tr>\n");
            }
            out.push_str("</table>\n");
            out
        }
        Value::Array(items) if items.is_empty() => "<p class=\"msg\">(none)</p>".to_string(),
        Value::Array(items) if items.iter().all(Value::is_object) => render_rows(items),
        Value::Array(items) => {
            let mut out = String::from("<ul>\n");
            for item in items {
                out.push_str("<li>");
                out.push_str(&render_json(item));
                out.push_str("</li>\n");
            }
            out.push_str("</ul>\n");
            out
        }
        Value::String(s) => html_escape(s),
        Value::Null => "&mdash;".to_string(),
        other => html_escape(&other.to_string()),
    }
}

fn render_rows(items: &[Value]) -> String {
    let mut columns: Vec<&str> = Vec::new();
    for item in items {
        if let Value::Object(map) = item {
            for key in map.keys() {
                if !columns.contains(&key.as_str()) {
                    columns.push(key);
                }
            }
        }
    }

    let mut out = String::from("<table>\n<tr>");
    for col in &columns {
        out.push_str("<th>");
        out.push_str(&html_escape(col));
        out.push_str("</th>");
    }
    out.push_str("</tr>\n");
    for item in items {
        out.push_str("<tr>");
        for col in &columns {
            out.push_str("<td>");
            if let Some(v) = item.get(*col) {
                out.push_str(&render_json(v));
            }
            out.push_str("</td>");
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</table>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn identity() -> Identity {
        Identity {
            id: "42".into(),
            username: "<b>owner</b>".into(),
            discriminator: "0".into(),
            avatar: Some("abc".into()),
        }
    }

    #[test]
    fn escape_covers_all_specials() {
        assert_eq!(
            html_escape(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#039;&amp;&#039;&lt;/a&gt;"
        );
    }

    #[test]
    fn anonymous_page_has_no_nav() {
        let html = render_page(Page::new("Home", "/"), "<p>hi</p>");
        assert!(!html.contains("class=\"side\""));
        assert!(html.contains("<p>hi</p>"));
        assert!(html.contains("replaceState"));
    }

    #[test]
    fn signed_in_page_shows_escaped_identity_and_active_nav() {
        let id = identity();
        let html = render_page(Page::new("Shop", "/shop").identity(Some(&id)), "");
        assert!(html.contains("&lt;b&gt;owner&lt;/b&gt;#0"));
        assert!(!html.contains("<b>owner</b>"));
        assert!(html.contains("<a href=\"/shop\" class=\"active\">"));
        assert!(html.contains("<a href=\"/logout\" class=\"danger\">"));
        assert!(html.contains("https://cdn.discordapp.com/avatars/42/abc.png?size=64"));
    }

    #[test]
    fn toast_is_rendered_escaped() {
        let toast = Toast {
            message: "<script>x</script>".into(),
            kind: ToastKind::Err,
        };
        let html = render_page(Page::new("Logs", "/logs").toast(Some(&toast)), "");
        assert!(html.contains("class=\"toast err\""));
        assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
    }

    #[test]
    fn json_rendering() {
        let html = render_json(&json!([
            { "id": 1, "name": "VIP" },
            { "id": 2, "price": 50 }
        ]));
        assert!(html.contains("<th>id</th><th>name</th><th>price</th>"));
        assert!(html.contains("<td>VIP</td>"));

        let html = render_json(&json!({ "members": 10, "note": "<hi>" }));
        assert!(html.contains("<tr><th>members</th><td>10</td></tr>"));
        assert!(html.contains("&lt;hi&gt;"));

        assert_eq!(render_json(&json!([])), "<p class=\"msg\">(none)</p>");
        assert!(render_json(&json!(["a", "b"])).contains("<li>a</li>"));
    }
}
