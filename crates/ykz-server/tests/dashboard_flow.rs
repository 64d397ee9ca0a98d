//! End-to-end tests of the access layer.
//!
//! Each test starts the real router on an ephemeral port, with wiremock
//! standing in for the bot API and for Discord.

use std::time::Duration;

use axum::http::HeaderMap;
use axum::http::header::{LOCATION, SET_COOKIE};
use axum::response::IntoResponse;
use serde_json::{Value, json};
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use wiremock::matchers::{any, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use ykz_auth::{Identity, Session, SessionId, Verdict};
use ykz_server::{AppConfig, AppState, build_app};

const OWNER: &str = "42";
const MEMBER: &str = "7";

fn config(bot: &MockServer) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.bot_api.base_url = bot.uri();
    cfg.bot_api.api_key = "test-key".into();
    cfg.bot_api.timeout = Duration::from_millis(300);
    cfg.session.secret = "integration-secret".into();
    cfg.access.owner_id = Some(OWNER.into());
    cfg.discord.client_id = "cid".into();
    cfg.discord.client_secret = "csecret".into();
    cfg.discord.callback_url = Some("http://localhost:3000/auth/callback".into());
    cfg
}

struct TestServer {
    base: String,
    state: AppState,
    client: reqwest::Client,
    shutdown: Option<tokio::sync::oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    async fn start(cfg: AppConfig) -> Self {
        let state = AppState::from_config(cfg).expect("state");
        let app = build_app(state.clone());

        let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
            .await
            .expect("bind");
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = rx.await;
                })
                .await;
        });

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        Self {
            base: format!("http://{addr}"),
            state,
            client,
            shutdown: Some(tx),
            handle,
        }
    }

    async fn get(&self, path: &str, cookie: Option<&str>) -> reqwest::Response {
        let mut req = self.client.get(format!("{}{path}", self.base));
        if let Some(cookie) = cookie {
            req = req.header("cookie", cookie);
        }
        req.send().await.expect("request")
    }

    async fn post(&self, path: &str, cookie: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(format!("{}{path}", self.base))
            .header("cookie", cookie)
            .form(form)
            .send()
            .await
            .expect("request")
    }

    /// Stores `session` and returns a signed `name=value` cookie pair for it.
    async fn seed(&self, session: Session) -> String {
        let sessions = &self.state.sessions;
        let id = SessionId::generate();
        sessions.save(&id, &session).await.unwrap();
        let jar = sessions.jar(&HeaderMap::new()).add(sessions.cookie(&id));
        let res = (jar, ()).into_response();
        let set_cookie = res.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn login_as(&self, id: &str, verdict: Option<Verdict>) -> String {
        let mut session = Session::authenticated(identity(id), OffsetDateTime::now_utc());
        session.verdict = verdict;
        self.seed(session).await
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = self.handle.await;
    }
}

fn identity(id: &str) -> Identity {
    Identity {
        id: id.into(),
        username: format!("user{id}"),
        discriminator: "0".into(),
        avatar: None,
    }
}

fn location(res: &reqwest::Response) -> String {
    res.headers()
        .get(LOCATION)
        .expect("location header")
        .to_str()
        .unwrap()
        .to_string()
}

fn session_cookie(res: &reqwest::Response) -> Option<String> {
    res.headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("ykz.sid="))
        .map(str::to_string)
}

async fn mock_admin(bot: &MockServer, user_id: &str, is_admin: bool, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/api/auth/is_admin"))
        .and(query_param("user_id", user_id))
        .and(header("X-API-KEY", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "is_admin": is_admin,
            "admin_role_id": "99"
        })))
        .expect(expected_calls)
        .mount(bot)
        .await;
}

async fn mock_stats(bot: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/stats"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "guilds": 3 })),
        )
        .mount(bot)
        .await;
}

#[tokio::test]
async fn anonymous_visitors_are_sent_to_login() {
    let bot = MockServer::start().await;
    let server = TestServer::start(config(&bot)).await;

    for page in ["/dashboard", "/settings", "/logs?limit=5", "/admins"] {
        let res = server.get(page, None).await;
        assert_eq!(res.status(), 303, "{page}");
        assert_eq!(location(&res), "/login", "{page}");
    }

    let res = server
        .post("/admins/add", "ykz.sid=forged", &[("user_id", "1")])
        .await;
    assert_eq!(res.status(), 303);
    assert_eq!(location(&res), "/login");

    server.stop().await;
}

#[tokio::test]
async fn owner_bypasses_an_unreachable_bot_api() {
    let bot = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&bot)
        .await;
    let server = TestServer::start(config(&bot)).await;
    let cookie = server.login_as(OWNER, None).await;

    let res = server.get("/dashboard", Some(&cookie)).await;
    assert_eq!(res.status(), 200);
    let body = res.text().await.unwrap();
    assert!(body.contains("user42#0"));
    assert!(body.contains("bad gateway"));

    let admin_checks = bot
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/api/auth/is_admin")
        .count();
    assert_eq!(admin_checks, 0);

    server.stop().await;
}

#[tokio::test]
async fn fresh_denial_is_honored_even_if_the_bot_changed_its_mind() {
    let bot = MockServer::start().await;
    mock_admin(&bot, MEMBER, true, 0).await;
    let server = TestServer::start(config(&bot)).await;

    let verdict = Verdict {
        is_admin: false,
        checked_at: OffsetDateTime::now_utc() - time::Duration::seconds(10),
    };
    let cookie = server.login_as(MEMBER, Some(verdict)).await;

    let res = server.get("/dashboard", Some(&cookie)).await;
    assert_eq!(res.status(), 403);
    assert!(res.text().await.unwrap().contains("لا تملك صلاحية"));

    server.stop().await;
}

#[tokio::test]
async fn stale_verdict_triggers_exactly_one_remote_check() {
    let bot = MockServer::start().await;
    mock_admin(&bot, MEMBER, true, 1).await;
    mock_stats(&bot).await;
    let server = TestServer::start(config(&bot)).await;

    let verdict = Verdict {
        is_admin: false,
        checked_at: OffsetDateTime::now_utc() - time::Duration::seconds(45),
    };
    let cookie = server.login_as(MEMBER, Some(verdict)).await;

    // The second request reuses the verdict cached by the first.
    for _ in 0..2 {
        let res = server.get("/dashboard", Some(&cookie)).await;
        assert_eq!(res.status(), 200);
        assert!(res.text().await.unwrap().contains("guilds"));
    }

    server.stop().await;
}

#[tokio::test]
async fn admin_check_timeout_is_a_server_error_not_a_denial() {
    let bot = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/auth/is_admin"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "is_admin": true }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&bot)
        .await;
    let server = TestServer::start(config(&bot)).await;
    let cookie = server.login_as(MEMBER, None).await;

    let res = server.get("/dashboard", Some(&cookie)).await;
    assert_eq!(res.status(), 500);
    let body = res.text().await.unwrap();
    assert!(body.contains("API Error"));
    assert!(!body.contains("لا تملك صلاحية"));

    server.stop().await;
}

#[tokio::test]
async fn private_mode_requires_login_outside_the_open_paths() {
    let bot = MockServer::start().await;
    let mut cfg = config(&bot);
    cfg.access.private = true;
    let server = TestServer::start(cfg).await;

    assert_eq!(server.get("/", None).await.status(), 200);
    let res = server.get("/login", None).await;
    assert_eq!(res.status(), 303);
    assert!(location(&res).starts_with("https://discord.com/oauth2/authorize?"));

    let res = server.get("/dashboard", None).await;
    assert_eq!(res.status(), 303);
    assert_eq!(location(&res), "/login");

    // Unknown paths are gated too instead of answering 404.
    let res = server.get("/anything", None).await;
    assert_eq!(res.status(), 303);
    assert_eq!(location(&res), "/login");

    // Login alone is enough without SITE_ADMIN_ONLY.
    let cookie = server.login_as(MEMBER, None).await;
    assert_eq!(server.get("/anything", Some(&cookie)).await.status(), 404);

    server.stop().await;
}

#[tokio::test]
async fn admin_only_mode_gates_every_private_path() {
    let bot = MockServer::start().await;
    mock_admin(&bot, MEMBER, false, 1).await;
    let mut cfg = config(&bot);
    cfg.access.private = true;
    cfg.access.admin_only = true;
    let server = TestServer::start(cfg).await;
    let cookie = server.login_as(MEMBER, None).await;

    assert_eq!(server.get("/anything", Some(&cookie)).await.status(), 403);
    assert_eq!(server.get("/", Some(&cookie)).await.status(), 200);

    // Logout stays reachable for a refused session.
    let res = server.get("/logout", Some(&cookie)).await;
    assert_eq!(res.status(), 303);
    assert_eq!(location(&res), "/");

    server.stop().await;
}

#[tokio::test]
async fn check_reports_health_and_admin_status() {
    let bot = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .mount(&bot)
        .await;
    mock_admin(&bot, MEMBER, true, 1).await;
    let server = TestServer::start(config(&bot)).await;

    let anonymous: Value = server.get("/check", None).await.json().await.unwrap();
    assert_eq!(
        anonymous,
        json!({
            "ok": true,
            "health": { "status": "ok" },
            "logged_in": false,
            "discord_id": null,
            "is_admin": false,
            "admin_role_id": null
        })
    );

    let cookie = server.login_as(MEMBER, None).await;
    let report: Value = server
        .get("/check", Some(&cookie))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(report["logged_in"], json!(true));
    assert_eq!(report["discord_id"], json!(MEMBER));
    assert_eq!(report["is_admin"], json!(true));
    assert_eq!(report["admin_role_id"], json!("99"));

    server.stop().await;
}

#[tokio::test]
async fn check_survives_a_dead_bot_api() {
    let bot = MockServer::start().await;
    let mut cfg = config(&bot);
    cfg.bot_api.base_url = "http://127.0.0.1:1".into();
    let server = TestServer::start(cfg).await;
    let cookie = server.login_as(MEMBER, None).await;

    let res = server.get("/check", Some(&cookie)).await;
    assert_eq!(res.status(), 200);
    let report: Value = res.json().await.unwrap();
    assert_eq!(report["health"]["ok"], json!(false));
    assert!(report["health"]["error"].is_string());
    assert_eq!(report["is_admin"], json!(false));
    assert!(report["admin_error"].is_string());

    server.stop().await;
}

#[tokio::test]
async fn actions_redirect_back_with_a_toast() {
    let bot = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/admins/add"))
        .and(body_json(json!({ "user_id": "5" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&bot)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/admins/remove"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "ok": false, "error": "not an admin" })),
        )
        .expect(1)
        .mount(&bot)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admins"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "admins": [] })))
        .mount(&bot)
        .await;
    let server = TestServer::start(config(&bot)).await;
    let cookie = server.login_as(OWNER, None).await;

    let res = server.post("/admins/add", &cookie, &[("user_id", "5")]).await;
    assert_eq!(res.status(), 303);
    assert_eq!(location(&res), "/admins?toast=Admin%20added&type=ok");

    let res = server
        .post("/admins/remove", &cookie, &[("user_id", "6")])
        .await;
    assert_eq!(
        location(&res),
        "/admins?toast=Removing%20admin%20failed%3A%20not%20an%20admin&type=err"
    );

    // Invalid input never reaches the bot API.
    let res = server.post("/admins/add", &cookie, &[("user_id", " ")]).await;
    assert!(location(&res).ends_with("&type=err"));

    let res = server
        .get("/admins?toast=Admin%20added&type=ok", Some(&cookie))
        .await;
    let body = res.text().await.unwrap();
    assert!(body.contains("class=\"toast ok\""));
    assert!(body.contains("Admin added"));
    assert!(body.contains("history.replaceState"));

    server.stop().await;
}

#[tokio::test]
async fn repeated_query_parameters_keep_the_first_value() {
    let bot = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&bot)
        .await;
    let server = TestServer::start(config(&bot)).await;

    let res = server.get("/?toast=first&toast=second&type=ok", None).await;
    assert_eq!(res.status(), 200);
    let body = res.text().await.unwrap();
    assert!(body.contains("first"));
    assert!(!body.contains("second"));

    let cookie = server.login_as(OWNER, None).await;
    for target in [
        "/dashboard?toast=a&toast=b",
        "/balance?user_id=1&user_id=2",
        "/logs?limit=5&limit=abc",
    ] {
        let res = server.get(target, Some(&cookie)).await;
        assert_eq!(res.status(), 200, "{target}");
    }

    server.stop().await;
}

#[tokio::test]
async fn logout_destroys_the_session() {
    let bot = MockServer::start().await;
    mock_stats(&bot).await;
    let server = TestServer::start(config(&bot)).await;
    let cookie = server.login_as(OWNER, None).await;
    assert_eq!(server.get("/dashboard", Some(&cookie)).await.status(), 200);

    let res = server.get("/logout", Some(&cookie)).await;
    assert_eq!(res.status(), 303);
    assert_eq!(location(&res), "/");
    let removal = session_cookie(&res).expect("removal cookie");
    assert!(removal.starts_with("ykz.sid=;"));

    let res = server.get("/dashboard", Some(&cookie)).await;
    assert_eq!(res.status(), 303);
    assert_eq!(location(&res), "/login");

    server.stop().await;
}

#[tokio::test]
async fn discord_login_binds_the_identity_to_a_new_session() {
    let bot = MockServer::start().await;
    mock_stats(&bot).await;
    let discord = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok",
            "token_type": "Bearer",
            "scope": "identify"
        })))
        .expect(1)
        .mount(&discord)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/users/@me"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": OWNER,
            "username": "owner",
            "avatar": null
        })))
        .expect(1)
        .mount(&discord)
        .await;

    let mut cfg = config(&bot);
    cfg.discord.authorize_url = format!("{}/oauth2/authorize", discord.uri());
    cfg.discord.token_url = format!("{}/api/oauth2/token", discord.uri());
    cfg.discord.api_base = format!("{}/api", discord.uri());
    let server = TestServer::start(cfg).await;

    let res = server.get("/login", None).await;
    assert_eq!(res.status(), 303);
    let authorize = url::Url::parse(&location(&res)).unwrap();
    let pre_login = session_cookie(&res).expect("pre-login cookie");
    let pre_login = pre_login.split(';').next().unwrap().to_string();
    let state = authorize
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .unwrap();

    // A mismatched state is refused without touching the provider.
    let res = server
        .get("/auth/callback?code=abc&state=wrong", Some(&pre_login))
        .await;
    assert_eq!(location(&res), "/");

    // The state was consumed by the failed attempt; start over.
    let res = server.get("/login", Some(&pre_login)).await;
    let authorize = url::Url::parse(&location(&res)).unwrap();
    let fresh_state = authorize
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .unwrap();
    assert_ne!(state, fresh_state);

    let res = server
        .get(
            &format!("/auth/callback?code=abc&state={fresh_state}"),
            Some(&pre_login),
        )
        .await;
    assert_eq!(res.status(), 303);
    assert_eq!(location(&res), "/dashboard");
    let logged_in = session_cookie(&res).expect("session cookie");
    let logged_in = logged_in.split(';').next().unwrap().to_string();
    assert_ne!(logged_in, pre_login);

    let res = server.get("/dashboard", Some(&logged_in)).await;
    assert_eq!(res.status(), 200);
    assert!(res.text().await.unwrap().contains("owner#0"));

    // The pre-login cookie never carries the identity.
    let res = server.get("/dashboard", Some(&pre_login)).await;
    assert_eq!(location(&res), "/login");

    server.stop().await;
}

#[tokio::test]
async fn provider_errors_return_home() {
    let bot = MockServer::start().await;
    let server = TestServer::start(config(&bot)).await;

    let res = server
        .get("/auth/callback?error=access_denied", None)
        .await;
    assert_eq!(res.status(), 303);
    assert_eq!(location(&res), "/");

    server.stop().await;
}

#[tokio::test]
async fn login_without_a_callback_url_is_a_server_error() {
    let bot = MockServer::start().await;
    let mut cfg = config(&bot);
    cfg.discord.callback_url = None;
    let server = TestServer::start(cfg).await;

    assert_eq!(server.get("/login", None).await.status(), 500);

    server.stop().await;
}
