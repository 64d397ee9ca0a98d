use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    extract::FromRef,
    middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use ykz_auth::{AccessPolicy, AuthorizationGate, DiscordOAuth, SessionManager, session_layer};
use ykz_bot_api::BotApiClient;

use crate::handlers::{self, actions, auth, check, pages};
use crate::{config::AppConfig, middleware as app_middleware};

/// Shared application state, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: SessionManager,
    pub bot_api: BotApiClient,
    /// `None` when no callback URL could be derived; `/login` then fails.
    pub oauth: Option<Arc<DiscordOAuth>>,
    pub gate: Arc<AuthorizationGate>,
    pub policy: Arc<AccessPolicy>,
}

impl AppState {
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let bot_api = BotApiClient::new(&config.bot_api).context("invalid bot API settings")?;
        let oauth = config
            .callback_url()
            .map(|callback| DiscordOAuth::new(config.discord.clone(), callback))
            .transpose()
            .context("invalid Discord settings")?
            .map(Arc::new);

        Ok(Self {
            sessions: SessionManager::in_memory(&config.session),
            bot_api,
            oauth,
            gate: Arc::new(AuthorizationGate::from_config(&config.access)),
            policy: Arc::new(AccessPolicy::from_config(&config.access)),
            config: Arc::new(config),
        })
    }
}

impl FromRef<AppState> for SessionManager {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

pub struct DashboardServer {
    addr: SocketAddr,
    app: Router,
    state: AppState,
}

pub fn build_app(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit_bytes;

    let protected = Router::new()
        .route("/dashboard", get(pages::dashboard))
        .route("/settings", get(pages::settings))
        .route("/settings/update", post(actions::update_settings))
        .route("/balance", get(pages::balance))
        .route("/balance/update", post(actions::update_balance))
        .route("/shop", get(pages::shop))
        .route("/shop/add", post(actions::add_shop_item))
        .route("/shop/update", post(actions::update_shop_item))
        .route("/shop/delete", post(actions::delete_shop_item))
        .route("/xp", get(pages::xp))
        .route("/xp/update", post(actions::update_xp))
        .route("/logs", get(pages::logs))
        .route("/admins", get(pages::admins))
        .route("/admins/add", post(actions::add_admin))
        .route("/admins/remove", post(actions::remove_admin))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            app_middleware::require_admin,
        ));

    Router::new()
        // Public entry points; kept reachable by the access policy
        .route("/", get(handlers::home))
        .route("/check", get(check::check))
        .route("/login", get(auth::login))
        .route("/auth/callback", get(auth::callback))
        .route("/logout", get(auth::logout))
        .merge(protected)
        // Middleware stack (outermost last: request id -> trace -> session -> site access)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            app_middleware::site_access,
        ))
        .layer(middleware::from_fn_with_state(
            state.sessions.clone(),
            session_layer,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    if req.uri().path() == "/favicon.ico" {
                        return tracing::span!(tracing::Level::TRACE, "noop");
                    }
                    let req_id = req
                        .extensions()
                        .get::<axum::http::HeaderValue>()
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        if span.metadata().is_some_and(|meta| meta.name() != "noop") {
                            tracing::info!(
                                http.status = %res.status().as_u16(),
                                elapsed_ms = %latency.as_millis(),
                                "request handled"
                            );
                        }
                    },
                ),
        )
        .layer(middleware::from_fn(app_middleware::request_id))
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[derive(Default)]
pub struct ServerBuilder {
    addr: Option<SocketAddr>,
    config: AppConfig,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = Some(addr);
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.config = cfg;
        self
    }

    pub fn build(self) -> anyhow::Result<DashboardServer> {
        let addr = self.addr.unwrap_or_else(|| self.config.addr());
        let state = AppState::from_config(self.config)?;
        let app = build_app(state.clone());

        Ok(DashboardServer { addr, app, state })
    }
}

impl DashboardServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .with_context(|| format!("failed to bind {}", self.addr))?;

        let config = &self.state.config;
        let callback = self
            .state
            .oauth
            .as_ref()
            .map_or("MISSING", |oauth| oauth.callback_url());
        tracing::info!(
            "Dashboard running on {} (callback: {})",
            config.base_url(),
            callback
        );
        if config.session.uses_default_secret() {
            tracing::warn!("session.secret is the built-in default; set SESSION_SECRET");
        }
        if config.bot_api.api_key.is_empty() {
            tracing::warn!("bot_api.api_key is empty; bot API calls will likely be rejected");
        }

        let sweeper = self
            .state
            .sessions
            .spawn_cleanup(config.session.cleanup_interval);

        let result = axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await;
        sweeper.abort();
        result?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
