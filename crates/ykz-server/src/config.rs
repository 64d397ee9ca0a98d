use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use ykz_auth::{AccessConfig, DiscordConfig, SessionConfig, normalize_callback_url, normalize_url};
use ykz_bot_api::BotApiConfig;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    /// Discord OAuth application
    #[serde(default)]
    pub discord: DiscordConfig,
    /// Session cookie and store
    #[serde(default)]
    pub session: SessionConfig,
    /// Bot API connection
    #[serde(default)]
    pub bot_api: BotApiConfig,
    /// Site visibility switches and owner override
    #[serde(default)]
    pub access: AccessConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.body_limit_bytes == 0 {
            return Err("server.body_limit_bytes must be > 0".into());
        }
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        if self.session.secret.is_empty() {
            return Err("session.secret must not be empty".into());
        }
        if url::Url::parse(&self.bot_api.base_url).is_err() {
            return Err(format!(
                "bot_api.base_url is not a valid URL: {:?}",
                self.bot_api.base_url
            ));
        }
        Ok(())
    }

    /// Trims trailing slashes and stray whitespace from URL settings.
    pub fn normalize(&mut self) {
        self.server.base_url = self.server.base_url.as_deref().and_then(normalize_url);
        if let Some(base) = normalize_url(&self.bot_api.base_url) {
            self.bot_api.base_url = base;
        }
        self.access.owner_id = self.access.owner().map(str::to_string);
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }

    /// Returns the externally visible base URL.
    /// If `base_url` is configured, returns that; otherwise `http://localhost:{port}`.
    pub fn base_url(&self) -> String {
        self.server
            .base_url
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}", self.server.port))
    }

    /// OAuth callback URL registered with Discord, if one can be derived.
    pub fn callback_url(&self) -> Option<String> {
        normalize_callback_url(
            self.discord.callback_url.as_deref(),
            self.discord.redirect_uri.as_deref(),
            self.server.base_url.as_deref(),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public base URL (`BASE_URL`), used for the default callback URL.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    3000
}
fn default_body_limit() -> usize {
    64 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: None,
            body_limit_bytes: default_body_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Parses a deployment switch. `1`, `true`, `yes` and `on` mean on.
pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

pub mod loader {
    use super::{AppConfig, parse_flag};
    use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
    use std::collections::HashMap;
    use std::path::PathBuf;

    /// Flat deployment variables and the config keys they set.
    const STRING_OVERRIDES: [(&str, &str); 8] = [
        ("BASE_URL", "server.base_url"),
        ("DISCORD_CLIENT_ID", "discord.client_id"),
        ("DISCORD_CLIENT_SECRET", "discord.client_secret"),
        ("DISCORD_CALLBACK_URL", "discord.callback_url"),
        ("DISCORD_REDIRECT_URI", "discord.redirect_uri"),
        ("SESSION_SECRET", "session.secret"),
        ("BOT_API_BASE", "bot_api.base_url"),
        ("BOT_API_KEY", "bot_api.api_key"),
    ];

    const FLAG_OVERRIDES: [(&str, &str); 2] = [
        ("SITE_PRIVATE", "access.private"),
        ("SITE_ADMIN_ONLY", "access.admin_only"),
    ];

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        load_config_with_env(path, &vars)
    }

    /// Loads configuration from an optional TOML file and an explicit set of
    /// environment variables.
    ///
    /// Precedence, lowest first: file, `YKZ__SECTION__KEY` variables, flat
    /// deployment variables (`PORT`, `SITE_PRIVATE`, ...). Blank flat
    /// variables are ignored.
    pub fn load_config_with_env(
        path: Option<&str>,
        vars: &HashMap<String, String>,
    ) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if pathbuf.exists() {
                    builder = builder.add_source(File::from(pathbuf));
                }
            }
            None => {
                let default_path = PathBuf::from("ykz.toml");
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        // Structured overrides, e.g. YKZ__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("YKZ")
                .try_parsing(true)
                .separator("__")
                .source(Some(vars.clone())),
        );
        builder = apply_flat_overrides(builder, vars)?;

        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let mut merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.normalize();
        merged.validate()?;
        Ok(merged)
    }

    fn apply_flat_overrides(
        mut builder: ConfigBuilder<DefaultState>,
        vars: &HashMap<String, String>,
    ) -> Result<ConfigBuilder<DefaultState>, String> {
        let value = |name: &str| {
            vars.get(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(port) = value("PORT") {
            let port: u16 = port
                .parse()
                .map_err(|_| format!("PORT must be a port number, got {port:?}"))?;
            builder = builder
                .set_override("server.port", i64::from(port))
                .map_err(|e| format!("config override error: {e}"))?;
        }
        for (var, key) in STRING_OVERRIDES {
            builder = builder
                .set_override_option(key, value(var))
                .map_err(|e| format!("config override error: {e}"))?;
        }
        for (var, key) in FLAG_OVERRIDES {
            builder = builder
                .set_override_option(key, value(var).map(|v| parse_flag(&v)))
                .map_err(|e| format!("config override error: {e}"))?;
        }
        builder = builder
            .set_override_option("access.owner_id", value("OWNER_ID"))
            .map_err(|e| format!("config override error: {e}"))?;
        Ok(builder)
    }
}
