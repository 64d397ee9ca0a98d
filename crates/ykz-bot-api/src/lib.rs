//! # ykz-bot-api
//!
//! Client for the bot API, the service of record for balances, the shop,
//! XP settings, the admin list and audit logs.
//!
//! Every call sends the shared secret in [`API_KEY_HEADER`] and resolves to
//! an [`ApiResponse`]: transport faults and non-JSON bodies are values, not
//! errors. [`is_success`] is the one place that decides whether a parsed
//! body means "ok".
//!
//! [`BotApiClient`] also implements [`ykz_auth::AdminDirectory`], which is
//! how the authorization gate reaches the admin list.

pub mod admin;
pub mod client;
pub mod endpoints;
pub mod envelope;
pub mod error;

pub use client::{API_KEY_HEADER, BotApiClient, BotApiConfig};
pub use endpoints::{
    AdminStatus, BalanceMode, BalanceUpdate, DEFAULT_LOG_LIMIT, MAX_LOG_LIMIT, ShopItem, XpUpdate,
    clamp_log_limit,
};
pub use envelope::{ApiResponse, is_success};
pub use error::{BotApiError, BotApiResult};
