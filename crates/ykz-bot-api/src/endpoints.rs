//! Typed wrappers over the bot API routes the dashboard uses.
//!
//! Reads and mutations return the raw [`ApiResponse`] envelope; only the
//! admin check decodes into a typed value because the gate needs a boolean.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::BotApiClient;
use crate::envelope::ApiResponse;
use crate::error::BotApiResult;

/// Upper bound accepted for `/api/logs?limit=`.
pub const MAX_LOG_LIMIT: u32 = 500;

/// Limit used when none is given.
pub const DEFAULT_LOG_LIMIT: u32 = 50;

/// Answer of `/api/auth/is_admin`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AdminStatus {
    /// Whether the user holds the admin role.
    pub is_admin: bool,
    /// Role id the bot treats as admin, as the bot reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_role_id: Option<Value>,
}

/// Balance change request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceUpdate {
    /// Target user.
    pub user_id: String,
    /// Amount to apply.
    pub amount: i64,
    /// `add` (relative) or `set` (absolute).
    pub mode: BalanceMode,
}

/// How a balance amount is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BalanceMode {
    /// Add the amount (negative subtracts).
    #[default]
    Add,
    /// Replace the balance.
    Set,
}

/// Shop item as submitted by the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShopItem {
    /// Item id; absent when adding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display name.
    pub name: String,
    /// Price in coins.
    pub price: i64,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Discord role granted on purchase.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_id: Option<String>,
    /// Remaining stock; absent means unlimited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
}

/// XP configuration change.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct XpUpdate {
    /// Minimum XP per message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_xp: Option<i64>,
    /// Maximum XP per message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_xp: Option<i64>,
    /// Seconds between rewarded messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooldown_seconds: Option<i64>,
    /// Multiplier applied to the level curve.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<f64>,
}

#[derive(Serialize)]
struct UserRef<'a> {
    user_id: &'a str,
}

#[derive(Serialize)]
struct ItemRef<'a> {
    id: &'a str,
}

/// Clamps a requested log limit into `1..=MAX_LOG_LIMIT`.
#[must_use]
pub fn clamp_log_limit(requested: Option<u32>) -> u32 {
    requested
        .unwrap_or(DEFAULT_LOG_LIMIT)
        .clamp(1, MAX_LOG_LIMIT)
}

impl BotApiClient {
    /// `GET /api/health`
    pub async fn health(&self) -> ApiResponse {
        self.get("/api/health").await
    }

    /// Raw `GET /api/auth/is_admin?user_id=`.
    pub async fn admin_check(&self, user_id: &str) -> ApiResponse {
        self.get_with_query("/api/auth/is_admin", &[("user_id", user_id)])
            .await
    }

    /// Decoded admin check.
    ///
    /// A missing or non-boolean `is_admin` is an error, never `false`.
    pub async fn admin_status(&self, user_id: &str) -> BotApiResult<AdminStatus> {
        self.admin_check(user_id).await.decode()
    }

    /// `GET /api/stats`
    pub async fn stats(&self) -> ApiResponse {
        self.get("/api/stats").await
    }

    /// `GET /api/settings`
    pub async fn settings(&self) -> ApiResponse {
        self.get("/api/settings").await
    }

    /// `POST /api/settings` with a partial settings object.
    pub async fn update_settings(&self, changes: &serde_json::Map<String, Value>) -> ApiResponse {
        self.post("/api/settings", changes).await
    }

    /// `GET /api/balance?user_id=`
    pub async fn balance(&self, user_id: &str) -> ApiResponse {
        self.get_with_query("/api/balance", &[("user_id", user_id)])
            .await
    }

    /// `POST /api/balance`
    pub async fn update_balance(&self, update: &BalanceUpdate) -> ApiResponse {
        self.post("/api/balance", update).await
    }

    /// `GET /api/shop`
    pub async fn shop(&self) -> ApiResponse {
        self.get("/api/shop").await
    }

    /// `POST /api/shop/add`
    pub async fn add_shop_item(&self, item: &ShopItem) -> ApiResponse {
        self.post("/api/shop/add", item).await
    }

    /// `POST /api/shop/update`
    pub async fn update_shop_item(&self, item: &ShopItem) -> ApiResponse {
        self.post("/api/shop/update", item).await
    }

    /// `POST /api/shop/delete`
    pub async fn delete_shop_item(&self, id: &str) -> ApiResponse {
        self.post("/api/shop/delete", &ItemRef { id }).await
    }

    /// `GET /api/xp`
    pub async fn xp(&self) -> ApiResponse {
        self.get("/api/xp").await
    }

    /// `POST /api/xp`
    pub async fn update_xp(&self, update: &XpUpdate) -> ApiResponse {
        self.post("/api/xp", update).await
    }

    /// `GET /api/logs?limit=`, with the limit clamped.
    pub async fn logs(&self, limit: Option<u32>) -> ApiResponse {
        let limit = clamp_log_limit(limit).to_string();
        self.get_with_query("/api/logs", &[("limit", limit.as_str())])
            .await
    }

    /// `GET /api/admins`
    pub async fn admins(&self) -> ApiResponse {
        self.get("/api/admins").await
    }

    /// `POST /api/admins/add`
    pub async fn add_admin(&self, user_id: &str) -> ApiResponse {
        self.post("/api/admins/add", &UserRef { user_id }).await
    }

    /// `POST /api/admins/remove`
    pub async fn remove_admin(&self, user_id: &str) -> ApiResponse {
        self.post("/api/admins/remove", &UserRef { user_id }).await
    }
}
