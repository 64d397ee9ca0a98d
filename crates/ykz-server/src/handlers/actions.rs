//! POST actions behind the admin guard.
//!
//! Each action validates its form, performs exactly one bot API call and
//! redirects back to its page with a toast. Invalid input never reaches the
//! bot API.

use std::str::FromStr;

use axum::Form;
use axum::extract::State;
use axum::response::Redirect;
use serde::Deserialize;
use serde_json::{Map, Value};
use ykz_bot_api::{BalanceMode, BalanceUpdate, ShopItem, XpUpdate};

use crate::server::AppState;
use crate::views::{redirect_with_error, redirect_with_toast};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SettingsForm {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BalanceForm {
    pub user_id: String,
    pub amount: String,
    pub mode: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ShopItemForm {
    pub id: String,
    pub name: String,
    pub price: String,
    pub description: String,
    pub role_id: String,
    pub stock: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ShopDeleteForm {
    pub id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct XpForm {
    pub min_xp: String,
    pub max_xp: String,
    pub cooldown_seconds: String,
    pub multiplier: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AdminForm {
    pub user_id: String,
}

fn required<'a>(value: &'a str, label: &str) -> Result<&'a str, String> {
    let value = value.trim();
    if value.is_empty() {
        Err(format!("{label} is required"))
    } else {
        Ok(value)
    }
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_required<T: FromStr>(value: &str, label: &str) -> Result<T, String> {
    let raw = required(value, label)?;
    raw.parse()
        .map_err(|_| format!("{label} must be a number, got {raw:?}"))
}

fn parse_optional<T: FromStr>(value: &str, label: &str) -> Result<Option<T>, String> {
    match optional(value) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| format!("{label} must be a number, got {raw:?}")),
        None => Ok(None),
    }
}

impl SettingsForm {
    /// Builds the partial settings object. Scalars that parse as JSON are
    /// sent typed, everything else as a string.
    fn changes(&self) -> Result<Map<String, Value>, String> {
        let key = required(&self.key, "Key")?;
        let raw = self.value.trim();
        let value = match serde_json::from_str::<Value>(raw) {
            Ok(v @ (Value::Number(_) | Value::Bool(_) | Value::Null)) => v,
            _ => Value::String(raw.to_string()),
        };
        let mut changes = Map::new();
        changes.insert(key.to_string(), value);
        Ok(changes)
    }
}

impl TryFrom<&BalanceForm> for BalanceUpdate {
    type Error = String;

    fn try_from(form: &BalanceForm) -> Result<Self, Self::Error> {
        let mode = match form.mode.trim().to_ascii_lowercase().as_str() {
            "" | "add" => BalanceMode::Add,
            "set" => BalanceMode::Set,
            other => return Err(format!("Unknown balance mode {other:?}")),
        };
        Ok(Self {
            user_id: required(&form.user_id, "User ID")?.to_string(),
            amount: parse_required(&form.amount, "Amount")?,
            mode,
        })
    }
}

impl ShopItemForm {
    fn item(&self, with_id: bool) -> Result<ShopItem, String> {
        let id = if with_id {
            Some(required(&self.id, "Item ID")?.to_string())
        } else {
            None
        };
        let price: i64 = parse_required(&self.price, "Price")?;
        if price < 0 {
            return Err("Price must not be negative".to_string());
        }
        Ok(ShopItem {
            id,
            name: required(&self.name, "Name")?.to_string(),
            price,
            description: optional(&self.description),
            role_id: optional(&self.role_id),
            stock: parse_optional(&self.stock, "Stock")?,
        })
    }
}

impl TryFrom<&XpForm> for XpUpdate {
    type Error = String;

    fn try_from(form: &XpForm) -> Result<Self, Self::Error> {
        let update = Self {
            min_xp: parse_optional(&form.min_xp, "Min XP")?,
            max_xp: parse_optional(&form.max_xp, "Max XP")?,
            cooldown_seconds: parse_optional(&form.cooldown_seconds, "Cooldown")?,
            multiplier: parse_optional(&form.multiplier, "Multiplier")?,
        };
        if update == Self::default() {
            return Err("Nothing to update".to_string());
        }
        if let (Some(min), Some(max)) = (update.min_xp, update.max_xp)
            && min > max
        {
            return Err("Min XP must not exceed Max XP".to_string());
        }
        Ok(update)
    }
}

pub async fn update_settings(
    State(state): State<AppState>,
    Form(form): Form<SettingsForm>,
) -> Redirect {
    let changes = match form.changes() {
        Ok(changes) => changes,
        Err(msg) => return redirect_with_error("/settings", &msg),
    };
    let response = state.bot_api.update_settings(&changes).await;
    redirect_with_toast("/settings", &response, "Settings saved", "Saving settings failed")
}

pub async fn update_balance(
    State(state): State<AppState>,
    Form(form): Form<BalanceForm>,
) -> Redirect {
    let update = match BalanceUpdate::try_from(&form) {
        Ok(update) => update,
        Err(msg) => return redirect_with_error("/balance", &msg),
    };
    let back = format!("/balance?user_id={}", urlencoding::encode(&update.user_id));
    let response = state.bot_api.update_balance(&update).await;
    redirect_with_toast(&back, &response, "Balance updated", "Balance update failed")
}

pub async fn add_shop_item(
    State(state): State<AppState>,
    Form(form): Form<ShopItemForm>,
) -> Redirect {
    let item = match form.item(false) {
        Ok(item) => item,
        Err(msg) => return redirect_with_error("/shop", &msg),
    };
    let response = state.bot_api.add_shop_item(&item).await;
    redirect_with_toast("/shop", &response, "Item added", "Adding item failed")
}

pub async fn update_shop_item(
    State(state): State<AppState>,
    Form(form): Form<ShopItemForm>,
) -> Redirect {
    let item = match form.item(true) {
        Ok(item) => item,
        Err(msg) => return redirect_with_error("/shop", &msg),
    };
    let response = state.bot_api.update_shop_item(&item).await;
    redirect_with_toast("/shop", &response, "Item updated", "Updating item failed")
}

pub async fn delete_shop_item(
    State(state): State<AppState>,
    Form(form): Form<ShopDeleteForm>,
) -> Redirect {
    let id = match required(&form.id, "Item ID") {
        Ok(id) => id,
        Err(msg) => return redirect_with_error("/shop", &msg),
    };
    let response = state.bot_api.delete_shop_item(id).await;
    redirect_with_toast("/shop", &response, "Item deleted", "Deleting item failed")
}

pub async fn update_xp(State(state): State<AppState>, Form(form): Form<XpForm>) -> Redirect {
    let update = match XpUpdate::try_from(&form) {
        Ok(update) => update,
        Err(msg) => return redirect_with_error("/xp", &msg),
    };
    let response = state.bot_api.update_xp(&update).await;
    redirect_with_toast("/xp", &response, "XP settings saved", "Saving XP settings failed")
}

pub async fn add_admin(State(state): State<AppState>, Form(form): Form<AdminForm>) -> Redirect {
    let user_id = match required(&form.user_id, "User ID") {
        Ok(id) => id,
        Err(msg) => return redirect_with_error("/admins", &msg),
    };
    let response = state.bot_api.add_admin(user_id).await;
    redirect_with_toast("/admins", &response, "Admin added", "Adding admin failed")
}

pub async fn remove_admin(State(state): State<AppState>, Form(form): Form<AdminForm>) -> Redirect {
    let user_id = match required(&form.user_id, "User ID") {
        Ok(id) => id,
        Err(msg) => return redirect_with_error("/admins", &msg),
    };
    let response = state.bot_api.remove_admin(user_id).await;
    redirect_with_toast("/admins", &response, "Admin removed", "Removing admin failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn settings_values_are_typed_when_scalar() {
        let form = |value: &str| SettingsForm {
            key: " prefix ".into(),
            value: value.into(),
        };
        assert_eq!(form("!").changes().unwrap()["prefix"], json!("!"));
        assert_eq!(form("5").changes().unwrap()["prefix"], json!(5));
        assert_eq!(form("true").changes().unwrap()["prefix"], json!(true));
        assert_eq!(form("[1]").changes().unwrap()["prefix"], json!("[1]"));
        assert!(
            SettingsForm {
                key: "  ".into(),
                value: "x".into()
            }
            .changes()
            .is_err()
        );
    }

    #[test]
    fn balance_form_validation() {
        let update = BalanceUpdate::try_from(&BalanceForm {
            user_id: " 7 ".into(),
            amount: "-25".into(),
            mode: "".into(),
        })
        .unwrap();
        assert_eq!(update.user_id, "7");
        assert_eq!(update.amount, -25);
        assert_eq!(update.mode, BalanceMode::Add);

        let bad_amount = BalanceForm {
            user_id: "7".into(),
            amount: "ten".into(),
            mode: "set".into(),
        };
        assert!(BalanceUpdate::try_from(&bad_amount).is_err());

        let bad_mode = BalanceForm {
            user_id: "7".into(),
            amount: "1".into(),
            mode: "double".into(),
        };
        assert!(BalanceUpdate::try_from(&bad_mode).is_err());
    }

    #[test]
    fn shop_form_validation() {
        let form = ShopItemForm {
            id: "".into(),
            name: "VIP".into(),
            price: "100".into(),
            description: "  ".into(),
            role_id: "55".into(),
            stock: "".into(),
        };
        let item = form.item(false).unwrap();
        assert_eq!(item.id, None);
        assert_eq!(item.description, None);
        assert_eq!(item.role_id.as_deref(), Some("55"));
        assert_eq!(item.stock, None);

        assert!(form.item(true).is_err());

        let negative = ShopItemForm {
            price: "-1".into(),
            ..form
        };
        assert!(negative.item(false).is_err());
    }

    #[test]
    fn xp_form_validation() {
        let update = XpUpdate::try_from(&XpForm {
            min_xp: "5".into(),
            max_xp: "15".into(),
            multiplier: "1.5".into(),
            ..XpForm::default()
        })
        .unwrap();
        assert_eq!(update.min_xp, Some(5));
        assert_eq!(update.max_xp, Some(15));
        assert_eq!(update.cooldown_seconds, None);
        assert_eq!(update.multiplier, Some(1.5));

        assert!(XpUpdate::try_from(&XpForm::default()).is_err());
        assert!(
            XpUpdate::try_from(&XpForm {
                min_xp: "20".into(),
                max_xp: "10".into(),
                ..XpForm::default()
            })
            .is_err()
        );
    }
}
