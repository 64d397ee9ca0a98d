//! `GET /check`: unauthenticated status probe.
//!
//! Never runs the authorization gate. Bot API failures are reported in the
//! JSON body instead of failing the probe.

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use serde_json::Value;
use ykz_auth::CurrentIdentity;
use ykz_bot_api::ApiResponse;

use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub ok: bool,
    /// `/api/health` envelope as returned (or the failure envelope).
    pub health: Value,
    pub logged_in: bool,
    pub discord_id: Option<String>,
    pub is_admin: bool,
    pub admin_role_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_error: Option<String>,
}

pub async fn check(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Json<CheckReport> {
    let health = state.bot_api.health().await;

    let mut report = CheckReport {
        ok: true,
        health: health.to_envelope(),
        logged_in: identity.is_some(),
        discord_id: identity.as_ref().map(|i| i.id.clone()),
        is_admin: false,
        admin_role_id: None,
        admin_error: None,
    };

    if let Some(identity) = identity {
        let response = state.bot_api.admin_check(&identity.id).await;
        match admin_fields(&response) {
            Some((is_admin, role_id)) => {
                report.is_admin = is_admin;
                report.admin_role_id = role_id;
            }
            None => {
                report.admin_error = Some(
                    response
                        .diagnostic()
                        .unwrap_or_else(|| "admin check returned no is_admin flag".to_string()),
                );
            }
        }
    }

    Json(report)
}

/// Reads `is_admin` and `admin_role_id` from an admin-check response.
///
/// Falsy role ids (`null`, `""`, `0`, `false`) are reported as absent.
fn admin_fields(response: &ApiResponse) -> Option<(bool, Option<Value>)> {
    let data = response.data()?;
    let is_admin = data.get("is_admin")?.as_bool()?;
    let role_id = data.get("admin_role_id").cloned().filter(|v| match v {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        _ => true,
    });
    Some((is_admin, role_id))
}
