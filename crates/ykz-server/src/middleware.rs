use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use time::OffsetDateTime;
use uuid::Uuid;
use ykz_auth::{DenyReason, GateDecision, Requirement, SessionHandle};

use crate::error::PageError;
use crate::server::AppState;

pub async fn request_id(mut req: Request, next: Next) -> Response {
    let header_name = HeaderName::from_static("x-request-id");

    // Preserve an incoming request id, otherwise generate one
    let req_id_value = req
        .headers()
        .get(&header_name)
        .cloned()
        .or_else(|| HeaderValue::try_from(Uuid::new_v4().to_string()).ok());

    let Some(req_id_value) = req_id_value else {
        return next.run(req).await;
    };

    // Add to request extensions for downstream usage (e.g., logging)
    req.extensions_mut().insert(req_id_value.clone());

    let mut res = next.run(req).await;
    res.headers_mut().insert(header_name, req_id_value);
    res
}

/// Deployment-wide access policy (`SITE_PRIVATE` / `SITE_ADMIN_ONLY`).
///
/// Runs before every route guard. Open paths pass untouched.
pub async fn site_access(
    State(state): State<AppState>,
    handle: SessionHandle,
    req: Request,
    next: Next,
) -> Response {
    let requirement = state.policy.requirement(req.uri().path());
    if let Err(err) = enforce(&state, &handle, requirement).await {
        tracing::debug!(path = %req.uri().path(), outcome = %err, "Site access refused");
        return err.into_response();
    }
    next.run(req).await
}

/// Route guard for the admin pages and their actions.
pub async fn require_admin(
    State(state): State<AppState>,
    handle: SessionHandle,
    req: Request,
    next: Next,
) -> Response {
    match enforce(&state, &handle, Requirement::Admin).await {
        Ok(()) => next.run(req).await,
        Err(err) => err.into_response(),
    }
}

/// Applies `requirement` to the session behind `handle`.
///
/// A verdict written by the gate is persisted before returning.
async fn enforce(
    state: &AppState,
    handle: &SessionHandle,
    requirement: Requirement,
) -> Result<(), PageError> {
    if requirement == Requirement::Open {
        return Ok(());
    }
    if handle.is_new {
        return Err(PageError::LoginRequired);
    }

    let mut session = state.sessions.load(&handle.id).await?;
    let Some(identity) = session.identity.clone() else {
        return Err(PageError::LoginRequired);
    };
    if requirement == Requirement::Login {
        return Ok(());
    }

    let before = session.verdict;
    let decision = state
        .gate
        .authorize(&mut session, &state.bot_api, OffsetDateTime::now_utc())
        .await
        .map_err(|e| PageError::Upstream {
            identity: Some(identity.clone()),
            message: e.to_string(),
        })?;

    if session.verdict != before {
        state.sessions.save(&handle.id, &session).await?;
    }

    match decision {
        GateDecision::Allow => Ok(()),
        GateDecision::Deny(DenyReason::Unauthenticated) => Err(PageError::LoginRequired),
        GateDecision::Deny(DenyReason::Forbidden) => {
            tracing::info!(user_id = %identity.id, "Admin access denied");
            Err(PageError::Forbidden {
                identity: Some(identity),
            })
        }
    }
}
