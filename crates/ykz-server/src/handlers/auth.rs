//! Login, OAuth callback and logout.
//!
//! Every OAuth failure ends on `/` without an error page; the cause is only
//! logged.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Redirect;
use axum_extra::extract::cookie::SignedCookieJar;
use serde::Deserialize;
use time::OffsetDateTime;
use ykz_auth::{AuthError, DiscordOAuth, Session, SessionHandle, SessionId, generate_state};

use crate::error::PageError;
use crate::extract::QueryParams;
use crate::server::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

pub async fn login(
    State(state): State<AppState>,
    handle: SessionHandle,
) -> Result<Redirect, PageError> {
    let Some(oauth) = state.oauth.as_deref() else {
        return Err(PageError::internal(
            "Discord callback URL is not configured (set DISCORD_CALLBACK_URL or BASE_URL)",
        ));
    };

    let mut session = state.sessions.load(&handle.id).await?;
    let oauth_state = generate_state();
    let url = oauth.authorization_url(&oauth_state)?;
    session.oauth_state = Some(oauth_state);
    state.sessions.save(&handle.id, &session).await?;

    Ok(Redirect::to(url.as_str()))
}

pub async fn callback(
    State(state): State<AppState>,
    handle: SessionHandle,
    headers: HeaderMap,
    QueryParams(query): QueryParams<CallbackQuery>,
) -> (SignedCookieJar, Redirect) {
    let jar = state.sessions.jar(&headers);
    let Some(oauth) = state.oauth.as_deref() else {
        tracing::warn!("OAuth callback hit without a configured callback URL");
        return (jar, Redirect::to("/"));
    };

    match complete_login(&state, oauth, &handle, query).await {
        Ok(id) => {
            tracing::info!(session = %id, "Operator logged in");
            (jar.add(state.sessions.cookie(&id)), Redirect::to("/dashboard"))
        }
        Err(e) => {
            tracing::warn!(error = %e, "OAuth login failed");
            (jar, Redirect::to("/"))
        }
    }
}

/// Validates the callback, resolves the identity and binds it to a fresh
/// session id.
async fn complete_login(
    state: &AppState,
    oauth: &DiscordOAuth,
    handle: &SessionHandle,
    query: CallbackQuery,
) -> Result<SessionId, AuthError> {
    if let Some(error) = query.error {
        return Err(AuthError::identity_provider("discord", error));
    }

    // The stored state is single use, whatever the outcome.
    let expected = if handle.is_new {
        None
    } else {
        let mut session = state.sessions.load(&handle.id).await?;
        let expected = session.take_oauth_state();
        if expected.is_some() {
            state.sessions.save(&handle.id, &session).await?;
        }
        expected
    };

    let (Some(expected), Some(received)) = (expected, query.state) else {
        return Err(AuthError::invalid_request("missing OAuth state"));
    };
    if expected != received {
        return Err(AuthError::invalid_request("OAuth state mismatch"));
    }
    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AuthError::invalid_request("missing authorization code"))?;

    let identity = oauth.complete(&code).await?;
    tracing::debug!(user_id = %identity.id, "Discord identity resolved");

    let session = Session::authenticated(identity, OffsetDateTime::now_utc());
    state.sessions.rotate(&handle.id, &session).await
}

pub async fn logout(
    State(state): State<AppState>,
    handle: SessionHandle,
    headers: HeaderMap,
) -> (SignedCookieJar, Redirect) {
    if !handle.is_new
        && let Err(e) = state.sessions.destroy(&handle.id).await
    {
        tracing::warn!(error = %e, "Failed to destroy session on logout");
    }
    let jar = state
        .sessions
        .jar(&headers)
        .remove(state.sessions.removal_cookie());
    (jar, Redirect::to("/"))
}
