//! Cookie-backed session management.
//!
//! [`SessionManager`] ties the signed session cookie to a [`SessionStore`].
//! [`session_layer`] resolves the session id for every request and exposes it
//! to downstream middleware and handlers as a [`SessionHandle`]. The session
//! record itself is always loaded and saved explicitly, never injected.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{FromRef, FromRequestParts, Request, State};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use sha2::{Digest, Sha512};
use tokio::task::JoinHandle;

use super::store::{MemorySessionStore, SessionStore};
use super::{Identity, Session, SessionId};
use crate::config::SessionConfig;
use crate::error::AuthError;

/// Session id resolved for the current request.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    /// Session id from the cookie, or a freshly generated one.
    pub id: SessionId,
    /// `true` if the request carried no valid session cookie.
    pub is_new: bool,
}

impl<S> FromRequestParts<S> for SessionHandle
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionHandle>()
            .cloned()
            .ok_or_else(|| AuthError::internal("session layer is not installed"))
    }
}

/// Identity bound to the current session, if any.
///
/// Requires [`session_layer`] and a state that yields a [`SessionManager`].
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Option<Identity>);

impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
    SessionManager: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let handle = SessionHandle::from_request_parts(parts, state).await?;
        if handle.is_new {
            return Ok(Self(None));
        }
        let manager = SessionManager::from_ref(state);
        let session = manager.load(&handle.id).await?;
        Ok(Self(session.identity))
    }
}

/// Owns the session store and the cookie signing key.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    key: Key,
    cookie_name: String,
    secure: bool,
}

impl SessionManager {
    /// Creates a manager over `store` using the cookie settings from `config`.
    #[must_use]
    pub fn new(config: &SessionConfig, store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            key: derive_key(&config.secret),
            cookie_name: config.cookie_name.clone(),
            secure: config.secure_cookie,
        }
    }

    /// Creates a manager backed by a [`MemorySessionStore`].
    #[must_use]
    pub fn in_memory(config: &SessionConfig) -> Self {
        Self::new(config, Arc::new(MemorySessionStore::new(config.ttl)))
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Name of the session cookie.
    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Builds a signed cookie jar over the request headers.
    #[must_use]
    pub fn jar(&self, headers: &HeaderMap) -> SignedCookieJar {
        SignedCookieJar::from_headers(headers, self.key.clone())
    }

    /// Reads the session id from a verified cookie.
    #[must_use]
    pub fn session_id(&self, jar: &SignedCookieJar) -> Option<SessionId> {
        jar.get(&self.cookie_name)
            .and_then(|cookie| SessionId::parse(cookie.value()))
    }

    /// Cookie carrying `id`.
    #[must_use]
    pub fn cookie(&self, id: &SessionId) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), id.as_str().to_owned()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .build()
    }

    /// Cookie that removes the session cookie from the browser.
    #[must_use]
    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), String::new()))
            .path("/")
            .build()
    }

    /// Loads the session for `id`, or an empty one if nothing is stored.
    pub async fn load(&self, id: &SessionId) -> Result<Session, AuthError> {
        Ok(self.store.load(id).await?.unwrap_or_default())
    }

    /// Persists `session` under `id`.
    pub async fn save(&self, id: &SessionId, session: &Session) -> Result<(), AuthError> {
        self.store.save(id, session).await
    }

    /// Destroys the session stored under `id`.
    pub async fn destroy(&self, id: &SessionId) -> Result<(), AuthError> {
        self.store.destroy(id).await
    }

    /// Replaces the session under `old` with `session` under a new id.
    ///
    /// Used on login so a pre-authentication cookie never carries an identity.
    pub async fn rotate(
        &self,
        old: &SessionId,
        session: &Session,
    ) -> Result<SessionId, AuthError> {
        self.store.destroy(old).await?;
        let id = SessionId::generate();
        self.store.save(&id, session).await?;
        Ok(id)
    }

    /// Spawns a task that sweeps expired sessions every `every`.
    pub fn spawn_cleanup(&self, every: Duration) -> JoinHandle<()> {
        let store = self.store.clone();
        let every = every.max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match store.cleanup_expired().await {
                    Ok(0) => {}
                    Ok(removed) => tracing::debug!(removed, "Expired sessions swept"),
                    Err(e) => tracing::warn!(error = %e, "Session sweep failed"),
                }
            }
        })
    }
}

fn derive_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

/// Middleware that resolves the session id for every request.
///
/// Requests without a valid signed cookie get a fresh id. The cookie for a
/// fresh id is only issued if a handler actually stored a session under it.
pub async fn session_layer(
    State(manager): State<SessionManager>,
    mut req: Request,
    next: Next,
) -> Response {
    let jar = manager.jar(req.headers());
    let handle = match manager.session_id(&jar) {
        Some(id) => SessionHandle { id, is_new: false },
        None => SessionHandle {
            id: SessionId::generate(),
            is_new: true,
        },
    };
    req.extensions_mut().insert(handle.clone());

    let response = next.run(req).await;
    if !handle.is_new {
        return response;
    }

    match manager.store.load(&handle.id).await {
        Ok(Some(_)) => {
            tracing::debug!(session = %handle.id, "Session cookie issued");
            (jar.add(manager.cookie(&handle.id)), response).into_response()
        }
        Ok(None) => response,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to check new session");
            response
        }
    }
}
