//! Session storage.
//!
//! The dashboard keeps sessions in process memory; the [`SessionStore`] trait
//! is the seam for anything more durable.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use time::OffsetDateTime;

use super::{Session, SessionId};
use crate::error::AuthError;

/// Storage trait for browser sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads a session. Returns `None` if it does not exist or has expired.
    ///
    /// Loading refreshes the idle deadline.
    async fn load(&self, id: &SessionId) -> Result<Option<Session>, AuthError>;

    /// Inserts or replaces a session.
    async fn save(&self, id: &SessionId, session: &Session) -> Result<(), AuthError>;

    /// Removes a session. Removing a missing session is not an error.
    async fn destroy(&self, id: &SessionId) -> Result<(), AuthError>;

    /// Removes expired sessions, returning how many were dropped.
    async fn cleanup_expired(&self) -> Result<u64, AuthError>;
}

struct StoredSession {
    session: Session,
    expires_at: OffsetDateTime,
}

/// In-memory session store with an idle TTL.
pub struct MemorySessionStore {
    sessions: DashMap<SessionId, StoredSession>,
    ttl: Duration,
}

impl MemorySessionStore {
    /// Creates an empty store whose sessions expire after `ttl` of inactivity.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Number of records currently held, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn deadline(&self, now: OffsetDateTime) -> OffsetDateTime {
        now + self.ttl
    }

    fn load_at(&self, id: &SessionId, now: OffsetDateTime) -> Option<Session> {
        let mut entry = self.sessions.get_mut(id)?;
        if entry.expires_at <= now {
            drop(entry);
            self.sessions.remove(id);
            return None;
        }
        entry.expires_at = self.deadline(now);
        Some(entry.session.clone())
    }

    fn save_at(&self, id: &SessionId, session: &Session, now: OffsetDateTime) {
        self.sessions.insert(
            id.clone(),
            StoredSession {
                session: session.clone(),
                expires_at: self.deadline(now),
            },
        );
    }

    fn cleanup_at(&self, now: OffsetDateTime) -> u64 {
        // Requests may insert into already swept shards, so count in place.
        let mut removed = 0u64;
        self.sessions.retain(|_, stored| {
            let live = stored.expires_at > now;
            if !live {
                removed += 1;
            }
            live
        });
        removed
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &SessionId) -> Result<Option<Session>, AuthError> {
        Ok(self.load_at(id, OffsetDateTime::now_utc()))
    }

    async fn save(&self, id: &SessionId, session: &Session) -> Result<(), AuthError> {
        self.save_at(id, session, OffsetDateTime::now_utc());
        Ok(())
    }

    async fn destroy(&self, id: &SessionId) -> Result<(), AuthError> {
        self.sessions.remove(id);
        Ok(())
    }

    async fn cleanup_expired(&self) -> Result<u64, AuthError> {
        Ok(self.cleanup_at(OffsetDateTime::now_utc()))
    }
}
