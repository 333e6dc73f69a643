// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-side sessions bound to a signed cookie.
//!
//! The cookie carries only an opaque random id; the user id and a snapshot
//! of the public profile live in the in-process store. Records expire after
//! 24 hours without activity.

use crate::config::Environment;
use crate::models::{PublicUser, User};
use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha512};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "narrisia_sid";

/// Idle lifetime of a session.
pub const SESSION_TTL_HOURS: i64 = 24;

const SESSION_ID_BYTES: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to generate session id")]
    Rng,
}

/// Server-side session state.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub user_id: String,
    pub user: PublicUser,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// In-process session store keyed by session id.
pub struct SessionStore {
    sessions: DashMap<String, SessionRecord>,
    ttl: Duration,
    rng: SystemRandom,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl(Duration::hours(SESSION_TTL_HOURS))
    }
}

impl SessionStore {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
            rng: SystemRandom::new(),
        }
    }

    fn new_id(&self) -> Result<String, SessionError> {
        let mut bytes = [0u8; SESSION_ID_BYTES];
        self.rng.fill(&mut bytes).map_err(|_| SessionError::Rng)?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Create a session for `user` and return its id.
    pub fn create(&self, user: &User) -> Result<String, SessionError> {
        let id = self.new_id()?;
        let now = Utc::now();
        self.sessions.insert(
            id.clone(),
            SessionRecord {
                user_id: user.id.clone(),
                user: PublicUser::from(user),
                created_at: now,
                expires_at: now + self.ttl,
            },
        );
        Ok(id)
    }

    /// Look up a live session, extending its expiry.
    ///
    /// Expired records are removed on access.
    pub fn get(&self, id: &str) -> Option<SessionRecord> {
        let now = Utc::now();
        let mut entry = self.sessions.get_mut(id)?;
        if entry.is_expired(now) {
            drop(entry);
            self.sessions.remove(id);
            return None;
        }
        entry.expires_at = now + self.ttl;
        Some(entry.clone())
    }

    /// Replace `previous` (if any) with a fresh session id for `user`.
    pub fn regenerate(&self, previous: Option<&str>, user: &User) -> Result<String, SessionError> {
        if let Some(old) = previous {
            self.sessions.remove(old);
        }
        self.create(user)
    }

    /// Update the cached user snapshot after a profile or billing change.
    pub fn refresh_snapshot(&self, id: &str, user: &User) {
        if let Some(mut entry) = self.sessions.get_mut(id) {
            entry.user = PublicUser::from(user);
        }
    }

    /// Remove a session. Returns whether one existed.
    pub fn destroy(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// Drop all expired sessions, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, record| !record.is_expired(now));
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Session store plus the signed cookie that carries the session id.
pub struct SessionManager {
    pub store: SessionStore,
    key: Key,
    secure: bool,
    same_site: SameSite,
}

impl SessionManager {
    /// The signing key is derived from `secret` so any secret length is accepted.
    pub fn new(secret: &[u8], environment: Environment) -> Self {
        Self::with_store(SessionStore::default(), secret, environment)
    }

    pub fn with_store(store: SessionStore, secret: &[u8], environment: Environment) -> Self {
        let digest = Sha512::digest(secret);
        let production = environment.is_production();
        Self {
            store,
            key: Key::from(&digest[..]),
            secure: production,
            same_site: if production {
                SameSite::None
            } else {
                SameSite::Lax
            },
        }
    }

    /// Read the signed cookie jar from request headers.
    pub fn jar(&self, headers: &HeaderMap) -> SignedCookieJar {
        SignedCookieJar::from_headers(headers, self.key.clone())
    }

    /// Session id carried by the request, if the signature checks out.
    pub fn session_id(&self, jar: &SignedCookieJar) -> Option<String> {
        jar.get(SESSION_COOKIE).map(|c| c.value().to_string())
    }

    /// Current live session for the request.
    pub fn current(&self, jar: &SignedCookieJar) -> Option<(String, SessionRecord)> {
        let id = self.session_id(jar)?;
        let record = self.store.get(&id)?;
        Some((id, record))
    }

    /// Start a fresh session for `user`, discarding any session the request
    /// already carried, and set the cookie.
    pub fn establish(
        &self,
        jar: SignedCookieJar,
        user: &User,
    ) -> Result<(SignedCookieJar, String), SessionError> {
        let previous = self.session_id(&jar);
        let id = self.store.regenerate(previous.as_deref(), user)?;
        Ok((jar.add(self.session_cookie(id.clone())), id))
    }

    /// Re-issue the cookie for a live session.
    pub fn renew(&self, jar: SignedCookieJar, id: String) -> SignedCookieJar {
        jar.add(self.session_cookie(id))
    }

    /// Destroy the request's session and clear the cookie.
    ///
    /// Returns whether a server-side session existed.
    pub fn destroy(&self, jar: SignedCookieJar) -> (SignedCookieJar, bool) {
        let existed = self
            .session_id(&jar)
            .map(|id| self.store.destroy(&id))
            .unwrap_or(false);
        (jar.add(self.removal_cookie()), existed)
    }

    fn session_cookie(&self, id: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, id))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(self.same_site)
            .max_age(time::Duration::hours(SESSION_TTL_HOURS))
            .build()
    }

    fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, ""))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(self.same_site)
            .max_age(time::Duration::ZERO)
            .build()
    }
}
