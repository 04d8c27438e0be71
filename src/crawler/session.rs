//! Time-limited crawl identities
//!
//! A session bundles cookies, extra headers and an auth token. Sessions are
//! created explicitly, expire after the configured TTL and are purged lazily
//! the next time they are looked up.

use super::traits::SessionProvider;
use crate::config::SessionConfig;
use chrono::{DateTime, Utc};
use reqwest::header::{AUTHORIZATION, COOKIE};
use reqwest::RequestBuilder;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Credentials supplied when a session is created
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionAuth {
    pub cookies: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub auth_token: Option<String>,
}

/// A live session handed to the fetcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub id: String,
    pub cookies: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub auth_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SessionContext {
    /// Formats the cookies as a `Cookie` header value
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect();
        Some(pairs.join("; "))
    }

    /// Attaches headers, cookies and the bearer token to a request
    pub fn apply(&self, mut request: RequestBuilder) -> RequestBuilder {
        for (name, value) in &self.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(cookies) = self.cookie_header() {
            request = request.header(COOKIE, cookies);
        }
        if let Some(token) = &self.auth_token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        request
    }
}

#[derive(Debug)]
struct SessionEntry {
    context: SessionContext,
    created: Instant,
}

/// In-memory session table with TTL expiry
#[derive(Debug)]
pub struct SessionStore {
    ttl: Duration,
    sessions: Mutex<HashMap<String, SessionEntry>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.ttl())
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionEntry>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_expired(&self, entry: &SessionEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.created) >= self.ttl
    }

    /// Creates (or replaces) a session
    pub fn create_session(&self, id: impl Into<String>, auth: SessionAuth) -> SessionContext {
        let id = id.into();
        let context = SessionContext {
            id: id.clone(),
            cookies: auth.cookies,
            headers: auth.headers,
            auth_token: auth.auth_token,
            created_at: Utc::now(),
        };

        let entry = SessionEntry {
            context: context.clone(),
            created: Instant::now(),
        };
        if self.lock().insert(id.clone(), entry).is_some() {
            tracing::debug!(session = %id, "Replaced existing session");
        }
        context
    }

    /// Returns a live session, dropping it if it has expired
    pub fn get_session(&self, id: &str) -> Option<SessionContext> {
        let now = Instant::now();
        let mut sessions = self.lock();

        let expired = self.is_expired(sessions.get(id)?, now);
        if expired {
            sessions.remove(id);
            tracing::debug!(session = %id, "Session expired");
            return None;
        }
        sessions.get(id).map(|entry| entry.context.clone())
    }

    pub fn remove_session(&self, id: &str) -> bool {
        self.lock().remove(id).is_some()
    }

    /// Drops every expired session, returning how many were removed
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, entry| !self.is_expired(entry, now));
        let removed = before - sessions.len();
        if removed > 0 {
            tracing::debug!(removed, "Cleaned up expired sessions");
        }
        removed
    }

    /// Sessions that have not yet expired
    pub fn active_sessions(&self) -> usize {
        let now = Instant::now();
        self.lock()
            .values()
            .filter(|entry| !self.is_expired(entry, now))
            .count()
    }
}

impl SessionProvider for SessionStore {
    fn session(&self, id: &str) -> Option<SessionContext> {
        self.get_session(id)
    }

    fn active_sessions(&self) -> usize {
        SessionStore::active_sessions(self)
    }
}
