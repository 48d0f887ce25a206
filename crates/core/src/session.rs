//! Authenticated browser sessions.

use chrono::{DateTime, Duration, Utc};
use std::fmt;
use webui_remote::Instance;

/// Default session lifetime.
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

/// A (server, access token) pair proving an authorized identity on one instance.
///
/// The token is only ever sent to `server`.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// Instance that minted the token.
    pub server: Instance,
    /// Opaque bearer token.
    pub access_token: String,
    /// Absolute expiry when known.
    ///
    /// Sessions read back from cookies carry `None`; the browser drops
    /// expired cookies itself.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// A freshly minted session expiring `ttl` from now.
    #[must_use]
    pub fn new(server: Instance, access_token: String, ttl: Duration) -> Self {
        Self {
            server,
            access_token,
            expires_at: Some(Utc::now() + ttl),
        }
    }

    /// A session restored from its persisted form.
    #[must_use]
    pub const fn restored(server: Instance, access_token: String) -> Self {
        Self {
            server,
            access_token,
            expires_at: None,
        }
    }

    /// Whether the session is past its expiry at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    /// Whether the session is past its expiry.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("server", &self.server)
            .field("access_token", &"[redacted]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
