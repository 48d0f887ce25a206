//! Cookie-bound session persistence.
//!
//! The session is the pair of `access_token` and `server` cookies; there is
//! no server-side table. A short-lived `oauth_state` cookie carries the
//! nonce of an authorization in progress.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use time::OffsetDateTime;
use webui_common::config::SessionConfig;
use webui_core::Session;
use webui_core::authorization::expiry;
use webui_remote::Instance;

/// Cookie holding the access token.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
/// Cookie holding the instance origin.
pub const SERVER_COOKIE: &str = "server";
/// Cookie holding the pending authorization nonce.
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

/// Reads and writes session cookies.
#[derive(Debug, Clone)]
pub struct SessionStore {
    ttl: chrono::Duration,
    secure: bool,
}

impl SessionStore {
    /// Create a store issuing cookies that live for `ttl`.
    #[must_use]
    pub const fn new(ttl: chrono::Duration, secure: bool) -> Self {
        Self { ttl, secure }
    }

    /// Create a store from configuration.
    #[must_use]
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(chrono::Duration::hours(config.ttl_hours), config.secure_cookies)
    }

    /// Session lifetime.
    #[must_use]
    pub const fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    /// Persist `session` into the jar.
    ///
    /// Both cookies share one absolute expiry.
    #[must_use]
    pub fn save(&self, jar: CookieJar, session: &Session) -> CookieJar {
        let expires_at = session.expires_at.unwrap_or_else(|| Utc::now() + self.ttl);

        jar.add(self.cookie(
            ACCESS_TOKEN_COOKIE,
            session.access_token.clone(),
            expires_at,
        ))
        .add(self.cookie(SERVER_COOKIE, session.server.to_string(), expires_at))
    }

    /// Read the session from the jar.
    ///
    /// Missing, empty or malformed cookies count as no session.
    #[must_use]
    pub fn load(&self, jar: &CookieJar) -> Option<Session> {
        let access_token = jar
            .get(ACCESS_TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty())?;
        let server = jar
            .get(SERVER_COOKIE)
            .and_then(|cookie| Instance::parse(cookie.value()).ok())?;

        Some(Session::restored(server, access_token))
    }

    /// Remove both session cookies.
    #[must_use]
    pub fn clear(&self, jar: CookieJar) -> CookieJar {
        jar.remove(Self::removal(ACCESS_TOKEN_COOKIE))
            .remove(Self::removal(SERVER_COOKIE))
    }

    /// Remember the nonce of an authorization in progress.
    #[must_use]
    pub fn remember_pending(&self, jar: CookieJar, nonce: &str) -> CookieJar {
        let expires_at = Utc::now() + chrono::Duration::seconds(expiry::PENDING_AUTHORIZATION);
        jar.add(self.cookie(OAUTH_STATE_COOKIE, nonce.to_string(), expires_at))
    }

    /// Nonce of the authorization in progress, if any.
    #[must_use]
    pub fn pending_nonce(&self, jar: &CookieJar) -> Option<String> {
        jar.get(OAUTH_STATE_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|nonce| !nonce.is_empty())
    }

    /// Drop the pending authorization cookie.
    #[must_use]
    pub fn forget_pending(&self, jar: CookieJar) -> CookieJar {
        jar.remove(Self::removal(OAUTH_STATE_COOKIE))
    }

    fn cookie(
        &self,
        name: &'static str,
        value: String,
        expires_at: DateTime<Utc>,
    ) -> Cookie<'static> {
        let max_age = (expires_at - Utc::now()).num_seconds().max(0);
        let expires = OffsetDateTime::from_unix_timestamp(expires_at.timestamp())
            .unwrap_or_else(|_| OffsetDateTime::now_utc());

        Cookie::build((name, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(time::Duration::seconds(max_age))
            .expires(expires)
            .build()
    }

    fn removal(name: &'static str) -> Cookie<'static> {
        Cookie::build(name).path("/").build()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}
