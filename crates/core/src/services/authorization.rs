//! Authorization-code handshake with remote instances.
//!
//! The flow per browser:
//!
//! 1. no session, no instance: the caller asks for an instance
//! 2. instance submitted: register (or reuse) an application, remember a
//!    pending authorization under a fresh nonce and redirect to the
//!    instance's authorization page
//! 3. callback: exchange the code for a token; only then is a session minted

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;
use webui_common::{AppError, AppResult};
use webui_remote::{Instance, MastodonApi};

use crate::services::registry::InstanceRegistry;
use crate::session::Session;

/// Expiry times in seconds.
pub mod expiry {
    /// How long a browser may take to come back from the authorization page.
    pub const PENDING_AUTHORIZATION: i64 = 600; // 10 minutes
}

/// What the caller should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationStep {
    /// Ask the user which instance to connect to.
    NeedInstance,
    /// Send the user agent to the instance's authorization page.
    Redirect(AuthorizationRedirect),
}

/// Redirect to a remote authorization page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRedirect {
    /// Instance being authorized against.
    pub instance: Instance,
    /// Authorization URL including client id, redirect URI and `state`.
    pub url: Url,
    /// Per-interaction nonce; the caller must hand it back on callback.
    pub nonce: String,
}

/// Query parameters the remote sends back to the callback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    /// Authorization code.
    pub code: Option<String>,
    /// Echoed `state`.
    pub state: Option<String>,
    /// OAuth error, e.g. `access_denied`.
    pub error: Option<String>,
}

/// An authorization waiting for its callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAuthorization {
    /// Instance the user was sent to.
    pub instance: Instance,
    /// When the redirect was issued.
    pub created_at: DateTime<Utc>,
}

/// Pending authorizations keyed by nonce.
///
/// Each browser interaction gets its own entry, so concurrent flows against
/// different instances never see each other's state.
#[derive(Clone)]
pub struct PendingAuthorizations {
    entries: Arc<Mutex<HashMap<String, PendingAuthorization>>>,
    ttl: Duration,
}

impl PendingAuthorizations {
    /// Create an empty store whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Record a pending authorization and return its nonce.
    pub async fn insert(&self, instance: Instance) -> String {
        let now = Utc::now();
        let nonce = uuid::Uuid::new_v4().simple().to_string();

        let mut entries = self.entries.lock().await;
        entries.retain(|_, pending| pending.created_at + self.ttl > now);
        entries.insert(
            nonce.clone(),
            PendingAuthorization {
                instance,
                created_at: now,
            },
        );
        nonce
    }

    /// Remove and return the entry for `nonce` if it has not expired.
    pub async fn take(&self, nonce: &str) -> Option<PendingAuthorization> {
        let pending = self.entries.lock().await.remove(nonce)?;
        if pending.created_at + self.ttl > Utc::now() {
            Some(pending)
        } else {
            debug!(instance = %pending.instance, "Pending authorization expired");
            None
        }
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

impl Default for PendingAuthorizations {
    fn default() -> Self {
        Self::new(Duration::seconds(expiry::PENDING_AUTHORIZATION))
    }
}

/// Drives the authorization handshake.
#[derive(Clone)]
pub struct AuthorizationService {
    api: Arc<dyn MastodonApi>,
    registry: InstanceRegistry,
    pending: PendingAuthorizations,
    session_ttl: Duration,
}

impl AuthorizationService {
    /// Create a new authorization service.
    #[must_use]
    pub fn new(
        api: Arc<dyn MastodonApi>,
        registry: InstanceRegistry,
        pending: PendingAuthorizations,
        session_ttl: Duration,
    ) -> Self {
        Self {
            api,
            registry,
            pending,
            session_ttl,
        }
    }

    /// The registry backing this flow.
    #[must_use]
    pub const fn registry(&self) -> &InstanceRegistry {
        &self.registry
    }

    /// Lifetime given to minted sessions.
    #[must_use]
    pub const fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Start a handshake for the submitted instance, if any.
    pub async fn begin(&self, instance: Option<&str>) -> AppResult<AuthorizationStep> {
        let Some(input) = instance.filter(|input| !input.trim().is_empty()) else {
            return Ok(AuthorizationStep::NeedInstance);
        };

        let instance =
            Instance::parse(input).map_err(|e| AppError::InvalidInstance(e.to_string()))?;
        let app = self.registry.register_or_get(&instance).await?;
        let nonce = self.pending.insert(instance.clone()).await;
        let url = app.authorization_url_with_state(&nonce);

        info!(instance = %instance, "Redirecting to instance for authorization");

        Ok(AuthorizationStep::Redirect(AuthorizationRedirect {
            instance,
            url,
            nonce,
        }))
    }

    /// Finish the handshake.
    ///
    /// `nonce` is the value handed out by [`Self::begin`], as held by the
    /// browser. A session is returned only once the code exchange succeeded.
    pub async fn complete(
        &self,
        callback: &CallbackParams,
        nonce: Option<&str>,
    ) -> AppResult<Session> {
        if let Some(error) = callback.error.as_deref() {
            if let Some(nonce) = nonce {
                self.pending.take(nonce).await;
            }
            return Err(AppError::AuthorizationDenied(error.to_string()));
        }

        let code = callback
            .code
            .as_deref()
            .filter(|code| !code.is_empty())
            .ok_or(AppError::MissingCode)?;

        let nonce = nonce
            .filter(|nonce| !nonce.is_empty())
            .ok_or(AppError::NoPendingAuthorization)?;
        if callback.state.as_deref().is_some_and(|state| state != nonce) {
            warn!("Callback state does not match pending authorization");
            return Err(AppError::NoPendingAuthorization);
        }

        let pending = self
            .pending
            .take(nonce)
            .await
            .ok_or(AppError::NoPendingAuthorization)?;
        let app = self
            .registry
            .get(&pending.instance)
            .await
            .ok_or(AppError::NoPendingAuthorization)?;

        let token = self.api.exchange_code(&app, code).await.map_err(|e| {
            warn!(instance = %app.instance, error = %e, "Token exchange failed");
            AppError::TokenExchange(e.to_string())
        })?;
        if token.access_token.is_empty() {
            return Err(AppError::TokenExchange(
                "instance returned an empty access token".to_string(),
            ));
        }

        info!(instance = %app.instance, "Authorization completed");

        Ok(Session::new(
            app.instance,
            token.access_token,
            self.session_ttl,
        ))
    }
}
