//! In-memory [`MastodonApi`] for tests.
//!
//! Records every outbound call and can be told to fail individual
//! operations.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::api::MastodonApi;
use crate::client::RemoteClientError;
use crate::instance::Instance;
use crate::types::{
    AccessToken, AppRegistration, Application, NewStatus, RegisteredApp, Status, Timeline,
    TimelinePage,
};

/// Remote operations, used to inject failures and count calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Operation {
    RegisterApp,
    ExchangeCode,
    HomeTimeline,
    PostStatus,
    Reblog,
    Favourite,
}

/// A recorded outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum RemoteCall {
    RegisterApp {
        instance: String,
        redirect_uri: String,
        scopes: String,
    },
    ExchangeCode {
        instance: String,
        client_id: String,
        redirect_uri: String,
        code: String,
    },
    HomeTimeline {
        instance: String,
        access_token: String,
        page: TimelinePage,
    },
    PostStatus {
        instance: String,
        access_token: String,
        status: NewStatus,
    },
    Reblog {
        instance: String,
        access_token: String,
        status_id: String,
    },
    Favourite {
        instance: String,
        access_token: String,
        status_id: String,
    },
}

impl RemoteCall {
    /// The operation this call belongs to.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::RegisterApp { .. } => Operation::RegisterApp,
            Self::ExchangeCode { .. } => Operation::ExchangeCode,
            Self::HomeTimeline { .. } => Operation::HomeTimeline,
            Self::PostStatus { .. } => Operation::PostStatus,
            Self::Reblog { .. } => Operation::Reblog,
            Self::Favourite { .. } => Operation::Favourite,
        }
    }
}

/// Scriptable in-memory instance.
#[derive(Default)]
pub struct MockMastodonApi {
    calls: Mutex<Vec<RemoteCall>>,
    failing: Mutex<HashSet<Operation>>,
    timeline: Mutex<Vec<Status>>,
    registration_delay: Option<Duration>,
    registrations: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockMastodonApi {
    /// Create a mock where every call succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Statuses returned by the home timeline, in order.
    #[must_use]
    pub fn with_timeline(self, statuses: Vec<Status>) -> Self {
        *lock(&self.timeline) = statuses;
        self
    }

    /// Delay each registration, to widen race windows in tests.
    #[must_use]
    pub const fn with_registration_delay(mut self, delay: Duration) -> Self {
        self.registration_delay = Some(delay);
        self
    }

    /// Make `operation` fail with a remote 500 from now on.
    pub fn fail(&self, operation: Operation) {
        lock(&self.failing).insert(operation);
    }

    /// Make `operation` succeed again.
    pub fn recover(&self, operation: Operation) {
        lock(&self.failing).remove(&operation);
    }

    /// Every call recorded so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RemoteCall> {
        lock(&self.calls).clone()
    }

    /// Number of recorded calls of one operation.
    #[must_use]
    pub fn count(&self, operation: Operation) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|call| call.operation() == operation)
            .count()
    }

    /// Total number of recorded calls.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        lock(&self.calls).len()
    }

    fn record(&self, call: RemoteCall) -> Result<(), RemoteClientError> {
        let operation = call.operation();
        lock(&self.calls).push(call);

        if lock(&self.failing).contains(&operation) {
            return Err(RemoteClientError::RequestFailed {
                status: 500,
                body: format!("{operation:?} failed"),
            });
        }
        Ok(())
    }

    fn acted_on(status_id: &str) -> Status {
        Status {
            id: status_id.to_string(),
            ..Status::default()
        }
    }
}

#[async_trait]
impl MastodonApi for MockMastodonApi {
    async fn register_app(
        &self,
        instance: &Instance,
        registration: &AppRegistration,
    ) -> Result<Application, RemoteClientError> {
        self.record(RemoteCall::RegisterApp {
            instance: instance.to_string(),
            redirect_uri: registration.redirect_uri.clone(),
            scopes: registration.scopes.clone(),
        })?;

        if let Some(delay) = self.registration_delay {
            tokio::time::sleep(delay).await;
        }

        let n = self.registrations.fetch_add(1, Ordering::SeqCst) + 1;
        let registered = RegisteredApp {
            client_id: format!("client-{n}-{}", instance.host()),
            client_secret: format!("secret-{n}"),
            redirect_uri: Some(registration.redirect_uri.clone()),
        };

        Ok(Application::from_registered(
            instance.clone(),
            registered,
            registration,
        )?)
    }

    async fn exchange_code(
        &self,
        app: &Application,
        code: &str,
    ) -> Result<AccessToken, RemoteClientError> {
        self.record(RemoteCall::ExchangeCode {
            instance: app.instance.to_string(),
            client_id: app.client_id.clone(),
            redirect_uri: app.redirect_uri.clone(),
            code: code.to_string(),
        })?;

        Ok(AccessToken {
            access_token: format!("token-{code}"),
            token_type: Some("Bearer".to_string()),
            scope: Some(app.scopes.clone()),
        })
    }

    async fn home_timeline(
        &self,
        instance: &Instance,
        access_token: &str,
        page: &TimelinePage,
    ) -> Result<Timeline, RemoteClientError> {
        self.record(RemoteCall::HomeTimeline {
            instance: instance.to_string(),
            access_token: access_token.to_string(),
            page: page.clone(),
        })?;

        let statuses = lock(&self.timeline).clone();
        let next = statuses.last().map(|status| status.id.clone());
        let prev = statuses.first().map(|status| status.id.clone());
        Ok(Timeline::new(statuses, next, prev))
    }

    async fn post_status(
        &self,
        instance: &Instance,
        access_token: &str,
        status: &NewStatus,
    ) -> Result<Status, RemoteClientError> {
        self.record(RemoteCall::PostStatus {
            instance: instance.to_string(),
            access_token: access_token.to_string(),
            status: status.clone(),
        })?;

        Ok(Status {
            id: format!("reply-to-{}", status.in_reply_to_id.as_deref().unwrap_or("none")),
            content: status.status.clone(),
            in_reply_to_id: status.in_reply_to_id.clone(),
            visibility: Some(status.visibility.as_str().to_string()),
            ..Status::default()
        })
    }

    async fn reblog(
        &self,
        instance: &Instance,
        access_token: &str,
        status_id: &str,
    ) -> Result<Status, RemoteClientError> {
        self.record(RemoteCall::Reblog {
            instance: instance.to_string(),
            access_token: access_token.to_string(),
            status_id: status_id.to_string(),
        })?;
        Ok(Self::acted_on(status_id))
    }

    async fn favourite(
        &self,
        instance: &Instance,
        access_token: &str,
        status_id: &str,
    ) -> Result<Status, RemoteClientError> {
        self.record(RemoteCall::Favourite {
            instance: instance.to_string(),
            access_token: access_token.to_string(),
            status_id: status_id.to_string(),
        })?;
        Ok(Self::acted_on(status_id))
    }
}
