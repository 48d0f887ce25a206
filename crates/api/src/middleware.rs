//! API middleware.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use webui_common::Config;
use webui_core::{
    AuthorizationService, InstanceRegistry, PendingAuthorizations, TimelineGateway,
};
use webui_remote::{AppRegistration, MastodonApi};

use crate::session::SessionStore;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// Authorization handshake.
    pub authorization: AuthorizationService,
    /// Timeline and status actions.
    pub gateway: TimelineGateway,
    /// Cookie codec for sessions.
    pub sessions: SessionStore,
}

impl AppState {
    /// Wire the services for `config` on top of `api`.
    #[must_use]
    pub fn new(config: &Config, api: Arc<dyn MastodonApi>) -> Self {
        let registration = AppRegistration {
            client_name: config.remote.client_name.clone(),
            redirect_uri: config.redirect_uri(),
            scopes: config.remote.scopes.clone(),
            website: config.remote.website.clone(),
        };
        let sessions = SessionStore::from_config(&config.session);
        let registry = InstanceRegistry::new(api.clone(), registration);
        let authorization = AuthorizationService::new(
            api.clone(),
            registry,
            PendingAuthorizations::default(),
            sessions.ttl(),
        );

        Self {
            authorization,
            gateway: TimelineGateway::new(api),
            sessions,
        }
    }
}

/// Session middleware.
///
/// Decodes the session cookies once and stores the result in request
/// extensions for the extractors.
pub async fn session_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(session) = state.sessions.load(&jar) {
        req.extensions_mut().insert(session);
    }

    next.run(req).await
}
