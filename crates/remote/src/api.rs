//! The remote API capability.

use async_trait::async_trait;

use crate::client::RemoteClientError;
use crate::instance::Instance;
use crate::types::{
    AccessToken, AppRegistration, Application, NewStatus, Status, Timeline, TimelinePage,
};

/// Operations this service performs against a Mastodon-compatible instance.
///
/// Implemented over HTTP by [`crate::HttpMastodonClient`]; core services only
/// see this trait so they can be exercised without a network.
#[async_trait]
pub trait MastodonApi: Send + Sync {
    /// Dynamically register a client application (`POST /api/v1/apps`).
    async fn register_app(
        &self,
        instance: &Instance,
        registration: &AppRegistration,
    ) -> Result<Application, RemoteClientError>;

    /// Exchange an authorization code for an access token (`POST /oauth/token`).
    ///
    /// Uses the application's own redirect URI.
    async fn exchange_code(
        &self,
        app: &Application,
        code: &str,
    ) -> Result<AccessToken, RemoteClientError>;

    /// Fetch the home timeline (`GET /api/v1/timelines/home`).
    async fn home_timeline(
        &self,
        instance: &Instance,
        access_token: &str,
        page: &TimelinePage,
    ) -> Result<Timeline, RemoteClientError>;

    /// Publish a status (`POST /api/v1/statuses`).
    async fn post_status(
        &self,
        instance: &Instance,
        access_token: &str,
        status: &NewStatus,
    ) -> Result<Status, RemoteClientError>;

    /// Reblog a status (`POST /api/v1/statuses/:id/reblog`).
    async fn reblog(
        &self,
        instance: &Instance,
        access_token: &str,
        status_id: &str,
    ) -> Result<Status, RemoteClientError>;

    /// Favourite a status (`POST /api/v1/statuses/:id/favourite`).
    async fn favourite(
        &self,
        instance: &Instance,
        access_token: &str,
        status_id: &str,
    ) -> Result<Status, RemoteClientError>;
}
