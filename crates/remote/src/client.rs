//! HTTP client for the Mastodon client API.
//!
//! Every request is bounded by the configured timeouts so a slow instance
//! cannot hold a request handler indefinitely.

#![allow(missing_docs)]

use async_trait::async_trait;
use reqwest::{Client, Response, header};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use webui_common::config::RemoteConfig;

use crate::api::MastodonApi;
use crate::instance::Instance;
use crate::types::{
    AccessToken, AppRegistration, Application, NewStatus, RegisteredApp, Status, Timeline,
    TimelinePage,
};

/// Error type for remote API calls.
#[derive(Debug, thiserror::Error)]
pub enum RemoteClientError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Remote returned {status}: {body}")]
    RequestFailed { status: u16, body: String },
}

impl From<url::ParseError> for RemoteClientError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

/// Mastodon client API over HTTP.
#[derive(Clone)]
pub struct HttpMastodonClient {
    client: Client,
}

impl HttpMastodonClient {
    /// Create a new client.
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteClientError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(format!(
                "{}/{}",
                config.client_name,
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self { client })
    }

    /// Decode a successful response, or turn the status into an error.
    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, RemoteClientError> {
        let status = response.status();

        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Remote request failed");
            Err(RemoteClientError::RequestFailed {
                status: status.as_u16(),
                body,
            })
        }
    }

    async fn status_action(
        &self,
        instance: &Instance,
        access_token: &str,
        status_id: &str,
        action: &str,
    ) -> Result<Status, RemoteClientError> {
        let url = instance.endpoint(&["api", "v1", "statuses", status_id, action])?;

        debug!(instance = %instance, status_id = %status_id, action = action, "Status action");

        let response = self
            .client
            .post(url)
            .bearer_auth(access_token)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        Self::read_json(response).await
    }
}

#[async_trait]
impl MastodonApi for HttpMastodonClient {
    async fn register_app(
        &self,
        instance: &Instance,
        registration: &AppRegistration,
    ) -> Result<Application, RemoteClientError> {
        let url = instance.endpoint(&["api", "v1", "apps"])?;

        let mut form = vec![
            ("client_name", registration.client_name.as_str()),
            ("redirect_uris", registration.redirect_uri.as_str()),
            ("scopes", registration.scopes.as_str()),
        ];
        if let Some(website) = &registration.website {
            form.push(("website", website.as_str()));
        }

        debug!(instance = %instance, "Registering application");

        let response = self
            .client
            .post(url)
            .header(header::ACCEPT, "application/json")
            .form(&form)
            .send()
            .await?;

        let registered: RegisteredApp = Self::read_json(response).await?;
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
        let url = app.instance.endpoint(&["oauth", "token"])?;

        let form = [
            ("grant_type", "authorization_code"),
            ("client_id", app.client_id.as_str()),
            ("client_secret", app.client_secret.as_str()),
            ("redirect_uri", app.redirect_uri.as_str()),
            ("code", code),
            ("scope", app.scopes.as_str()),
        ];

        debug!(instance = %app.instance, "Exchanging authorization code");

        let response = self
            .client
            .post(url)
            .header(header::ACCEPT, "application/json")
            .form(&form)
            .send()
            .await?;

        Self::read_json(response).await
    }

    async fn home_timeline(
        &self,
        instance: &Instance,
        access_token: &str,
        page: &TimelinePage,
    ) -> Result<Timeline, RemoteClientError> {
        let url = instance.endpoint(&["api", "v1", "timelines", "home"])?;

        debug!(instance = %instance, "Fetching home timeline");

        let response = self
            .client
            .get(url)
            .bearer_auth(access_token)
            .header(header::ACCEPT, "application/json")
            .query(page)
            .send()
            .await?;

        let link = response
            .headers()
            .get(header::LINK)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let statuses: Vec<Status> = Self::read_json(response).await?;

        Ok(Timeline::from_link_header(statuses, link.as_deref()))
    }

    async fn post_status(
        &self,
        instance: &Instance,
        access_token: &str,
        status: &NewStatus,
    ) -> Result<Status, RemoteClientError> {
        let url = instance.endpoint(&["api", "v1", "statuses"])?;

        debug!(
            instance = %instance,
            in_reply_to_id = ?status.in_reply_to_id,
            "Posting status"
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(access_token)
            .header(header::ACCEPT, "application/json")
            .form(status)
            .send()
            .await?;

        Self::read_json(response).await
    }

    async fn reblog(
        &self,
        instance: &Instance,
        access_token: &str,
        status_id: &str,
    ) -> Result<Status, RemoteClientError> {
        self.status_action(instance, access_token, status_id, "reblog")
            .await
    }

    async fn favourite(
        &self,
        instance: &Instance,
        access_token: &str,
        status_id: &str,
    ) -> Result<Status, RemoteClientError> {
        self.status_action(instance, access_token, status_id, "favourite")
            .await
    }
}
