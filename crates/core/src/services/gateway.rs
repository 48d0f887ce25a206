//! Timeline and action gateway.
//!
//! Turns an authenticated session into calls against the session's own
//! instance. Each operation is exactly one remote call, never retried.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};
use webui_common::{AppError, AppResult};
use webui_remote::{MastodonApi, NewStatus, RemoteClientError, Timeline, TimelinePage};

use crate::session::Session;

/// Acknowledgement of a write action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ack {
    /// Id of the status the remote returned.
    pub id: String,
}

/// Reads and writes on behalf of a session.
#[derive(Clone)]
pub struct TimelineGateway {
    api: Arc<dyn MastodonApi>,
}

impl TimelineGateway {
    /// Create a new gateway.
    #[must_use]
    pub fn new(api: Arc<dyn MastodonApi>) -> Self {
        Self { api }
    }

    /// Fetch one page of the home timeline, in the order the remote sent it.
    pub async fn fetch_home_timeline(
        &self,
        session: &Session,
        page: &TimelinePage,
    ) -> AppResult<Timeline> {
        ensure_live(session)?;

        let timeline = self
            .api
            .home_timeline(&session.server, &session.access_token, page)
            .await
            .map_err(|e| remote_error(session, "fetch timeline", e))?;

        debug!(instance = %session.server, count = timeline.len(), "Fetched home timeline");
        Ok(timeline)
    }

    /// Post a public reply to `target_id`.
    ///
    /// `text` is sent as-is; mention prefixes are the caller's business.
    pub async fn reply(&self, session: &Session, target_id: &str, text: &str) -> AppResult<Ack> {
        ensure_live(session)?;
        let target_id = require_id(target_id)?;

        let status = self
            .api
            .post_status(
                &session.server,
                &session.access_token,
                &NewStatus::public_reply(target_id, text),
            )
            .await
            .map_err(|e| remote_error(session, "reply", e))?;

        Ok(Ack { id: status.id })
    }

    /// Boost (reblog) `target_id`.
    pub async fn boost(&self, session: &Session, target_id: &str) -> AppResult<Ack> {
        ensure_live(session)?;
        let target_id = require_id(target_id)?;

        let status = self
            .api
            .reblog(&session.server, &session.access_token, target_id)
            .await
            .map_err(|e| remote_error(session, "boost", e))?;

        Ok(Ack { id: status.id })
    }

    /// Favourite `target_id`.
    pub async fn favourite(&self, session: &Session, target_id: &str) -> AppResult<Ack> {
        ensure_live(session)?;
        let target_id = require_id(target_id)?;

        let status = self
            .api
            .favourite(&session.server, &session.access_token, target_id)
            .await
            .map_err(|e| remote_error(session, "favourite", e))?;

        Ok(Ack { id: status.id })
    }
}

fn ensure_live(session: &Session) -> AppResult<()> {
    if session.access_token.is_empty() || session.is_expired() {
        return Err(AppError::Unauthenticated);
    }
    Ok(())
}

fn require_id(target_id: &str) -> AppResult<&str> {
    let target_id = target_id.trim();
    if target_id.is_empty() {
        return Err(AppError::BadRequest("status id is required".to_string()));
    }
    Ok(target_id)
}

fn remote_error(session: &Session, action: &str, err: RemoteClientError) -> AppError {
    warn!(instance = %session.server, action = action, error = %err, "Remote call failed");
    AppError::Remote(format!("{action}: {err}"))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use chrono::{Duration, Utc};
    use webui_remote::mock::{MockMastodonApi, Operation, RemoteCall};
    use webui_remote::{Instance, Status, Visibility};

    fn session() -> Session {
        Session::restored(
            Instance::parse("https://example.social").unwrap(),
            "tok".to_string(),
        )
    }

    fn statuses(ids: &[&str]) -> Vec<Status> {
        ids.iter()
            .map(|id| Status {
                id: (*id).to_string(),
                ..Status::default()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_timeline_is_forwarded_unmodified() {
        let api = Arc::new(MockMastodonApi::new().with_timeline(statuses(&["30", "20", "10"])));
        let gateway = TimelineGateway::new(api.clone());

        let page = TimelinePage {
            max_id: Some("opaque-cursor".to_string()),
            ..TimelinePage::default()
        };
        let timeline = gateway.fetch_home_timeline(&session(), &page).await.unwrap();
        let ids: Vec<String> = timeline.into_iter().map(|s| s.id).collect();
        assert_eq!(ids, ["30", "20", "10"]);

        assert_eq!(
            api.calls(),
            vec![RemoteCall::HomeTimeline {
                instance: "https://example.social".to_string(),
                access_token: "tok".to_string(),
                page,
            }]
        );
    }

    #[tokio::test]
    async fn test_reply_is_public_and_threaded() {
        let api = Arc::new(MockMastodonApi::new());
        let gateway = TimelineGateway::new(api.clone());

        let ack = gateway
            .reply(&session(), "42", "@alice hello")
            .await
            .unwrap();
        assert_eq!(ack.id, "reply-to-42");

        match &api.calls()[0] {
            RemoteCall::PostStatus { status, .. } => {
                assert_eq!(status.in_reply_to_id.as_deref(), Some("42"));
                assert_eq!(status.status, "@alice hello");
                assert_eq!(status.visibility, Visibility::Public);
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_boost_and_favourite_use_session_credentials() {
        let api = Arc::new(MockMastodonApi::new());
        let gateway = TimelineGateway::new(api.clone());

        gateway.boost(&session(), "42").await.unwrap();
        gateway.favourite(&session(), "43").await.unwrap();

        assert_eq!(
            api.calls(),
            vec![
                RemoteCall::Reblog {
                    instance: "https://example.social".to_string(),
                    access_token: "tok".to_string(),
                    status_id: "42".to_string(),
                },
                RemoteCall::Favourite {
                    instance: "https://example.social".to_string(),
                    access_token: "tok".to_string(),
                    status_id: "43".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_remote_failure_becomes_remote_error() {
        let api = Arc::new(MockMastodonApi::new());
        api.fail(Operation::Reblog);
        let gateway = TimelineGateway::new(api.clone());

        let err = gateway.boost(&session(), "42").await.unwrap_err();
        assert!(matches!(err, AppError::Remote(_)));
        assert_eq!(api.count(Operation::Reblog), 1);
    }

    #[tokio::test]
    async fn test_expired_session_makes_no_call() {
        let api = Arc::new(MockMastodonApi::new());
        let gateway = TimelineGateway::new(api.clone());

        let mut expired = session();
        expired.expires_at = Some(Utc::now() - Duration::minutes(1));

        let err = gateway.favourite(&expired, "1").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
        assert_eq!(api.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_blank_target_is_bad_request() {
        let api = Arc::new(MockMastodonApi::new());
        let gateway = TimelineGateway::new(api.clone());

        let err = gateway.boost(&session(), "  ").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(api.total_calls(), 0);
    }
}
