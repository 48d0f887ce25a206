//! API response types.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use webui_remote::{Instance, Status, Timeline};

/// One page of the home timeline, as sent to the browser.
#[derive(Debug, Serialize)]
pub struct TimelineResponse {
    /// Instance the session belongs to.
    pub server: Instance,
    /// Statuses in the order the instance returned them.
    pub statuses: Vec<Status>,
    /// Cursor for older statuses.
    pub next: Option<String>,
    /// Cursor for newer statuses.
    pub prev: Option<String>,
}

impl TimelineResponse {
    /// Build the response for `server` from a fetched page.
    #[must_use]
    pub fn new(server: Instance, timeline: Timeline) -> Self {
        let next = timeline.next.clone();
        let prev = timeline.prev.clone();
        Self {
            server,
            statuses: timeline.into_iter().collect(),
            next,
            prev,
        }
    }
}

impl IntoResponse for TimelineResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Signals that the browser must submit an instance first.
#[derive(Debug, Serialize)]
pub struct NeedInstance {
    state: &'static str,
}

impl Default for NeedInstance {
    fn default() -> Self {
        Self {
            state: "need_instance",
        }
    }
}

impl IntoResponse for NeedInstance {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// `302 Found` to `location`.
#[must_use]
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}
