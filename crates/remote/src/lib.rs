//! Client for the Mastodon-compatible REST API of remote instances.
//!
//! This crate is the only place that talks to remote servers:
//!
//! - **Instances**: normalised origin URLs via [`Instance`]
//! - **Capability**: the [`MastodonApi`] trait used by core services
//! - **HTTP**: [`HttpMastodonClient`], a `reqwest` implementation with bounded timeouts
//! - **Types**: applications, tokens, statuses and timeline pages
//!
//! With the `test-utils` feature, [`mock::MockMastodonApi`] records calls
//! instead of making them.

pub mod api;
pub mod client;
pub mod instance;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod types;

pub use api::MastodonApi;
pub use client::{HttpMastodonClient, RemoteClientError};
pub use instance::{Instance, InstanceError};
pub use types::{
    AccessToken, Account, AppRegistration, Application, MediaAttachment, NewStatus, Status,
    Timeline, TimelinePage, Visibility, authorization_url,
};
