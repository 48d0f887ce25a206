//! HTTP surface for gotosocial-webui.
//!
//! - **Endpoints**: entry page, authorization callback, logout and status actions
//! - **Extractors**: session and validated JSON bodies
//! - **Middleware**: session decoding from cookies
//! - **Session**: the cookie codec
//!
//! Built on Axum 0.8.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;
pub mod session;

pub use endpoints::{app, router};
pub use middleware::AppState;
pub use session::SessionStore;
