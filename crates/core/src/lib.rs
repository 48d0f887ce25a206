//! Core logic for gotosocial-webui: the authorization handshake with remote
//! instances and the authenticated timeline/action gateway.

pub mod services;
pub mod session;

pub use services::*;
pub use session::{DEFAULT_SESSION_TTL_HOURS, Session};
