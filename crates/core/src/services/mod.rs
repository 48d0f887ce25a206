//! Business logic services.

pub mod authorization;
pub mod gateway;
pub mod registry;

pub use authorization::{
    AuthorizationRedirect, AuthorizationService, AuthorizationStep, CallbackParams,
    PendingAuthorization, PendingAuthorizations,
};
pub use gateway::{Ack, TimelineGateway};
pub use registry::InstanceRegistry;
