//! OneSphere voice skill runtime.
//!
//! Talks to the OneSphere REST API (`api`), authenticates each invocation
//! (`context`), routes requests to intent handlers (`dispatch`, `handlers`)
//! and ties the pipeline together in [`SkillRuntime`].

pub mod api;
pub mod context;
pub mod dispatch;
pub mod handlers;
pub mod runtime;

#[cfg(test)]
mod testing;

pub use api::{ApiError, HttpOneSphereClient, MetricsQuery, OneSphereApi, ServiceStatus};
pub use context::{build_session_context, SessionSettings};
pub use dispatch::{
    default_registry, DispatchError, DispatchKey, HandlerError, HandlerRegistry, IntentHandler,
    RegistrationError,
};
pub use runtime::{SetupError, SkillError, SkillRuntime};
