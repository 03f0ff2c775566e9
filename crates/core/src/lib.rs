//! Core types for the OneSphere voice skill.
//!
//! - **Configuration** (`config`) - layered defaults, TOML file, environment
//! - **Domain** (`domain`) - validated requests, spoken responses, session context
//! - **Metrics** (`metrics`) - normalisation of `/metrics` payloads into a cost
//! - **Formatting** (`format`) - currency rendering for speech

pub mod config;
pub mod domain;
pub mod errors;
pub mod format;
pub mod metrics;

pub use domain::request::{RequestError, RequestKind, RequestType, SkillRequest};
pub use domain::response::{
    simple_card, Card, OutputSpeech, ResponseBuilder, ResponseEnvelope, ResponseError,
    SpeechResponse,
};
pub use domain::session::SessionContext;
pub use errors::InterfaceError;
pub use format::format_currency;
pub use metrics::{MetricData, MetricShapeError};
