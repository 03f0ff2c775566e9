use std::sync::Arc;
use std::time::Duration;

use osvoice_core::config::AppConfig;
use osvoice_core::{InterfaceError, RequestError, ResponseEnvelope, SkillRequest};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiError, HttpOneSphereClient, OneSphereApi, ServiceStatus};
use crate::context::{build_session_context, SessionSettings};
use crate::dispatch::{default_registry, DispatchError, HandlerRegistry, RegistrationError};

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("failed to build the onesphere client: {0}")]
    Client(#[from] ApiError),
    #[error("failed to register skill handlers: {0}")]
    Registration(#[from] RegistrationError),
}

/// A request the skill refused to answer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SkillError {
    #[error("invalid skill request: {0}")]
    Invalid(#[source] RequestError),
    #[error("request {request_id} rejected: {source}")]
    Rejected {
        request_id: String,
        #[source]
        source: RequestError,
    },
    #[error("request {request_id} could not be dispatched: {source}")]
    Dispatch {
        request_id: String,
        #[source]
        source: DispatchError,
    },
}

impl SkillError {
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Invalid(_) => None,
            Self::Rejected { request_id, .. } | Self::Dispatch { request_id, .. } => {
                Some(request_id)
            }
        }
    }

    /// Maps the rejection onto the caller-facing error, using the request id
    /// as correlation id when one was parsed.
    pub fn to_interface(&self, fallback_correlation_id: &str) -> InterfaceError {
        let correlation_id = self.request_id().unwrap_or(fallback_correlation_id).to_owned();
        let message = self.to_string();
        match self {
            Self::Rejected { source: RequestError::InvalidApplicationId { .. }, .. } => {
                InterfaceError::Forbidden { message, correlation_id }
            }
            Self::Invalid(_) | Self::Rejected { .. } => {
                InterfaceError::BadRequest { message, correlation_id }
            }
            Self::Dispatch { source: DispatchError::Unroutable { .. }, .. } => {
                InterfaceError::BadRequest { message, correlation_id }
            }
            Self::Dispatch { source: DispatchError::Handler { .. }, .. } => {
                InterfaceError::Internal { message, correlation_id }
            }
        }
    }
}

/// Runs one voice request end to end: parse, validate, authenticate, dispatch.
pub struct SkillRuntime {
    settings: SessionSettings,
    registry: HandlerRegistry,
    api: Arc<dyn OneSphereApi>,
}

impl SkillRuntime {
    pub fn new(
        settings: SessionSettings,
        registry: HandlerRegistry,
        api: Arc<dyn OneSphereApi>,
    ) -> Self {
        Self { settings, registry, api }
    }

    /// Production wiring: reqwest client with the configured timeout and the
    /// full handler set.
    pub fn from_config(config: &AppConfig) -> Result<Self, SetupError> {
        let client = HttpOneSphereClient::new(Duration::from_secs(config.onesphere.timeout_secs))?;
        Self::with_api(config, Arc::new(client))
    }

    pub fn with_api(config: &AppConfig, api: Arc<dyn OneSphereApi>) -> Result<Self, SetupError> {
        let registry = default_registry(api.clone(), config.skill.unmatched_intent)?;
        Ok(Self::new(SessionSettings::from(config), registry, api))
    }

    pub fn handler_count(&self) -> usize {
        self.registry.handler_count()
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Asks OneSphere for its service status without authenticating.
    pub async fn probe_status(&self) -> Result<ServiceStatus, ApiError> {
        self.api.service_status(&self.settings.api_base).await
    }

    pub async fn handle(&self, event: &Value) -> Result<ResponseEnvelope, SkillError> {
        let request = SkillRequest::from_json(event).map_err(reject_malformed)?;
        self.answer(request).await
    }

    /// Same as [`SkillRuntime::handle`] for a raw request body.
    pub async fn handle_slice(&self, body: &[u8]) -> Result<ResponseEnvelope, SkillError> {
        let request = SkillRequest::from_slice(body).map_err(reject_malformed)?;
        self.answer(request).await
    }

    async fn answer(&self, request: SkillRequest) -> Result<ResponseEnvelope, SkillError> {
        info!(
            event_name = "skill.request.received",
            correlation_id = %request.request_id,
            request_type = %request.request_type(),
            intent = request.intent_name().unwrap_or("none"),
            new_session = request.new_session,
            "skill request received"
        );

        if let Err(error) = request.validate_application(&self.settings.skill_id) {
            warn!(
                event_name = "skill.request.application_mismatch",
                correlation_id = %request.request_id,
                "request was not issued for this skill"
            );
            return Err(SkillError::Rejected { request_id: request.request_id, source: error });
        }

        let context =
            build_session_context(&self.settings, &request.session_id, self.api.as_ref()).await;

        let response = self.registry.dispatch(&request, &context).await.map_err(|error| {
            warn!(
                event_name = "skill.request.dispatch_failed",
                correlation_id = %request.request_id,
                error = %error,
                "request could not be answered"
            );
            SkillError::Dispatch { request_id: request.request_id.clone(), source: error }
        })?;

        info!(
            event_name = "skill.request.answered",
            correlation_id = %request.request_id,
            end_session = response.end_session,
            "skill request answered"
        );

        Ok(response.into_envelope(request.session_attributes))
    }
}

fn reject_malformed(error: RequestError) -> SkillError {
    warn!(event_name = "skill.request.invalid", error = %error, "rejected malformed request");
    SkillError::Invalid(error)
}
