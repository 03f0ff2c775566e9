use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use osvoice_core::config::UnmatchedIntentPolicy;
use osvoice_core::{RequestType, ResponseError, SessionContext, SkillRequest, SpeechResponse};
use thiserror::Error;
use tracing::debug;

use crate::api::OneSphereApi;
use crate::handlers::{
    BroHugHandler, CostSavingsHandler, FallbackHandler, LaunchHandler, MetricHandler,
    MetricIntent, ServiceStatusHandler, SessionEndedHandler,
};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DispatchKey {
    pub request_type: RequestType,
    pub intent: Option<String>,
}

impl DispatchKey {
    pub fn new(request_type: RequestType, intent: Option<&str>) -> Self {
        Self { request_type, intent: intent.map(str::to_owned) }
    }
}

impl fmt::Display for DispatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.intent {
            Some(intent) => write!(f, "{}/{intent}", self.request_type),
            None => write!(f, "{}", self.request_type),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandlerError {
    #[error(transparent)]
    Response(#[from] ResponseError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("a handler is already registered for `{0}`")]
    DuplicateHandler(DispatchKey),
    #[error("a default handler is already registered")]
    DuplicateDefault,
    #[error("intent name `{intent}` cannot be registered for {request_type}")]
    IntentNameNotAllowed { request_type: RequestType, intent: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("no handler registered for {request_type} (intent: {intent:?})")]
    Unroutable { request_type: RequestType, intent: Option<String> },
    #[error("handler for {request_type} (intent: {intent:?}) failed: {source}")]
    Handler {
        request_type: RequestType,
        intent: Option<String>,
        #[source]
        source: HandlerError,
    },
}

#[async_trait]
pub trait IntentHandler: Send + Sync {
    async fn handle(
        &self,
        request: &SkillRequest,
        context: &SessionContext,
    ) -> Result<SpeechResponse, HandlerError>;
}

#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<DispatchKey, Arc<dyn IntentHandler>>,
    default_handler: Option<Arc<dyn IntentHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(
        &mut self,
        request_type: RequestType,
        intent: Option<&str>,
        handler: H,
    ) -> Result<(), RegistrationError>
    where
        H: IntentHandler + 'static,
    {
        if let Some(intent) = intent {
            if request_type != RequestType::Intent {
                return Err(RegistrationError::IntentNameNotAllowed {
                    request_type,
                    intent: intent.to_owned(),
                });
            }
        }

        let key = DispatchKey::new(request_type, intent);
        if self.handlers.contains_key(&key) {
            return Err(RegistrationError::DuplicateHandler(key));
        }
        self.handlers.insert(key, Arc::new(handler));
        Ok(())
    }

    pub fn set_default<H>(&mut self, handler: H) -> Result<(), RegistrationError>
    where
        H: IntentHandler + 'static,
    {
        if self.default_handler.is_some() {
            return Err(RegistrationError::DuplicateDefault);
        }
        self.default_handler = Some(Arc::new(handler));
        Ok(())
    }

    pub async fn dispatch(
        &self,
        request: &SkillRequest,
        context: &SessionContext,
    ) -> Result<SpeechResponse, DispatchError> {
        let request_type = request.request_type();
        let intent = request.intent_name();

        let Some(handler) = self.resolve(request_type, intent) else {
            return Err(DispatchError::Unroutable {
                request_type,
                intent: intent.map(str::to_owned),
            });
        };

        handler.handle(request, context).await.map_err(|source| DispatchError::Handler {
            request_type,
            intent: intent.map(str::to_owned),
            source,
        })
    }

    fn resolve(
        &self,
        request_type: RequestType,
        intent: Option<&str>,
    ) -> Option<&Arc<dyn IntentHandler>> {
        if let Some(intent) = intent {
            if let Some(handler) = self.handlers.get(&DispatchKey::new(request_type, Some(intent)))
            {
                return Some(handler);
            }
        }

        if let Some(handler) = self.handlers.get(&DispatchKey::new(request_type, None)) {
            return Some(handler);
        }

        debug!(
            event_name = "skill.dispatch.default_handler",
            request_type = %request_type,
            intent = intent.unwrap_or("none"),
            has_default = self.default_handler.is_some(),
            "no specific handler registered"
        );
        self.default_handler.as_ref()
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn has_default(&self) -> bool {
        self.default_handler.is_some()
    }
}

/// Registers every handler the skill serves. Runs once at startup.
pub fn default_registry(
    api: Arc<dyn OneSphereApi>,
    policy: UnmatchedIntentPolicy,
) -> Result<HandlerRegistry, RegistrationError> {
    let mut registry = HandlerRegistry::new();

    if policy == UnmatchedIntentPolicy::Fallback {
        registry.set_default(FallbackHandler)?;
    }
    registry.register(RequestType::Launch, None, LaunchHandler)?;
    registry.register(RequestType::SessionEnded, None, SessionEndedHandler)?;
    registry.register(RequestType::Intent, Some("BroHugDistance"), BroHugHandler)?;
    registry.register(
        RequestType::Intent,
        Some("ServiceStatus"),
        ServiceStatusHandler::new(api.clone()),
    )?;
    registry.register(
        RequestType::Intent,
        Some("TotalMonSpend"),
        MetricHandler::new(api.clone(), MetricIntent::total_monthly_spend()),
    )?;
    registry.register(
        RequestType::Intent,
        Some("OnpremCurrentMonSpend"),
        MetricHandler::new(api.clone(), MetricIntent::private_cloud_spend()),
    )?;
    registry.register(RequestType::Intent, Some("OnPremCostSavings"), CostSavingsHandler)?;
    registry.register(
        RequestType::Intent,
        Some("AWSNCSManagedUtil"),
        MetricHandler::new(api, MetricIntent::private_cloud_efficiency()),
    )?;

    Ok(registry)
}
