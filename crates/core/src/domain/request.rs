use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RequestType {
    Launch,
    Intent,
    SessionEnded,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Launch => "LaunchRequest",
            Self::Intent => "IntentRequest",
            Self::SessionEnded => "SessionEndedRequest",
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RequestType {
    type Err = RequestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "LaunchRequest" => Ok(Self::Launch),
            "IntentRequest" => Ok(Self::Intent),
            "SessionEndedRequest" => Ok(Self::SessionEnded),
            other => Err(RequestError::UnsupportedRequestType(other.to_owned())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestKind {
    Launch,
    Intent { name: String, slots: BTreeMap<String, Option<String>> },
    SessionEnded { reason: Option<String> },
}

impl RequestKind {
    pub fn request_type(&self) -> RequestType {
        match self {
            Self::Launch => RequestType::Launch,
            Self::Intent { .. } => RequestType::Intent,
            Self::SessionEnded { .. } => RequestType::SessionEnded,
        }
    }
}

/// A voice-platform request after boundary validation.
#[derive(Clone, Debug, PartialEq)]
pub struct SkillRequest {
    pub request_id: String,
    pub session_id: String,
    pub application_id: Option<String>,
    pub user_id: Option<String>,
    pub new_session: bool,
    pub session_attributes: Map<String, Value>,
    pub kind: RequestKind,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("request body is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("request body does not match the voice request shape: {0}")]
    Malformed(String),
    #[error("request is missing `{0}`")]
    MissingField(&'static str),
    #[error("unsupported request type `{0}`")]
    UnsupportedRequestType(String),
    #[error("application id {actual:?} does not match the configured skill id")]
    InvalidApplicationId { expected: String, actual: Option<String> },
}

impl SkillRequest {
    pub fn from_slice(body: &[u8]) -> Result<Self, RequestError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|error| RequestError::InvalidJson(error.to_string()))?;
        Self::from_json(&value)
    }

    pub fn from_json(value: &Value) -> Result<Self, RequestError> {
        let raw = RawEnvelope::deserialize(value)
            .map_err(|error| RequestError::Malformed(error.to_string()))?;

        let request = raw.request.ok_or(RequestError::MissingField("request"))?;
        let request_type = request
            .request_type
            .filter(|value| !value.trim().is_empty())
            .ok_or(RequestError::MissingField("request.type"))?;
        let request_id = request
            .request_id
            .filter(|value| !value.trim().is_empty())
            .ok_or(RequestError::MissingField("request.requestId"))?;

        let kind = match request_type.parse::<RequestType>()? {
            RequestType::Launch => RequestKind::Launch,
            RequestType::Intent => {
                let intent = request.intent.ok_or(RequestError::MissingField("request.intent"))?;
                let name = intent
                    .name
                    .filter(|value| !value.trim().is_empty())
                    .ok_or(RequestError::MissingField("request.intent.name"))?;
                let slots = intent
                    .slots
                    .unwrap_or_default()
                    .into_iter()
                    .map(|(key, slot)| (key, slot.value))
                    .collect();
                RequestKind::Intent { name, slots }
            }
            RequestType::SessionEnded => RequestKind::SessionEnded { reason: request.reason },
        };

        let session = raw.session.unwrap_or_default();
        let system = raw.context.and_then(|context| context.system);
        let application_id = session
            .application
            .and_then(|application| application.application_id)
            .or_else(|| {
                system
                    .as_ref()
                    .and_then(|system| system.application.as_ref())
                    .and_then(|application| application.application_id.clone())
            });
        let user_id = session.user.and_then(|user| user.user_id).or_else(|| {
            system.and_then(|system| system.user).and_then(|user| user.user_id)
        });

        Ok(Self {
            request_id,
            session_id: session.session_id.unwrap_or_default(),
            application_id,
            user_id,
            new_session: session.new.unwrap_or(false),
            session_attributes: session.attributes.unwrap_or_default(),
            kind,
        })
    }

    pub fn request_type(&self) -> RequestType {
        self.kind.request_type()
    }

    pub fn intent_name(&self) -> Option<&str> {
        match &self.kind {
            RequestKind::Intent { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn slot(&self, name: &str) -> Option<&str> {
        match &self.kind {
            RequestKind::Intent { slots, .. } => slots.get(name).and_then(|value| value.as_deref()),
            _ => None,
        }
    }

    /// Rejects requests whose application id is absent or issued for another skill.
    pub fn validate_application(&self, skill_id: &str) -> Result<(), RequestError> {
        match self.application_id.as_deref() {
            Some(actual) if actual == skill_id => Ok(()),
            actual => Err(RequestError::InvalidApplicationId {
                expected: skill_id.to_owned(),
                actual: actual.map(str::to_owned),
            }),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawEnvelope {
    session: Option<RawSession>,
    context: Option<RawContext>,
    request: Option<RawRequest>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSession {
    new: Option<bool>,
    session_id: Option<String>,
    application: Option<RawApplication>,
    attributes: Option<Map<String, Value>>,
    user: Option<RawUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawApplication {
    application_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUser {
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawContext {
    #[serde(rename = "System")]
    system: Option<RawSystem>,
}

#[derive(Debug, Deserialize)]
struct RawSystem {
    application: Option<RawApplication>,
    user: Option<RawUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRequest {
    #[serde(rename = "type")]
    request_type: Option<String>,
    request_id: Option<String>,
    intent: Option<RawIntent>,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawIntent {
    name: Option<String>,
    slots: Option<BTreeMap<String, RawSlot>>,
}

#[derive(Debug, Deserialize)]
struct RawSlot {
    value: Option<String>,
}
