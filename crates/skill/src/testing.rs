use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use osvoice_core::{RequestKind, SessionContext, SkillRequest};
use secrecy::SecretString;
use serde_json::{Map, Value};

use crate::api::{ApiError, MetricsQuery, OneSphereApi, ServiceStatus};

pub(crate) const SKILL_ID: &str = "amzn1.ask.skill.test";
pub(crate) const API_BASE: &str = "https://onesphere.example.com/rest";

/// In-memory OneSphere. Endpoints without a configured answer fail with a
/// transport error, and every metrics call is recorded.
#[derive(Default)]
pub(crate) struct FakeOneSphere {
    token: Option<String>,
    status: Option<Value>,
    metrics: Option<Value>,
    metric_queries: Mutex<Vec<MetricsQuery>>,
    tokens_seen: Mutex<Vec<String>>,
    session_calls: Mutex<usize>,
}

impl FakeOneSphere {
    pub(crate) fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_owned());
        self
    }

    pub(crate) fn with_status(mut self, status: Value) -> Self {
        self.status = Some(status);
        self
    }

    pub(crate) fn with_metrics(mut self, metrics: Value) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub(crate) fn metric_queries(&self) -> Vec<MetricsQuery> {
        self.metric_queries.lock().expect("metric queries lock").clone()
    }

    pub(crate) fn last_token(&self) -> Option<String> {
        self.tokens_seen.lock().expect("tokens lock").last().cloned()
    }

    pub(crate) fn session_calls(&self) -> usize {
        *self.session_calls.lock().expect("session calls lock")
    }
}

fn unreachable(endpoint: &str) -> ApiError {
    ApiError::Transport { endpoint: endpoint.to_owned(), message: "connection refused".to_owned() }
}

#[async_trait]
impl OneSphereApi for FakeOneSphere {
    async fn create_session(
        &self,
        _api_base: &str,
        _user_name: &str,
        _password: &SecretString,
    ) -> Result<Option<String>, ApiError> {
        *self.session_calls.lock().expect("session calls lock") += 1;
        match &self.token {
            Some(token) => Ok(Some(token.clone())),
            None => Err(unreachable("/session")),
        }
    }

    async fn service_status(&self, _api_base: &str) -> Result<ServiceStatus, ApiError> {
        let status = self.status.clone().ok_or_else(|| unreachable("/status"))?;
        serde_json::from_value(status).map_err(|error| ApiError::Decode {
            endpoint: "/status".to_owned(),
            message: error.to_string(),
        })
    }

    async fn metrics(
        &self,
        _api_base: &str,
        token: &str,
        query: &MetricsQuery,
    ) -> Result<Value, ApiError> {
        self.metric_queries.lock().expect("metric queries lock").push(query.clone());
        self.tokens_seen.lock().expect("tokens lock").push(token.to_owned());
        self.metrics.clone().ok_or_else(|| unreachable("/metrics"))
    }
}

pub(crate) fn context(token: &str) -> SessionContext {
    SessionContext {
        api_base: API_BASE.to_owned(),
        user_name: "operator".to_owned(),
        password: SecretString::from("s3cret".to_owned()),
        auth_token: token.to_owned(),
        skill_id: SKILL_ID.to_owned(),
        session_id: "SessionId.test".to_owned(),
    }
}

pub(crate) fn request_of(kind: RequestKind) -> SkillRequest {
    SkillRequest {
        request_id: "EdwRequestId.test".to_owned(),
        session_id: "SessionId.test".to_owned(),
        application_id: Some(SKILL_ID.to_owned()),
        user_id: Some("amzn1.ask.account.test".to_owned()),
        new_session: true,
        session_attributes: Map::new(),
        kind,
    }
}

pub(crate) fn intent_request(name: &str) -> SkillRequest {
    request_of(RequestKind::Intent { name: name.to_owned(), slots: BTreeMap::new() })
}

/// Raw voice-platform event JSON, as the platform would post it.
pub(crate) fn event(request: Value) -> Value {
    serde_json::json!({
        "version": "1.0",
        "session": {
            "new": true,
            "sessionId": "SessionId.test",
            "application": { "applicationId": SKILL_ID },
            "attributes": {},
            "user": { "userId": "amzn1.ask.account.test" }
        },
        "request": request
    })
}
