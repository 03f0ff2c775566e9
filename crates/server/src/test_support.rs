use std::sync::Arc;

use async_trait::async_trait;
use osvoice_core::config::AppConfig;
use osvoice_skill::{ApiError, MetricsQuery, OneSphereApi, ServiceStatus, SkillRuntime};
use secrecy::SecretString;
use serde_json::Value;

use crate::routes::AppState;

pub const SKILL_ID: &str = "amzn1.ask.skill.test";

/// OneSphere stand-in that is either up with a fixed status or entirely down.
pub struct StubOneSphere {
    status: Option<String>,
}

impl StubOneSphere {
    pub fn up(status: &str) -> Self {
        Self { status: Some(status.to_string()) }
    }

    pub fn down() -> Self {
        Self { status: None }
    }

    fn unreachable(&self, endpoint: &str) -> ApiError {
        ApiError::Transport { endpoint: endpoint.to_string(), message: "connection refused".into() }
    }
}

#[async_trait]
impl OneSphereApi for StubOneSphere {
    async fn create_session(
        &self,
        _api_base: &str,
        _user_name: &str,
        _password: &SecretString,
    ) -> Result<Option<String>, ApiError> {
        match self.status {
            Some(_) => Ok(Some("tok-test".to_string())),
            None => Err(self.unreachable("/session")),
        }
    }

    async fn service_status(&self, _api_base: &str) -> Result<ServiceStatus, ApiError> {
        match &self.status {
            Some(service) => Ok(ServiceStatus { service: Some(service.clone()) }),
            None => Err(self.unreachable("/status")),
        }
    }

    async fn metrics(
        &self,
        _api_base: &str,
        _token: &str,
        _query: &MetricsQuery,
    ) -> Result<Value, ApiError> {
        Err(self.unreachable("/metrics"))
    }
}

pub fn runtime(api: StubOneSphere) -> Arc<SkillRuntime> {
    let mut config = AppConfig::default();
    config.onesphere.api_base = "https://onesphere.example.com/rest".to_string();
    config.onesphere.user = "operator".to_string();
    config.onesphere.password = SecretString::from("s3cret".to_string());
    config.skill.skill_id = SKILL_ID.to_string();

    Arc::new(SkillRuntime::with_api(&config, Arc::new(api)).expect("runtime"))
}

pub fn state(api: StubOneSphere) -> AppState {
    AppState { runtime: runtime(api) }
}
