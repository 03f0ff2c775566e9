use osvoice_core::config::AppConfig;
use osvoice_core::SessionContext;
use secrecy::SecretString;
use tracing::{debug, warn};

use crate::api::OneSphereApi;

/// The fixed part of every session context, taken from configuration at startup.
#[derive(Clone, Debug)]
pub struct SessionSettings {
    pub api_base: String,
    pub user_name: String,
    pub password: SecretString,
    pub skill_id: String,
}

impl From<&AppConfig> for SessionSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            api_base: config.onesphere.api_base.trim_end_matches('/').to_owned(),
            user_name: config.onesphere.user.clone(),
            password: config.onesphere.password.clone(),
            skill_id: config.skill.skill_id.clone(),
        }
    }
}

/// Authenticates against OneSphere and assembles the context for one invocation.
///
/// Every call re-authenticates. A failed login leaves the token empty; handlers
/// treat that as "unauthenticated" and degrade their answer.
pub async fn build_session_context(
    settings: &SessionSettings,
    session_id: &str,
    api: &dyn OneSphereApi,
) -> SessionContext {
    let auth_token =
        match api.create_session(&settings.api_base, &settings.user_name, &settings.password).await
        {
            Ok(Some(token)) => {
                debug!(
                    event_name = "skill.session.authenticated",
                    session_id,
                    api_base = %settings.api_base,
                    "onesphere session created"
                );
                token
            }
            Ok(None) => {
                warn!(
                    event_name = "skill.session.token_missing",
                    session_id,
                    "onesphere session response carried no token"
                );
                String::new()
            }
            Err(error) => {
                warn!(
                    event_name = "skill.session.auth_failed",
                    session_id,
                    error = %error,
                    "onesphere authentication failed, continuing unauthenticated"
                );
                String::new()
            }
        };

    SessionContext {
        api_base: settings.api_base.clone(),
        user_name: settings.user_name.clone(),
        password: settings.password.clone(),
        auth_token,
        skill_id: settings.skill_id.clone(),
        session_id: session_id.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use secrecy::SecretString;
    use serde_json::Value;

    use super::{build_session_context, SessionSettings};
    use crate::api::{ApiError, MetricsQuery, OneSphereApi, ServiceStatus};

    struct CountingAuth {
        token: Option<&'static str>,
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl OneSphereApi for CountingAuth {
        async fn create_session(
            &self,
            _api_base: &str,
            _user_name: &str,
            _password: &SecretString,
        ) -> Result<Option<String>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ApiError::Transport {
                    endpoint: "/session".to_owned(),
                    message: "connection refused".to_owned(),
                });
            }
            Ok(self.token.map(str::to_owned))
        }

        async fn service_status(&self, _api_base: &str) -> Result<ServiceStatus, ApiError> {
            Ok(ServiceStatus::default())
        }

        async fn metrics(
            &self,
            _api_base: &str,
            _token: &str,
            _query: &MetricsQuery,
        ) -> Result<Value, ApiError> {
            Ok(Value::Null)
        }
    }

    fn settings() -> SessionSettings {
        SessionSettings {
            api_base: "https://onesphere.example.com/rest".to_owned(),
            user_name: "operator".to_owned(),
            password: SecretString::from("s3cret".to_owned()),
            skill_id: "amzn1.ask.skill.test".to_owned(),
        }
    }

    #[tokio::test]
    async fn successful_login_populates_token() {
        let api = CountingAuth { token: Some("tok-1"), fail: false, calls: AtomicUsize::new(0) };

        let context = build_session_context(&settings(), "SessionId.1", &api).await;

        assert_eq!(context.auth_token, "tok-1");
        assert_eq!(context.session_id, "SessionId.1");
        assert_eq!(context.skill_id, "amzn1.ask.skill.test");
        assert!(context.is_authenticated());
    }

    #[tokio::test]
    async fn failed_login_yields_empty_token() {
        let api = CountingAuth { token: None, fail: true, calls: AtomicUsize::new(0) };

        let context = build_session_context(&settings(), "SessionId.1", &api).await;

        assert_eq!(context.auth_token, "");
        assert!(!context.is_authenticated());
    }

    #[tokio::test]
    async fn every_invocation_authenticates_again() {
        let api = CountingAuth { token: Some("tok-1"), fail: false, calls: AtomicUsize::new(0) };

        build_session_context(&settings(), "S1", &api).await;
        build_session_context(&settings(), "S1", &api).await;

        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
    }
}
