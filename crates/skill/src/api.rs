use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("onesphere request to `{endpoint}` failed: {message}")]
    Transport { endpoint: String, message: String },
    #[error("onesphere endpoint `{endpoint}` returned {status}")]
    Status { endpoint: String, status: StatusCode },
    #[error("onesphere endpoint `{endpoint}` returned an undecodable body: {message}")]
    Decode { endpoint: String, message: String },
    #[error("onesphere client could not be built: {0}")]
    Client(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ServiceStatus {
    pub service: Option<String>,
}

/// Query parameters for `GET /metrics`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetricsQuery {
    pub category: String,
    pub name: String,
    pub period: String,
    pub period_count: String,
    pub view: String,
    pub group_by: Option<String>,
    pub query: Option<String>,
}

impl MetricsQuery {
    /// Current-month query for a provider metric.
    pub fn current_month(name: &str) -> Self {
        Self {
            category: "providers".to_owned(),
            name: name.to_owned(),
            period: "month".to_owned(),
            period_count: "-1".to_owned(),
            view: "full".to_owned(),
            group_by: None,
            query: None,
        }
    }

    pub fn group_by(mut self, group_by: &str) -> Self {
        self.group_by = Some(group_by.to_owned());
        self
    }

    pub fn filter(mut self, query: &str) -> Self {
        self.query = Some(query.to_owned());
        self
    }

    pub fn to_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = vec![
            ("category", self.category.as_str()),
            ("name", self.name.as_str()),
            ("period", self.period.as_str()),
            ("periodCount", self.period_count.as_str()),
            ("view", self.view.as_str()),
        ];
        if let Some(group_by) = &self.group_by {
            pairs.push(("groupBy", group_by));
        }
        if let Some(query) = &self.query {
            pairs.push(("query", query));
        }
        pairs
    }
}

/// The OneSphere REST endpoints the skill consumes.
#[async_trait]
pub trait OneSphereApi: Send + Sync {
    /// Returns the session token, or `None` when the response carries no token.
    async fn create_session(
        &self,
        api_base: &str,
        user_name: &str,
        password: &SecretString,
    ) -> Result<Option<String>, ApiError>;

    async fn service_status(&self, api_base: &str) -> Result<ServiceStatus, ApiError>;

    async fn metrics(
        &self,
        api_base: &str,
        token: &str,
        query: &MetricsQuery,
    ) -> Result<Value, ApiError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionPayload<'a> {
    user_name: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct SessionTokenResponse {
    token: Option<String>,
}

/// reqwest-backed client. One attempt per call; every failure is logged.
#[derive(Clone)]
pub struct HttpOneSphereClient {
    client: Client,
}

impl HttpOneSphereClient {
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| ApiError::Client(error.to_string()))?;
        Ok(Self { client })
    }

    async fn send_json<T>(
        &self,
        endpoint: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = request.send().await.map_err(|error| {
            error!(
                event_name = "onesphere.request.failed",
                endpoint,
                error = %error,
                timeout = error.is_timeout(),
                "onesphere request failed"
            );
            ApiError::Transport { endpoint: endpoint.to_owned(), message: error.to_string() }
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(
                event_name = "onesphere.request.unexpected_status",
                endpoint,
                status = status.as_u16(),
                "onesphere returned an unexpected response"
            );
            return Err(ApiError::Status { endpoint: endpoint.to_owned(), status });
        }

        response.json::<T>().await.map_err(|error| {
            if error.is_timeout() {
                error!(
                    event_name = "onesphere.request.failed",
                    endpoint,
                    error = %error,
                    timeout = true,
                    "onesphere response body timed out"
                );
                return ApiError::Transport {
                    endpoint: endpoint.to_owned(),
                    message: error.to_string(),
                };
            }
            error!(
                event_name = "onesphere.request.decode_failed",
                endpoint,
                error = %error,
                "onesphere response body could not be decoded"
            );
            ApiError::Decode { endpoint: endpoint.to_owned(), message: error.to_string() }
        })
    }
}

fn endpoint_url(api_base: &str, path: &str) -> String {
    format!("{}{path}", api_base.trim_end_matches('/'))
}

#[async_trait]
impl OneSphereApi for HttpOneSphereClient {
    async fn create_session(
        &self,
        api_base: &str,
        user_name: &str,
        password: &SecretString,
    ) -> Result<Option<String>, ApiError> {
        let url = endpoint_url(api_base, "/session");
        let request = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .json(&SessionPayload { user_name, password: password.expose_secret() });

        let body: SessionTokenResponse = self.send_json("/session", request).await?;
        Ok(body.token.filter(|token| !token.is_empty()))
    }

    async fn service_status(&self, api_base: &str) -> Result<ServiceStatus, ApiError> {
        let url = endpoint_url(api_base, "/status");
        let request = self.client.get(&url).header(header::ACCEPT, "application/json");
        self.send_json("/status", request).await
    }

    async fn metrics(
        &self,
        api_base: &str,
        token: &str,
        query: &MetricsQuery,
    ) -> Result<Value, ApiError> {
        let url = endpoint_url(api_base, "/metrics");
        let request = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .header(header::AUTHORIZATION, token)
            .query(&query.to_pairs());
        self.send_json("/metrics", request).await
    }
}
