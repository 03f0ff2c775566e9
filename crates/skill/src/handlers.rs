//! Intent handlers.
//!
//! Each handler answers with exactly one spoken response and never fails
//! because OneSphere is down or answers with an unexpected payload: those
//! cases become fallback speech instead.

use std::sync::Arc;

use async_trait::async_trait;
use osvoice_core::{
    format_currency, MetricData, ResponseBuilder, SessionContext, SkillRequest, SpeechResponse,
};
use tracing::{info, warn};

use crate::api::{MetricsQuery, OneSphereApi};
use crate::dispatch::{HandlerError, IntentHandler};

pub const SERVICE_UNAVAILABLE: &str = "The OneSphere service is currently unavailable";
pub const METRICS_UNRESPONSIVE: &str = "The OneSphere metrics service did not respond correctly";

/// Answers anything no other handler claims.
pub struct FallbackHandler;

#[async_trait]
impl IntentHandler for FallbackHandler {
    async fn handle(
        &self,
        _request: &SkillRequest,
        _context: &SessionContext,
    ) -> Result<SpeechResponse, HandlerError> {
        Ok(ResponseBuilder::new("Just ask").build()?)
    }
}

pub struct LaunchHandler;

#[async_trait]
impl IntentHandler for LaunchHandler {
    async fn handle(
        &self,
        _request: &SkillRequest,
        _context: &SessionContext,
    ) -> Result<SpeechResponse, HandlerError> {
        Ok(ResponseBuilder::new(
            "Welcome to the OneSphere voice activated cloud management console. \
             Please ask me something about your OneSphere service",
        )
        .build()?)
    }
}

pub struct SessionEndedHandler;

#[async_trait]
impl IntentHandler for SessionEndedHandler {
    async fn handle(
        &self,
        _request: &SkillRequest,
        _context: &SessionContext,
    ) -> Result<SpeechResponse, HandlerError> {
        Ok(ResponseBuilder::new(
            "Thank you for trying the OneSphere voice activated cloud management console. \
             Have a nice day!",
        )
        .end_session(true)
        .build()?)
    }
}

pub struct BroHugHandler;

#[async_trait]
impl IntentHandler for BroHugHandler {
    async fn handle(
        &self,
        _request: &SkillRequest,
        _context: &SessionContext,
    ) -> Result<SpeechResponse, HandlerError> {
        Ok(ResponseBuilder::new(
            "You must remember to maintain a safe groin distance of 1 foot \
             when executing a proper bro hug.",
        )
        .card("GetBroHugIntent activated", "asked alexa to give BroHug advice")
        .build()?)
    }
}

pub struct ServiceStatusHandler {
    api: Arc<dyn OneSphereApi>,
}

impl ServiceStatusHandler {
    pub fn new(api: Arc<dyn OneSphereApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl IntentHandler for ServiceStatusHandler {
    async fn handle(
        &self,
        request: &SkillRequest,
        context: &SessionContext,
    ) -> Result<SpeechResponse, HandlerError> {
        // The status endpoint is public, so an unauthenticated context still asks.
        let speech = match self.api.service_status(&context.api_base).await {
            Ok(status) => match status.service.filter(|service| !service.trim().is_empty()) {
                Some(service) => format!("The OneSphere service is currently {service}"),
                None => {
                    warn!(
                        event_name = "skill.status.missing_field",
                        correlation_id = %request.request_id,
                        "status response has no `service` field"
                    );
                    SERVICE_UNAVAILABLE.to_owned()
                }
            },
            Err(error) => {
                warn!(
                    event_name = "skill.status.degraded",
                    correlation_id = %request.request_id,
                    error = %error,
                    "status lookup failed"
                );
                SERVICE_UNAVAILABLE.to_owned()
            }
        };

        Ok(ResponseBuilder::new(speech)
            .card(
                "GetServiceStatusIntent activated",
                "asked alexa to query the OneSphere service status REST API",
            )
            .build()?)
    }
}

/// Describes one cost metric intent: what to query and how to phrase the answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetricIntent {
    pub query: MetricsQuery,
    pub speech_prefix: &'static str,
    pub card_title: &'static str,
    pub card_content: &'static str,
}

impl MetricIntent {
    pub fn total_monthly_spend() -> Self {
        Self {
            query: MetricsQuery::current_month("cost.total"),
            speech_prefix: "The OneSphere service spend for this month is",
            card_title: "GetTotMonSpendIntent activated",
            card_content: "asked alexa to query the OneSphere metrics REST API and calculate \
                           the total monthly spend",
        }
    }

    pub fn private_cloud_spend() -> Self {
        Self {
            query: MetricsQuery::current_month("cost.usage")
                .filter("providerTypeUri EQ /rest/provider-types/ncs"),
            speech_prefix: "The OneSphere service private cloud spend for this month is",
            card_title: "GetOnpremSpendIntent activated",
            card_content: "asked alexa to query the OneSphere metrics REST API and calculate \
                           the total private cloud monthly spend",
        }
    }

    pub fn private_cloud_efficiency() -> Self {
        Self {
            query: MetricsQuery::current_month("cost.efficiency").group_by("providerTypeUri"),
            speech_prefix: "The OneSphere service private cloud efficiency for this month is",
            card_title: "GetOnpremCostEfficiencyIntent activated",
            card_content: "asked alexa to query the OneSphere metrics REST API and calculate \
                           the total private cloud monthly cost efficiency",
        }
    }
}

pub struct MetricHandler {
    api: Arc<dyn OneSphereApi>,
    intent: MetricIntent,
}

impl MetricHandler {
    pub fn new(api: Arc<dyn OneSphereApi>, intent: MetricIntent) -> Self {
        Self { api, intent }
    }

    async fn speech(&self, request: &SkillRequest, context: &SessionContext) -> String {
        if !context.is_authenticated() {
            warn!(
                event_name = "skill.metrics.unauthenticated",
                correlation_id = %request.request_id,
                metric = %self.intent.query.name,
                "no onesphere token, skipping metrics query"
            );
            return SERVICE_UNAVAILABLE.to_owned();
        }

        let payload =
            match self.api.metrics(&context.api_base, &context.auth_token, &self.intent.query).await
            {
                Ok(payload) => payload,
                Err(error) => {
                    warn!(
                        event_name = "skill.metrics.degraded",
                        correlation_id = %request.request_id,
                        metric = %self.intent.query.name,
                        error = %error,
                        "metrics query failed"
                    );
                    return METRICS_UNRESPONSIVE.to_owned();
                }
            };

        let aggregated = MetricData::from_value(&payload)
            .and_then(|data| data.cost().map(|cost| (data.record_count(), cost)));

        match aggregated {
            Ok((records, cost)) => {
                info!(
                    event_name = "skill.metrics.aggregated",
                    correlation_id = %request.request_id,
                    metric = %self.intent.query.name,
                    records,
                    cost = %cost,
                    "metrics aggregated"
                );
                format!("{} {}", self.intent.speech_prefix, format_currency(cost))
            }
            Err(error) => {
                warn!(
                    event_name = "skill.metrics.shape_error",
                    correlation_id = %request.request_id,
                    metric = %self.intent.query.name,
                    error = %error,
                    "metrics payload has an unexpected shape"
                );
                METRICS_UNRESPONSIVE.to_owned()
            }
        }
    }
}

#[async_trait]
impl IntentHandler for MetricHandler {
    async fn handle(
        &self,
        request: &SkillRequest,
        context: &SessionContext,
    ) -> Result<SpeechResponse, HandlerError> {
        let speech = self.speech(request, context).await;
        Ok(ResponseBuilder::new(speech)
            .card(self.intent.card_title, self.intent.card_content)
            .build()?)
    }
}

/// Placeholder until OneSphere offers a savings metric to query.
pub struct CostSavingsHandler;

#[async_trait]
impl IntentHandler for CostSavingsHandler {
    async fn handle(
        &self,
        _request: &SkillRequest,
        _context: &SessionContext,
    ) -> Result<SpeechResponse, HandlerError> {
        Ok(ResponseBuilder::new(
            "The OneSphere service private cloud cost savings feature is not yet implemented",
        )
        .card(
            "GetOnpremCostSavingsIntent activated",
            "asked alexa to query the OneSphere metrics REST API and calculate \
             the total private cloud monthly cost savings",
        )
        .build()?)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;
    use std::time::Duration;

    use mockito::Matcher;
    use serde_json::json;

    use super::{
        BroHugHandler, CostSavingsHandler, FallbackHandler, LaunchHandler, MetricHandler,
        MetricIntent, ServiceStatusHandler, SessionEndedHandler, METRICS_UNRESPONSIVE,
        SERVICE_UNAVAILABLE,
    };
    use crate::api::{HttpOneSphereClient, OneSphereApi};
    use crate::dispatch::IntentHandler;
    use crate::testing::{context, intent_request, FakeOneSphere};

    #[tokio::test]
    async fn service_status_reports_backend_status() {
        let api = Arc::new(FakeOneSphere::default().with_status(json!({ "service": "OK" })));
        let handler = ServiceStatusHandler::new(api);

        let response =
            handler.handle(&intent_request("ServiceStatus"), &context("tok")).await.expect("ok");

        assert_eq!(response.speech_text(), "The OneSphere service is currently OK");
        assert!(!response.end_session);
        assert_eq!(
            response.card.as_ref().map(|card| card.title.as_str()),
            Some("GetServiceStatusIntent activated")
        );
    }

    #[tokio::test]
    async fn service_status_degrades_without_token_or_backend() {
        let handler = ServiceStatusHandler::new(Arc::new(FakeOneSphere::default()));

        let response =
            handler.handle(&intent_request("ServiceStatus"), &context("")).await.expect("ok");

        assert_eq!(response.speech_text(), SERVICE_UNAVAILABLE);
        assert!(!response.end_session);
    }

    #[tokio::test]
    async fn service_status_without_service_field_is_unavailable() {
        let api = Arc::new(FakeOneSphere::default().with_status(json!({ "state": "OK" })));
        let handler = ServiceStatusHandler::new(api);

        let response =
            handler.handle(&intent_request("ServiceStatus"), &context("tok")).await.expect("ok");

        assert_eq!(response.speech_text(), SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn total_spend_sums_members_and_formats_currency() {
        let api = Arc::new(FakeOneSphere::default().with_metrics(json!({
            "total": "2",
            "members": [{ "values": [{ "value": 100 }] }, { "values": [{ "value": 50.5 }] }]
        })));
        let handler = MetricHandler::new(api.clone(), MetricIntent::total_monthly_spend());

        let response =
            handler.handle(&intent_request("TotalMonSpend"), &context("tok")).await.expect("ok");

        assert_eq!(response.speech_text(), "The OneSphere service spend for this month is $150.50");
        let queries = api.metric_queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].name, "cost.total");
        assert_eq!(queries[0].period, "month");
        assert_eq!(api.last_token().as_deref(), Some("tok"));
    }

    #[tokio::test]
    async fn private_cloud_spend_filters_on_provider_type() {
        let api = Arc::new(FakeOneSphere::default().with_metrics(json!({
            "total": 1,
            "members": [{ "values": [{ "value": 1234.5 }] }]
        })));
        let handler = MetricHandler::new(api.clone(), MetricIntent::private_cloud_spend());

        let response = handler
            .handle(&intent_request("OnpremCurrentMonSpend"), &context("tok"))
            .await
            .expect("ok");

        assert_eq!(
            response.speech_text(),
            "The OneSphere service private cloud spend for this month is $1,234.50"
        );
        assert_eq!(
            api.metric_queries()[0].query.as_deref(),
            Some("providerTypeUri EQ /rest/provider-types/ncs")
        );
    }

    #[tokio::test]
    async fn efficiency_groups_by_provider_type_and_handles_empty_results() {
        let api = Arc::new(FakeOneSphere::default().with_metrics(json!({ "total": 0, "members": [] })));
        let handler = MetricHandler::new(api.clone(), MetricIntent::private_cloud_efficiency());

        let response = handler
            .handle(&intent_request("AWSNCSManagedUtil"), &context("tok"))
            .await
            .expect("ok");

        assert_eq!(
            response.speech_text(),
            "The OneSphere service private cloud efficiency for this month is $0.00"
        );
        assert_eq!(api.metric_queries()[0].group_by.as_deref(), Some("providerTypeUri"));
    }

    #[tokio::test]
    async fn metrics_are_not_queried_without_a_token() {
        for (intent_name, intent) in [
            ("TotalMonSpend", MetricIntent::total_monthly_spend()),
            ("OnpremCurrentMonSpend", MetricIntent::private_cloud_spend()),
            ("AWSNCSManagedUtil", MetricIntent::private_cloud_efficiency()),
        ] {
            let api = Arc::new(FakeOneSphere::default().with_metrics(json!({ "total": 0 })));
            let handler = MetricHandler::new(api.clone(), intent);

            let response =
                handler.handle(&intent_request(intent_name), &context("")).await.expect("ok");

            assert_eq!(response.speech_text(), SERVICE_UNAVAILABLE, "{intent_name}");
            assert!(!response.end_session, "{intent_name}");
            assert!(api.metric_queries().is_empty(), "{intent_name} queried metrics");
        }
    }

    #[tokio::test]
    async fn cost_overflow_degrades_to_fallback_speech() {
        let api = Arc::new(FakeOneSphere::default().with_metrics(json!({
            "total": 2,
            "members": [{ "values": [{ "value": 5e28 }] }, { "values": [{ "value": 5e28 }] }]
        })));
        let handler = MetricHandler::new(api, MetricIntent::total_monthly_spend());

        let response =
            handler.handle(&intent_request("TotalMonSpend"), &context("tok")).await.expect("ok");

        assert_eq!(response.speech_text(), METRICS_UNRESPONSIVE);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn backend_timeouts_degrade_to_fallback_speech() {
        let mut server = mockito::Server::new_async().await;
        let slow_body = |writer: &mut dyn Write| {
            std::thread::sleep(Duration::from_secs(3));
            writer.write_all(b"{}")
        };
        let _metrics = server
            .mock("GET", "/metrics")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_chunked_body(slow_body)
            .create_async()
            .await;
        let _status = server
            .mock("GET", "/status")
            .with_status(200)
            .with_chunked_body(slow_body)
            .create_async()
            .await;

        let client = HttpOneSphereClient::new(Duration::from_secs(1)).expect("client");
        let api: Arc<dyn OneSphereApi> = Arc::new(client);
        let mut context = context("tok");
        context.api_base = server.url();

        let metrics = MetricHandler::new(api.clone(), MetricIntent::private_cloud_spend())
            .handle(&intent_request("OnpremCurrentMonSpend"), &context)
            .await
            .expect("ok");
        assert_eq!(metrics.speech_text(), METRICS_UNRESPONSIVE);

        let status = ServiceStatusHandler::new(api)
            .handle(&intent_request("ServiceStatus"), &context)
            .await
            .expect("ok");
        assert_eq!(status.speech_text(), SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn failed_or_malformed_metrics_degrade_to_fallback_speech() {
        let failing = Arc::new(FakeOneSphere::default());
        let response = MetricHandler::new(failing, MetricIntent::total_monthly_spend())
            .handle(&intent_request("TotalMonSpend"), &context("tok"))
            .await
            .expect("ok");
        assert_eq!(response.speech_text(), METRICS_UNRESPONSIVE);

        let malformed = Arc::new(FakeOneSphere::default().with_metrics(json!({ "total": 3 })));
        let response = MetricHandler::new(malformed, MetricIntent::total_monthly_spend())
            .handle(&intent_request("TotalMonSpend"), &context("tok"))
            .await
            .expect("ok");
        assert_eq!(response.speech_text(), METRICS_UNRESPONSIVE);
        assert!(!response.end_session);
    }

    #[tokio::test]
    async fn static_handlers_answer_without_backend_calls() {
        let request = intent_request("Anything");
        let context = context("");

        let fallback = FallbackHandler.handle(&request, &context).await.expect("fallback");
        assert_eq!(fallback.speech_text(), "Just ask");

        let launch = LaunchHandler.handle(&request, &context).await.expect("launch");
        assert!(launch.speech_text().starts_with("Welcome to the OneSphere"));
        assert!(!launch.end_session);

        let ended = SessionEndedHandler.handle(&request, &context).await.expect("ended");
        assert!(ended.speech_text().contains("Have a nice day"));
        assert!(ended.end_session);

        let hug = BroHugHandler.handle(&request, &context).await.expect("hug");
        assert!(hug.speech_text().contains("safe groin distance of 1 foot"));
        assert!(hug.card.is_some());

        let savings = CostSavingsHandler.handle(&request, &context).await.expect("savings");
        assert!(savings.speech_text().ends_with("is not yet implemented"));
    }
}
