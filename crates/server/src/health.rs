use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use osvoice_skill::SkillRuntime;
use serde::Serialize;

use crate::routes::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub onesphere: HealthCheck,
    pub handler_count: usize,
    pub checked_at: String,
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let onesphere = onesphere_check(&state.runtime).await;
    let ready = onesphere.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "osvoice-server runtime initialized".to_string(),
        },
        onesphere,
        handler_count: state.runtime.handler_count(),
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn onesphere_check(runtime: &SkillRuntime) -> HealthCheck {
    match runtime.probe_status().await {
        Ok(status) => HealthCheck {
            status: "ready",
            detail: format!(
                "status endpoint reports `{}`",
                status.service.as_deref().unwrap_or("unknown")
            ),
        },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("status endpoint failed: {error}") }
        }
    }
}
