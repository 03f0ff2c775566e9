use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use osvoice_core::{InterfaceError, ResponseEnvelope};
use osvoice_skill::SkillRuntime;
use serde::Serialize;
use tracing::{error, warn};
use uuid::Uuid;

use crate::health::health;

#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<SkillRuntime>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: &'static str,
    pub correlation_id: String,
}

impl From<&InterfaceError> for ErrorBody {
    fn from(error: &InterfaceError) -> Self {
        Self {
            error: error.error_class(),
            message: error.user_message(),
            correlation_id: error.correlation_id().to_owned(),
        }
    }
}

pub fn router(runtime: Arc<SkillRuntime>) -> Router {
    Router::new()
        .route("/skill", post(skill))
        .route("/health", get(health))
        .with_state(AppState { runtime })
}

pub async fn skill(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ResponseEnvelope>, (StatusCode, Json<ErrorBody>)> {
    let fallback_id = Uuid::new_v4().to_string();

    state.runtime.handle_slice(&body).await.map(Json).map_err(|skill_error| {
        let interface = skill_error.to_interface(&fallback_id);
        let status = status_for(&interface);
        if status.is_server_error() {
            error!(
                event_name = "server.skill.failed",
                correlation_id = interface.correlation_id(),
                error = %skill_error,
                "skill request failed"
            );
        } else {
            warn!(
                event_name = "server.skill.rejected",
                correlation_id = interface.correlation_id(),
                error_class = interface.error_class(),
                error = %skill_error,
                "skill request rejected"
            );
        }
        (status, Json(ErrorBody::from(&interface)))
    })
}

fn status_for(error: &InterfaceError) -> StatusCode {
    match error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::Forbidden { .. } => StatusCode::FORBIDDEN,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
