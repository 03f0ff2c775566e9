use std::sync::Arc;

use osvoice_core::config::AppConfig;
use osvoice_skill::{SetupError, SkillRuntime};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub runtime: Arc<SkillRuntime>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Setup(#[from] SetupError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let runtime = SkillRuntime::from_config(&config)?;
    info!(
        event_name = "system.bootstrap.handlers_registered",
        correlation_id = "bootstrap",
        handler_count = runtime.handler_count(),
        unmatched_intent = ?config.skill.unmatched_intent,
        "skill handlers registered"
    );

    Ok(Application { config, runtime: Arc::new(runtime) })
}
