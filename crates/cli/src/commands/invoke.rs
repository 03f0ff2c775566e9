use std::fs;
use std::path::Path;

use osvoice_core::config::{AppConfig, LoadOptions};
use osvoice_skill::{SkillError, SkillRuntime};
use serde_json::Value;

use crate::commands::CommandResult;

const COMMAND: &str = "invoke";

/// Runs one request file through the same pipeline the server uses.
pub fn run(event_path: &Path) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let event = match read_event(event_path) {
        Ok(event) => event,
        Err(message) => return CommandResult::failure(COMMAND, "event_file", message, 4),
    };

    let skill = match SkillRuntime::from_config(&config) {
        Ok(skill) => skill,
        Err(error) => return CommandResult::failure(COMMAND, "skill_setup", error.to_string(), 5),
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                5,
            );
        }
    };

    match runtime.block_on(skill.handle(&event)) {
        Ok(envelope) => CommandResult::document(COMMAND, &envelope),
        Err(error) => rejected(&error),
    }
}

fn read_event(path: &Path) -> Result<Value, String> {
    let raw = fs::read_to_string(path)
        .map_err(|error| format!("could not read `{}`: {error}", path.display()))?;
    serde_json::from_str(&raw)
        .map_err(|error| format!("`{}` is not valid JSON: {error}", path.display()))
}

fn rejected(error: &SkillError) -> CommandResult {
    let interface = error.to_interface("local");
    CommandResult::failure(COMMAND, interface.error_class(), error.to_string(), 3)
}
