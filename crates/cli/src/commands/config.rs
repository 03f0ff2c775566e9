use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use osvoice_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

use crate::commands::CommandResult;

struct Field {
    key_path: &'static str,
    env_keys: &'static [&'static str],
    value: String,
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            );
        }
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key_path,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key_path, &field.value, source));
    }

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn fields(config: &AppConfig) -> Vec<Field> {
    vec![
        Field {
            key_path: "onesphere.api_base",
            env_keys: &["OSVOICE_ONESPHERE_API_BASE", "api_base"],
            value: config.onesphere.api_base.clone(),
        },
        Field {
            key_path: "onesphere.user",
            env_keys: &["OSVOICE_ONESPHERE_USER", "user"],
            value: config.onesphere.user.clone(),
        },
        Field {
            key_path: "onesphere.password",
            env_keys: &["OSVOICE_ONESPHERE_PASSWORD", "password"],
            value: redact_secret(config.onesphere.password.expose_secret()),
        },
        Field {
            key_path: "onesphere.timeout_secs",
            env_keys: &["OSVOICE_ONESPHERE_TIMEOUT_SECS"],
            value: config.onesphere.timeout_secs.to_string(),
        },
        Field {
            key_path: "skill.skill_id",
            env_keys: &["OSVOICE_SKILL_ID", "skill_id"],
            value: config.skill.skill_id.clone(),
        },
        Field {
            key_path: "skill.unmatched_intent",
            env_keys: &["OSVOICE_SKILL_UNMATCHED_INTENT"],
            value: format!("{:?}", config.skill.unmatched_intent),
        },
        Field {
            key_path: "server.bind_address",
            env_keys: &["OSVOICE_SERVER_BIND_ADDRESS"],
            value: config.server.bind_address.clone(),
        },
        Field {
            key_path: "server.port",
            env_keys: &["OSVOICE_SERVER_PORT"],
            value: config.server.port.to_string(),
        },
        Field {
            key_path: "logging.level",
            env_keys: &["OSVOICE_LOGGING_LEVEL", "OSVOICE_LOG_LEVEL"],
            value: config.logging.level.clone(),
        },
        Field {
            key_path: "logging.format",
            env_keys: &["OSVOICE_LOGGING_FORMAT", "OSVOICE_LOG_FORMAT"],
            value: format!("{:?}", config.logging.format),
        },
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("osvoice.toml"), PathBuf::from("config/osvoice.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys
        .iter()
        .find(|key| env::var(key).map(|value| !value.trim().is_empty()).unwrap_or(false))
    {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_secret(secret: &str) -> String {
    if secret.trim().is_empty() {
        "<empty>".to_string()
    } else {
        "<redacted>".to_string()
    }
}
