use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub onesphere: OneSphereConfig,
    pub skill: SkillConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct OneSphereConfig {
    pub api_base: String,
    pub user: String,
    pub password: SecretString,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SkillConfig {
    pub skill_id: String,
    pub unmatched_intent: UnmatchedIntentPolicy,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// What the dispatcher does with an intent nobody registered a handler for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedIntentPolicy {
    /// Answer with the generic "Just ask" prompt.
    Fallback,
    /// Reject the request as unroutable.
    Reject,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub api_base: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub skill_id: Option<String>,
    pub timeout_secs: Option<u64>,
    pub unmatched_intent: Option<UnmatchedIntentPolicy>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            onesphere: OneSphereConfig {
                api_base: String::new(),
                user: String::new(),
                password: String::new().into(),
                timeout_secs: 10,
            },
            skill: SkillConfig {
                skill_id: String::new(),
                unmatched_intent: UnmatchedIntentPolicy::Fallback,
            },
            server: ServerConfig { bind_address: "127.0.0.1".to_string(), port: 8080 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for UnmatchedIntentPolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fallback" => Ok(Self::Fallback),
            "reject" => Ok(Self::Reject),
            other => Err(ConfigError::Validation(format!(
                "unsupported unmatched intent policy `{other}` (expected fallback|reject)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("osvoice.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(onesphere) = patch.onesphere {
            if let Some(api_base) = onesphere.api_base {
                self.onesphere.api_base = api_base;
            }
            if let Some(user) = onesphere.user {
                self.onesphere.user = user;
            }
            if let Some(password) = onesphere.password {
                self.onesphere.password = secret_value(password);
            }
            if let Some(timeout_secs) = onesphere.timeout_secs {
                self.onesphere.timeout_secs = timeout_secs;
            }
        }

        if let Some(skill) = patch.skill {
            if let Some(skill_id) = skill.skill_id {
                self.skill.skill_id = skill_id;
            }
            if let Some(unmatched_intent) = skill.unmatched_intent {
                self.skill.unmatched_intent = unmatched_intent;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        // The bare lowercase names are the ones the hosted skill environment exports.
        if let Some(value) = read_env("OSVOICE_ONESPHERE_API_BASE").or_else(|| read_env("api_base"))
        {
            self.onesphere.api_base = value;
        }
        if let Some(value) = read_env("OSVOICE_ONESPHERE_USER").or_else(|| read_env("user")) {
            self.onesphere.user = value;
        }
        if let Some(value) = read_env("OSVOICE_ONESPHERE_PASSWORD").or_else(|| read_env("password"))
        {
            self.onesphere.password = secret_value(value);
        }
        if let Some(value) = read_env("OSVOICE_ONESPHERE_TIMEOUT_SECS") {
            self.onesphere.timeout_secs = parse_u64("OSVOICE_ONESPHERE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("OSVOICE_SKILL_ID").or_else(|| read_env("skill_id")) {
            self.skill.skill_id = value;
        }
        if let Some(value) = read_env("OSVOICE_SKILL_UNMATCHED_INTENT") {
            self.skill.unmatched_intent = value.parse()?;
        }

        if let Some(value) = read_env("OSVOICE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("OSVOICE_SERVER_PORT") {
            self.server.port = parse_u16("OSVOICE_SERVER_PORT", &value)?;
        }

        let log_level = read_env("OSVOICE_LOGGING_LEVEL").or_else(|| read_env("OSVOICE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("OSVOICE_LOGGING_FORMAT").or_else(|| read_env("OSVOICE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(api_base) = overrides.api_base {
            self.onesphere.api_base = api_base;
        }
        if let Some(user) = overrides.user {
            self.onesphere.user = user;
        }
        if let Some(password) = overrides.password {
            self.onesphere.password = secret_value(password);
        }
        if let Some(timeout_secs) = overrides.timeout_secs {
            self.onesphere.timeout_secs = timeout_secs;
        }
        if let Some(skill_id) = overrides.skill_id {
            self.skill.skill_id = skill_id;
        }
        if let Some(unmatched_intent) = overrides.unmatched_intent {
            self.skill.unmatched_intent = unmatched_intent;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_onesphere(&self.onesphere)?;
        validate_skill(&self.skill)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("osvoice.toml"), PathBuf::from("config/osvoice.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_onesphere(onesphere: &OneSphereConfig) -> Result<(), ConfigError> {
    let api_base = onesphere.api_base.trim();
    if api_base.is_empty() {
        return Err(ConfigError::Validation(
            "onesphere.api_base is required (env: OSVOICE_ONESPHERE_API_BASE or api_base)"
                .to_string(),
        ));
    }
    if !api_base.starts_with("http://") && !api_base.starts_with("https://") {
        return Err(ConfigError::Validation(
            "onesphere.api_base must start with http:// or https://".to_string(),
        ));
    }

    if onesphere.user.trim().is_empty() {
        return Err(ConfigError::Validation(
            "onesphere.user is required (env: OSVOICE_ONESPHERE_USER or user)".to_string(),
        ));
    }

    if onesphere.password.expose_secret().is_empty() {
        return Err(ConfigError::Validation(
            "onesphere.password is required (env: OSVOICE_ONESPHERE_PASSWORD or password)"
                .to_string(),
        ));
    }

    if onesphere.timeout_secs == 0 || onesphere.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "onesphere.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_skill(skill: &SkillConfig) -> Result<(), ConfigError> {
    if skill.skill_id.trim().is_empty() {
        return Err(ConfigError::Validation(
            "skill.skill_id is required (env: OSVOICE_SKILL_ID or skill_id)".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    onesphere: Option<OneSpherePatch>,
    skill: Option<SkillPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct OneSpherePatch {
    api_base: Option<String>,
    user: Option<String>,
    password: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SkillPatch {
    skill_id: Option<String>,
    unmatched_intent: Option<UnmatchedIntentPolicy>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
