use std::fmt;

use secrecy::{ExposeSecret, SecretString};

/// Per-invocation metadata handed to every handler.
///
/// Built once after authentication and never mutated; an empty `auth_token`
/// means the OneSphere session could not be created.
#[derive(Clone)]
pub struct SessionContext {
    pub api_base: String,
    pub user_name: String,
    pub password: SecretString,
    pub auth_token: String,
    pub skill_id: String,
    pub session_id: String,
}

impl SessionContext {
    pub fn is_authenticated(&self) -> bool {
        !self.auth_token.trim().is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "api_base" => Some(&self.api_base),
            "user_name" => Some(&self.user_name),
            "password" => Some(self.password.expose_secret()),
            "auth_token" | "token" => Some(&self.auth_token),
            "skill_id" => Some(&self.skill_id),
            "session_id" => Some(&self.session_id),
            _ => None,
        }
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("api_base", &self.api_base)
            .field("user_name", &self.user_name)
            .field("password", &"[REDACTED]")
            .field("authenticated", &self.is_authenticated())
            .field("skill_id", &self.skill_id)
            .field("session_id", &self.session_id)
            .finish()
    }
}
