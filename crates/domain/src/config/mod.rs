mod auth;
mod classifier;
mod conversations;
mod directory;
mod notify;
mod observability;
mod secret;
mod server;

pub use auth::*;
pub use classifier::*;
pub use conversations::*;
pub use directory::*;
pub use notify::*;
pub use observability::*;
pub use secret::*;
pub use server::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub conversations: ConversationsConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

fn issue(severity: ConfigSeverity, field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError {
        severity,
        field: field.into(),
        message: message.into(),
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        use ConfigSeverity::{Error, Warning};
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push(issue(Error, "server.port", "port must be greater than 0"));
        }
        if self.server.host.is_empty() {
            errors.push(issue(Error, "server.host", "host must not be empty"));
        }
        if !(self.server.public_url.starts_with("http://")
            || self.server.public_url.starts_with("https://"))
        {
            errors.push(issue(
                Error,
                "server.public_url",
                "public_url must be an absolute http(s) URL",
            ));
        }
        if self.server.cors.allowed_origins.len() == 1
            && self.server.cors.allowed_origins[0] == "*"
        {
            errors.push(issue(
                Warning,
                "server.cors.allowed_origins",
                "wildcard \"*\" allows all origins (not recommended for production)",
            ));
        }

        // ── auth ────────────────────────────────────────────────────
        if self.auth.token_ttl_days == 0 {
            errors.push(issue(
                Error,
                "auth.token_ttl_days",
                "token lifetime must be at least one day",
            ));
        }
        if self.auth.cookie_name.is_empty()
            || !self
                .auth
                .cookie_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            errors.push(issue(
                Error,
                "auth.cookie_name",
                "cookie name must be non-empty and contain only [A-Za-z0-9_-]",
            ));
        }
        if !self.auth.cookie_secure {
            errors.push(issue(
                Warning,
                "auth.cookie_secure",
                "session cookie will be sent over plain HTTP",
            ));
        }
        if let Some(bypass) = &self.auth.bypass {
            errors.push(issue(
                Warning,
                "auth.bypass",
                format!(
                    "PIN bypass configured for {} (active whenever ${} is set)",
                    bypass.email, bypass.pin_env
                ),
            ));
            if bypass.email.contains('|') || bypass.first_name.contains('|') {
                errors.push(issue(
                    Error,
                    "auth.bypass",
                    "bypass identity fields must not contain '|'",
                ));
            }
        }

        // ── conversations ───────────────────────────────────────────
        if self.conversations.max_turns == 0 {
            errors.push(issue(
                Error,
                "conversations.max_turns",
                "max_turns must be greater than 0",
            ));
        }
        if self.conversations.idle_timeout_minutes == 0 {
            errors.push(issue(
                Error,
                "conversations.idle_timeout_minutes",
                "idle timeout must be greater than 0",
            ));
        }
        if self.conversations.prompt_window > self.conversations.max_turns {
            errors.push(issue(
                Warning,
                "conversations.prompt_window",
                "prompt_window exceeds max_turns; only max_turns turns are ever kept",
            ));
        }

        // ── directory ───────────────────────────────────────────────
        match self.directory.backend {
            DirectoryBackend::Airtable if self.directory.airtable.base_id.is_empty() => {
                errors.push(issue(
                    Warning,
                    "directory.airtable.base_id",
                    "no Airtable base configured; every login lookup will fail",
                ));
            }
            DirectoryBackend::Static if self.directory.people.is_empty() => {
                errors.push(issue(
                    Warning,
                    "directory.people",
                    "static directory has no people; nobody can log in",
                ));
            }
            _ => {}
        }

        // ── observability ───────────────────────────────────────────
        if !(0.0..=1.0).contains(&self.observability.sample_rate) {
            errors.push(issue(
                Error,
                "observability.sample_rate",
                "sample_rate must be between 0.0 and 1.0",
            ));
        }

        errors
    }
}
