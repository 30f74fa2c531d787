//! AppState construction extracted from `main.rs`.
//!
//! [`build_app_state`] is the production boot path; [`assemble`] takes
//! ready-made collaborators so integration tests can swap in fakes.

use std::sync::Arc;

use anyhow::Context;

use hub_conversations::ConversationStore;
use hub_domain::config::{Config, ConfigSeverity};
use hub_providers::{AnthropicProvider, LlmProvider};
use hub_tokens::{CookieSettings, SessionCookieManager, TokenCodec};

use crate::directory::{self, Directory};
use crate::intent::IntentOrchestrator;
use crate::login::{BypassGate, MagicLinkFlow};
use crate::notify::{self, Notifier};
use crate::state::AppState;

/// External collaborators behind trait objects.
pub struct Collaborators {
    pub directory: Arc<dyn Directory>,
    pub notifier: Arc<dyn Notifier>,
    /// `None` disables `/claude/parse`.
    pub classifier: Option<Arc<dyn LlmProvider>>,
}

/// Validate config, initialize every subsystem and return a fully-wired
/// [`AppState`].
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    if issues.iter().any(|i| i.severity == ConfigSeverity::Error) {
        anyhow::bail!(
            "config validation failed with {} error(s)",
            issues
                .iter()
                .filter(|i| i.severity == ConfigSeverity::Error)
                .count()
        );
    }

    // ── People directory ─────────────────────────────────────────────
    let directory =
        directory::from_config(&config.directory).context("initializing people directory")?;

    // ── Login mail ───────────────────────────────────────────────────
    let notifier = notify::from_config(&config.notify).context("initializing login notifier")?;

    // ── Intent classifier ────────────────────────────────────────────
    let classifier: Option<Arc<dyn LlmProvider>> =
        match AnthropicProvider::from_config(&config.classifier) {
            Ok(provider) => {
                tracing::info!(model = %config.classifier.model, "intent classifier ready");
                Some(Arc::new(provider))
            }
            Err(e) => {
                tracing::info!(
                    error = %e,
                    "intent classifier disabled; /claude/parse will answer 500"
                );
                None
            }
        };

    let secret = resolve_token_secret(&config.auth.secret_env);
    Ok(assemble(
        config,
        secret.as_bytes(),
        Collaborators {
            directory,
            notifier,
            classifier,
        },
    ))
}

/// Wire an [`AppState`] from config, a signing secret and collaborators.
pub fn assemble(config: Arc<Config>, secret: &[u8], parts: Collaborators) -> AppState {
    // ── Tokens & cookies ─────────────────────────────────────────────
    let codec = Arc::new(TokenCodec::new(secret));
    let cookies = Arc::new(SessionCookieManager::new(
        codec,
        CookieSettings::from_config(&config.auth),
    ));
    tracing::info!(
        cookie = %config.auth.cookie_name,
        ttl_days = config.auth.token_ttl_days,
        secure = config.auth.cookie_secure,
        "session cookies ready"
    );

    // ── Magic-link flow ──────────────────────────────────────────────
    let login = Arc::new(MagicLinkFlow::new(
        parts.directory,
        parts.notifier,
        cookies.clone(),
        config.server.public_base(),
        config.notify.subject.clone(),
        BypassGate::from_config(config.auth.bypass.as_ref()),
    ));

    // ── Conversations ────────────────────────────────────────────────
    let conversations = Arc::new(ConversationStore::from_config(&config.conversations));
    tracing::info!(
        idle_timeout_minutes = config.conversations.idle_timeout_minutes,
        max_turns = config.conversations.max_turns,
        "conversation store ready"
    );

    let intent = parts.classifier.map(|provider| {
        Arc::new(
            IntentOrchestrator::new(
                provider,
                conversations.clone(),
                config.conversations.prompt_window,
            )
            .with_max_tokens(config.classifier.max_tokens),
        )
    });

    AppState {
        config,
        cookies,
        login,
        conversations,
        intent,
    }
}

/// Read the signing secret from `env_var`, or generate a per-process one.
pub fn resolve_token_secret(env_var: &str) -> String {
    match std::env::var(env_var) {
        Ok(secret) if !secret.trim().is_empty() => secret,
        _ => {
            tracing::warn!(
                env = %env_var,
                "token secret not set; using a random per-process secret \
                 (all links and sessions end on restart)"
            );
            format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple())
        }
    }
}
