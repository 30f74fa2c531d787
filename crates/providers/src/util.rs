//! Shared utility functions for provider adapters.

use hub_domain::config::SecretRef;
use hub_domain::error::{Error, Result};

/// Convert a [`reqwest::Error`] into the domain [`Error`] type.
///
/// Timeout errors map to [`Error::Timeout`]; everything else maps to
/// [`Error::Http`].
pub fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

/// Resolve a secret from a [`SecretRef`].
///
/// Precedence:
/// 1. `key` field (plaintext, warns)
/// 2. `service` + `account` from the OS keychain via `keyring`
/// 3. `env` field
/// 4. Error
pub fn resolve_secret(secret: &SecretRef) -> Result<String> {
    if let Some(ref key) = secret.key {
        tracing::warn!(
            "secret loaded from plaintext config field 'key'; \
             prefer 'env' or keychain 'service'+'account'"
        );
        return Ok(key.clone());
    }

    if let (Some(ref service), Some(ref account)) = (&secret.service, &secret.account) {
        match resolve_from_keychain(service, account) {
            Ok(value) => return Ok(value),
            Err(e) => {
                tracing::warn!(
                    service = %service,
                    account = %account,
                    error = %e,
                    "keychain lookup failed, falling through to env"
                );
            }
        }
    }

    if let Some(ref env_var) = secret.env {
        return match std::env::var(env_var) {
            Ok(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(Error::Auth(format!(
                "environment variable '{env_var}' not set or empty"
            ))),
        };
    }

    Err(Error::Auth(
        "no secret configured: set 'key', 'env', or keychain 'service'+'account'".into(),
    ))
}

/// Read a secret from the OS keychain.  Fails on headless systems with no
/// credential store.
pub fn resolve_from_keychain(service: &str, account: &str) -> Result<String> {
    let entry = keyring::Entry::new(service, account)
        .map_err(|e| Error::Auth(format!("keyring entry creation failed: {e}")))?;
    entry
        .get_password()
        .map_err(|e| Error::Auth(format!("keyring get_password failed: {e}")))
}
