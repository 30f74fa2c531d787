//! PIN bypass: mints a super-admin session without a directory lookup.
//!
//! Only armed when `[auth.bypass]` is configured AND the environment
//! variable it names holds a non-empty PIN.  Every use is logged at warn.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use hub_domain::config::BypassConfig;
use hub_domain::identity::{AccessLevel, Identity};

pub struct BypassGate {
    pin_hash: Vec<u8>,
    identity: Identity,
}

impl std::fmt::Debug for BypassGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BypassGate")
            .field("identity", &self.identity.email)
            .finish_non_exhaustive()
    }
}

impl BypassGate {
    pub fn new(pin: &str, identity: Identity) -> Self {
        Self {
            pin_hash: Sha256::digest(pin.as_bytes()).to_vec(),
            identity,
        }
    }

    /// `None` unless configured and the PIN env var is set.
    pub fn from_config(cfg: Option<&BypassConfig>) -> Option<Self> {
        let cfg = cfg?;
        let pin = match std::env::var(&cfg.pin_env) {
            Ok(pin) if !pin.trim().is_empty() => pin,
            _ => {
                tracing::info!(
                    env = %cfg.pin_env,
                    "PIN bypass configured but no PIN set; bypass disabled"
                );
                return None;
            }
        };

        tracing::warn!(
            email = %cfg.email,
            "PIN bypass ARMED: /verify?pin=... mints a Full-access session"
        );
        Some(Self::new(
            pin.trim(),
            Identity::new(
                &cfg.email,
                cfg.client_code.clone(),
                cfg.first_name.clone(),
                AccessLevel::Full,
            ),
        ))
    }

    /// Compare digests in constant time so the PIN length does not leak.
    pub fn matches(&self, pin: &str) -> bool {
        let provided = Sha256::digest(pin.as_bytes());
        bool::from(provided.ct_eq(self.pin_hash.as_slice()))
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(pin_env: &str) -> BypassConfig {
        BypassConfig {
            pin_env: pin_env.into(),
            email: "Boss@Example.com".into(),
            first_name: "Boss".into(),
            client_code: "ALL".into(),
        }
    }

    #[test]
    fn unset_pin_disables_gate() {
        let c = cfg("HUB_TEST_BYPASS_PIN_UNSET_3017");
        assert!(BypassGate::from_config(Some(&c)).is_none());
        assert!(BypassGate::from_config(None).is_none());
    }

    #[test]
    fn armed_gate_matches_only_the_pin() {
        let var = "HUB_TEST_BYPASS_PIN_SET_3018";
        std::env::set_var(var, "4321");
        let gate = BypassGate::from_config(Some(&cfg(var))).unwrap();
        std::env::remove_var(var);

        assert!(gate.matches("4321"));
        assert!(!gate.matches("432"));
        assert!(!gate.matches(""));
        assert_eq!(gate.identity().email, "boss@example.com");
        assert_eq!(gate.identity().access_level, AccessLevel::Full);
    }
}
