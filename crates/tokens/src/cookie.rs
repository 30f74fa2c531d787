//! Session cookie: the same token as the magic link, carried in an
//! HttpOnly cookie.

use std::sync::Arc;
use std::time::Duration;

use hub_domain::config::AuthConfig;
use hub_domain::identity::Identity;

use crate::codec::{IdentityRecord, TokenCodec, TokenError};

/// Cookie attributes.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub name: String,
    pub secure: bool,
    pub ttl: Duration,
}

impl CookieSettings {
    pub fn from_config(auth: &AuthConfig) -> Self {
        Self {
            name: auth.cookie_name.clone(),
            secure: auth.cookie_secure,
            ttl: auth.token_ttl(),
        }
    }
}

/// A freshly minted session token, ready to go into `Set-Cookie`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieToken(pub String);

impl CookieToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Issues and validates session cookies.
#[derive(Debug, Clone)]
pub struct SessionCookieManager {
    codec: Arc<TokenCodec>,
    settings: CookieSettings,
}

impl SessionCookieManager {
    pub fn new(codec: Arc<TokenCodec>, settings: CookieSettings) -> Self {
        Self { codec, settings }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn name(&self) -> &str {
        &self.settings.name
    }

    pub fn ttl(&self) -> Duration {
        self.settings.ttl
    }

    /// Mint a token for `identity` valid for the configured lifetime.
    pub fn issue(&self, identity: &Identity) -> Result<CookieToken, TokenError> {
        self.codec
            .encode(identity, self.settings.ttl)
            .map(CookieToken)
    }

    /// Validate a token taken from a cookie or a link.
    pub fn validate(&self, token: &str) -> Result<IdentityRecord, TokenError> {
        self.codec.decode(token).inspect_err(|e| {
            tracing::debug!(error = %e, "session token rejected");
        })
    }

    /// `Set-Cookie` value for a freshly issued token.
    pub fn set_cookie_header(&self, token: &CookieToken) -> String {
        self.render(token.as_str(), self.settings.ttl.as_secs())
    }

    /// `Set-Cookie` value that removes the session cookie.
    pub fn clear_cookie_header(&self) -> String {
        self.render("", 0)
    }

    /// Pull this manager's cookie out of a raw `Cookie` request header.
    pub fn extract_from_header<'a>(&self, cookie_header: &'a str) -> Option<&'a str> {
        extract_cookie_value(cookie_header, &self.settings.name)
    }

    fn render(&self, value: &str, max_age: u64) -> String {
        let secure = if self.settings.secure { "; Secure" } else { "" };
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax{}; Max-Age={}",
            self.settings.name, value, secure, max_age
        )
    }
}

/// Find `name` in a `Cookie` header.  Empty values count as absent.
pub fn extract_cookie_value<'a>(cookie_header: &'a str, name: &str) -> Option<&'a str> {
    cookie_header
        .split(';')
        .map(str::trim)
        .filter_map(|part| part.split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"'))
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hub_domain::identity::AccessLevel;

    fn manager(secure: bool) -> SessionCookieManager {
        SessionCookieManager::new(
            Arc::new(TokenCodec::new("cookie-secret")),
            CookieSettings {
                name: "dot_session".into(),
                secure,
                ttl: Duration::from_secs(604_800),
            },
        )
    }

    fn person() -> Identity {
        Identity::new("person@example.com", "SKY", "Pat", AccessLevel::ClientRestricted)
    }

    #[test]
    fn issue_then_validate() {
        let m = manager(true);
        let token = m.issue(&person()).unwrap();
        let record = m.validate(token.as_str()).unwrap();
        assert_eq!(record.identity, person());
    }

    #[test]
    fn set_cookie_has_security_attributes() {
        let m = manager(true);
        let token = m.issue(&person()).unwrap();
        let header = m.set_cookie_header(&token);
        assert!(header.starts_with(&format!("dot_session={}", token.as_str())));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("SameSite=Lax"));
        assert!(header.contains("; Secure"));
        assert!(header.contains("Path=/"));
        assert!(header.ends_with("Max-Age=604800"));
    }

    #[test]
    fn insecure_cookie_omits_secure() {
        let m = manager(false);
        let header = m.set_cookie_header(&CookieToken("abc".into()));
        assert!(!header.contains("Secure"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let header = manager(true).clear_cookie_header();
        assert!(header.starts_with("dot_session=;"));
        assert!(header.ends_with("Max-Age=0"));
    }

    #[test]
    fn extract_finds_named_cookie() {
        let m = manager(true);
        assert_eq!(
            m.extract_from_header("theme=dark; dot_session=abc123; other=1"),
            Some("abc123")
        );
        assert_eq!(m.extract_from_header("dot_session=xyz"), Some("xyz"));
    }

    #[test]
    fn extract_ignores_prefix_matches_and_empty_values() {
        let m = manager(true);
        assert_eq!(m.extract_from_header("dot_session_old=abc"), None);
        assert_eq!(m.extract_from_header("dot_session="), None);
        assert_eq!(m.extract_from_header(""), None);
    }

    #[test]
    fn settings_follow_auth_config() {
        let auth = AuthConfig::default();
        let s = CookieSettings::from_config(&auth);
        assert_eq!(s.name, "dot_session");
        assert!(s.secure);
        assert_eq!(s.ttl.as_secs(), 604_800);
    }
}
