//! Magic-link login.
//!
//! `Requested → Issued → (Redeemed | Expired | Invalid)`.  Nothing is kept
//! between steps: the link token carries the identity, and a retry simply
//! issues another one.

mod bypass;
mod email;
pub mod links;

pub use bypass::BypassGate;
pub use email::login_email_html;

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;

use hub_domain::identity::{normalize_email, Identity};
use hub_domain::trace::TraceEvent;
use hub_tokens::{CookieToken, SessionCookieManager, TokenError};

use crate::directory::Directory;
use crate::notify::{Notifier, OutboundEmail};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Errors
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("no e-mail address supplied")]
    NoEmail,
    #[error("e-mail address not in the directory")]
    NotFound,
    #[error("sending the login e-mail failed: {0}")]
    EmailFailed(String),
    #[error("directory lookup failed: {0}")]
    Upstream(String),
    #[error("issuing the login token failed: {0}")]
    Token(#[from] TokenError),
}

impl LoginError {
    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoEmail => "no_email",
            Self::NotFound => "not_found",
            Self::EmailFailed(_) => "email_failed",
            Self::Upstream(_) => "lookup_failed",
            Self::Token(_) => "token_failed",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RedeemError {
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("invalid job number")]
    InvalidJobNumber,
}

impl RedeemError {
    /// `expired` or `invalid`; nothing finer reaches the browser.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Token(e) => e.reason(),
            Self::InvalidJobNumber => "invalid",
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Outcomes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A login link was handed to the notifier.
#[derive(Debug, Clone)]
pub struct LinkSent {
    pub email: String,
}

/// A redeemed token: a fresh session cookie and where to send the browser.
#[derive(Debug, Clone)]
pub struct Redemption {
    pub identity: Identity,
    pub cookie: CookieToken,
    pub location: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Flow
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct MagicLinkFlow {
    directory: Arc<dyn Directory>,
    notifier: Arc<dyn Notifier>,
    cookies: Arc<SessionCookieManager>,
    public_base: String,
    subject: String,
    bypass: Option<BypassGate>,
}

impl MagicLinkFlow {
    pub fn new(
        directory: Arc<dyn Directory>,
        notifier: Arc<dyn Notifier>,
        cookies: Arc<SessionCookieManager>,
        public_base: impl Into<String>,
        subject: impl Into<String>,
        bypass: Option<BypassGate>,
    ) -> Self {
        Self {
            directory,
            notifier,
            cookies,
            public_base: public_base.into(),
            subject: subject.into(),
            bypass,
        }
    }

    pub fn bypass_enabled(&self) -> bool {
        self.bypass.is_some()
    }

    /// Look the address up, mint a link token and mail it.
    pub async fn request_login(&self, raw_email: &str) -> Result<LinkSent, LoginError> {
        let started = Instant::now();
        let email = normalize_email(raw_email);
        if email.is_empty() {
            return Err(LoginError::NoEmail);
        }

        let found = self.directory.lookup(&email).await.map_err(|e| {
            tracing::error!(error = %e, directory = self.directory.name(), "directory lookup failed");
            LoginError::Upstream(e.to_string())
        })?;

        TraceEvent::LoginRequested {
            email: email.clone(),
            found: found.is_some(),
        }
        .emit();

        let identity = found.ok_or(LoginError::NotFound)?;
        let token = self.cookies.issue(&identity)?;
        let link = links::magic_link_url(&self.public_base, token.as_str());
        let ttl_days = (self.cookies.ttl().as_secs() / 86_400) as u32;

        let message = OutboundEmail {
            to: identity.email.clone(),
            subject: self.subject.clone(),
            body: login_email_html(&identity.first_name, &link, ttl_days),
            link,
        };

        self.notifier.send(&message).await.map_err(|e| {
            tracing::error!(error = %e, notifier = self.notifier.name(), "login e-mail failed");
            LoginError::EmailFailed(e.to_string())
        })?;

        TraceEvent::LoginLinkSent {
            email: identity.email.clone(),
            duration_ms: started.elapsed().as_millis() as u64,
        }
        .emit();

        Ok(LinkSent {
            email: identity.email,
        })
    }

    /// Redeem a magic-link token.  The presented token is never reused as
    /// the cookie; a fresh one is issued.
    pub fn redeem(&self, token: &str) -> Result<Redemption, RedeemError> {
        self.promote(token, "/".to_string(), "magic_link")
    }

    /// Redeem a deep link to a job.
    pub fn redeem_deep_link(&self, job_number: &str, token: &str) -> Result<Redemption, RedeemError> {
        if !links::is_valid_job_number(job_number) {
            return Err(RedeemError::InvalidJobNumber);
        }
        self.promote(token, links::job_landing(job_number), "deep_link")
    }

    /// `Ok(None)` when the bypass is disabled or the PIN does not match;
    /// callers then fall through to normal token handling.
    pub fn bypass(&self, pin: &str) -> Result<Option<Redemption>, TokenError> {
        let Some(gate) = self.bypass.as_ref().filter(|g| g.matches(pin)) else {
            return Ok(None);
        };

        let identity = gate.identity().clone();
        let cookie = self.cookies.issue(&identity)?;
        tracing::warn!(email = %identity.email, "session minted through PIN bypass");
        TraceEvent::SessionIssued {
            email: identity.email.clone(),
            access_level: identity.access_level.to_string(),
            via: "bypass".into(),
        }
        .emit();

        Ok(Some(Redemption {
            identity,
            cookie,
            location: "/".into(),
        }))
    }

    /// `{base}/job/<job>?t=<token>` for `identity`.
    pub fn deep_link(&self, identity: &Identity, job_number: &str) -> Result<String, RedeemError> {
        let token = self.cookies.issue(identity)?;
        links::deep_link_url(&self.public_base, job_number, token.as_str())
            .ok_or(RedeemError::InvalidJobNumber)
    }

    fn promote(&self, token: &str, location: String, via: &str) -> Result<Redemption, RedeemError> {
        let record = self.cookies.validate(token)?;
        let identity = record.identity;
        let cookie = self.cookies.issue(&identity)?;

        TraceEvent::SessionIssued {
            email: identity.email.clone(),
            access_level: identity.access_level.to_string(),
            via: via.into(),
        }
        .emit();

        self.record_login_in_background(&identity.email);

        Ok(Redemption {
            identity,
            cookie,
            location,
        })
    }

    /// Fire-and-forget "last login" write; failures are only logged.
    fn record_login_in_background(&self, email: &str) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("no runtime; skipping last-login write");
            return;
        };
        let directory = Arc::clone(&self.directory);
        let email = email.to_owned();
        handle.spawn(async move {
            if let Err(e) = directory.record_login(&email, Utc::now()).await {
                tracing::warn!(email = %email, error = %e, "last-login write failed");
            }
        });
    }
}
