//! Token codec: identity record <-> opaque URL-safe string.

use std::fmt;
use std::time::Duration;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use hub_domain::identity::{AccessLevel, Identity};

type HmacSha256 = Hmac<Sha256>;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Constants
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Field separator.  Must not occur inside any field value.
const DELIMITER: char = '|';

/// email, client_code, first_name, access_level, expires_at, tag.
const FIELD_COUNT: usize = 6;

/// Hex characters of the HMAC kept in the token (64 bits).
pub const TAG_HEX_LEN: usize = 16;

/// Anything longer is rejected before base64 decoding.
const MAX_TOKEN_LEN: usize = 2048;

/// URL-safe alphabet, no padding on encode, padding optional on decode.
const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The payload carried by every token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRecord {
    pub identity: Identity,
    /// Unix seconds.
    pub expires_at: i64,
}

impl IdentityRecord {
    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.expires_at, 0).single()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Not base64, not UTF-8, wrong field count, or unparseable fields.
    #[error("malformed token")]
    Malformed,
    #[error("token signature mismatch")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    /// Raised when encoding: the named field contains the delimiter.
    #[error("field `{0}` contains the reserved '|' delimiter")]
    InvalidField(&'static str),
}

impl TokenError {
    /// Reason code exposed to browsers.  Only expiry is distinguished;
    /// every other failure is `invalid`.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Expired => "expired",
            _ => "invalid",
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Codec
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Signs and verifies tokens with a shared secret.
pub struct TokenCodec {
    secret: Vec<u8>,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl TokenCodec {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    /// Encode `identity` with an expiry of now + `ttl`.
    pub fn encode(&self, identity: &Identity, ttl: Duration) -> Result<String, TokenError> {
        self.encode_at(identity, ttl, Utc::now())
    }

    pub fn encode_at(
        &self,
        identity: &Identity,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        self.encode_record(&IdentityRecord {
            identity: identity.clone(),
            expires_at: now.timestamp().saturating_add(ttl_secs),
        })
    }

    /// Encode a record with an explicit expiry.
    pub fn encode_record(&self, record: &IdentityRecord) -> Result<String, TokenError> {
        let id = &record.identity;
        for (name, value) in [
            ("email", id.email.as_str()),
            ("client_code", id.client_code.as_str()),
            ("first_name", id.first_name.as_str()),
        ] {
            if value.contains(DELIMITER) {
                return Err(TokenError::InvalidField(name));
            }
        }

        let payload = payload(
            &id.email,
            &id.client_code,
            &id.first_name,
            id.access_level.as_str(),
            &record.expires_at.to_string(),
        );
        let tag = self.tag(&payload);
        Ok(TOKEN_ENGINE.encode(format!("{payload}{DELIMITER}{tag}")))
    }

    /// Verify and decode a token against the current time.
    pub fn decode(&self, token: &str) -> Result<IdentityRecord, TokenError> {
        self.decode_at(token, Utc::now())
    }

    /// Verify and decode a token.
    ///
    /// The signature is checked over the raw field text before any field
    /// is interpreted, and expiry only after that, so a tampered token is
    /// always `InvalidSignature` even when it is also out of date.
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<IdentityRecord, TokenError> {
        let token = token.trim();
        if token.is_empty() || token.len() > MAX_TOKEN_LEN {
            return Err(TokenError::Malformed);
        }

        let bytes = TOKEN_ENGINE
            .decode(token)
            .map_err(|_| TokenError::Malformed)?;
        let text = String::from_utf8(bytes).map_err(|_| TokenError::Malformed)?;

        let parts: Vec<&str> = text.split(DELIMITER).collect();
        let [email, client_code, first_name, access, expires, tag] = parts[..] else {
            return Err(TokenError::Malformed);
        };
        debug_assert_eq!(parts.len(), FIELD_COUNT);

        let expected = self.tag(&payload(email, client_code, first_name, access, expires));
        if !bool::from(expected.as_bytes().ct_eq(tag.as_bytes())) {
            return Err(TokenError::InvalidSignature);
        }

        let access_level: AccessLevel = access.parse().map_err(|_| TokenError::Malformed)?;
        let expires_at: i64 = expires.parse().map_err(|_| TokenError::Malformed)?;

        if expires_at < now.timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(IdentityRecord {
            identity: Identity {
                email: email.to_owned(),
                client_code: client_code.to_owned(),
                first_name: first_name.to_owned(),
                access_level,
            },
            expires_at,
        })
    }

    fn tag(&self, payload: &str) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length");
        mac.update(payload.as_bytes());
        let mut tag = hex::encode(mac.finalize().into_bytes());
        tag.truncate(TAG_HEX_LEN);
        tag
    }
}

fn payload(email: &str, client_code: &str, first_name: &str, access: &str, expires: &str) -> String {
    [email, client_code, first_name, access, expires].join("|")
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
