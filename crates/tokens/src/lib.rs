//! Stateless signed tokens for magic links and session cookies.
//!
//! A token is the identity fields plus an expiry, joined with `|`, tagged
//! with a truncated HMAC-SHA256 and wrapped in unpadded URL-safe base64.
//! Nothing is stored server-side: possession of a well-signed, unexpired
//! token is the whole credential.

pub mod codec;
pub mod cookie;

pub use codec::{IdentityRecord, TokenCodec, TokenError};
pub use cookie::{CookieSettings, CookieToken, SessionCookieManager};
