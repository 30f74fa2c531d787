//! People directory: who may log in, and with which identity.

mod airtable;
mod static_list;

pub use airtable::AirtableDirectory;
pub use static_list::StaticDirectory;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use hub_domain::config::{DirectoryBackend, DirectoryConfig};
use hub_domain::error::Result;
use hub_domain::identity::Identity;

/// Looks people up by e-mail and records logins.
///
/// `lookup` distinguishes "not registered" (`Ok(None)`) from "could not
/// ask" (`Err`); callers surface them differently.
#[async_trait]
pub trait Directory: Send + Sync {
    fn name(&self) -> &'static str;

    /// Find a person by (already normalized) e-mail.
    async fn lookup(&self, email: &str) -> Result<Option<Identity>>;

    /// Best-effort "last login" stamp.
    async fn record_login(&self, email: &str, at: DateTime<Utc>) -> Result<()>;
}

/// Build the configured directory backend.
pub fn from_config(cfg: &DirectoryConfig) -> Result<Arc<dyn Directory>> {
    let directory: Arc<dyn Directory> = match cfg.backend {
        DirectoryBackend::Airtable => Arc::new(AirtableDirectory::from_config(&cfg.airtable)?),
        DirectoryBackend::Static => Arc::new(StaticDirectory::from_config(&cfg.people)),
    };
    tracing::info!(backend = directory.name(), "people directory ready");
    Ok(directory)
}
