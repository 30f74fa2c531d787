use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use hub_domain::config::PersonConfig;
use hub_domain::error::Result;
use hub_domain::identity::{normalize_email, AccessLevel, Identity};

use super::Directory;

/// Directory backed by `[[directory.people]]` entries.  Useful for local
/// development and tests; logins are only logged.
pub struct StaticDirectory {
    people: HashMap<String, Identity>,
}

impl StaticDirectory {
    pub fn new(people: impl IntoIterator<Item = Identity>) -> Self {
        Self {
            people: people
                .into_iter()
                .map(|id| (id.email.clone(), id))
                .collect(),
        }
    }

    pub fn from_config(people: &[PersonConfig]) -> Self {
        Self::new(people.iter().map(|p| {
            Identity::new(
                &p.email,
                p.client_code.clone(),
                p.first_name.clone(),
                AccessLevel::from_directory(&p.access),
            )
        }))
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }
}

#[async_trait]
impl Directory for StaticDirectory {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn lookup(&self, email: &str) -> Result<Option<Identity>> {
        Ok(self.people.get(&normalize_email(email)).cloned())
    }

    async fn record_login(&self, email: &str, at: DateTime<Utc>) -> Result<()> {
        tracing::debug!(email = %email, at = %at, "login recorded (static directory)");
        Ok(())
    }
}
