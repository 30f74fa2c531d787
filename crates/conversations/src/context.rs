use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Key for the client code most recently discussed.
pub const LAST_CLIENT: &str = "lastClient";
/// Key for the job number most recently discussed.
pub const LAST_JOB: &str = "lastJob";

/// String-to-string facts carried between turns.
///
/// Merging is a shallow overwrite: keys present in the incoming map replace
/// existing values, everything else is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationContext(BTreeMap<String, String>);

impl ConversationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Builder-style `set`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn merge(&mut self, partial: ConversationContext) {
        self.0.extend(partial.0);
    }

    pub fn last_client(&self) -> Option<&str> {
        self.get(LAST_CLIENT)
    }

    pub fn last_job(&self) -> Option<&str> {
        self.get(LAST_JOB)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ConversationContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
