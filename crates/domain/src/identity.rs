use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Access level
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Authorization level carried inside every token.
///
/// The wire strings match the `Access` column of the people table, so a
/// token minted from a directory row carries the exact same value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessLevel {
    /// Scoped to a single client's work in progress.
    #[default]
    #[serde(rename = "Client WIP")]
    ClientRestricted,
    /// Sees every client.
    #[serde(rename = "Full")]
    Full,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClientRestricted => "Client WIP",
            Self::Full => "Full",
        }
    }

    /// Lenient mapping for values coming out of the directory.
    ///
    /// Anything that is not an exact match falls back to the most
    /// restricted level.
    pub fn from_directory(raw: &str) -> Self {
        match raw.trim().parse() {
            Ok(level) => level,
            Err(_) => {
                tracing::warn!(
                    access = %raw,
                    "unrecognised access level, defaulting to Client WIP"
                );
                Self::ClientRestricted
            }
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the access level wire values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown access level: {0}")]
pub struct UnknownAccessLevel(pub String);

impl FromStr for AccessLevel {
    type Err = UnknownAccessLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Client WIP" => Ok(Self::ClientRestricted),
            "Full" => Ok(Self::Full),
            other => Err(UnknownAccessLevel(other.to_owned())),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Identity
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The user attributes carried inside a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Always lowercase.
    pub email: String,
    /// Organization scoping tag (`"ALL"` for staff).
    pub client_code: String,
    /// Display only.
    pub first_name: String,
    pub access_level: AccessLevel,
}

impl Identity {
    pub fn new(
        email: &str,
        client_code: impl Into<String>,
        first_name: impl Into<String>,
        access_level: AccessLevel,
    ) -> Self {
        Self {
            email: normalize_email(email),
            client_code: client_code.into(),
            first_name: first_name.into(),
            access_level,
        }
    }
}

/// Trim and lowercase an e-mail address.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}
