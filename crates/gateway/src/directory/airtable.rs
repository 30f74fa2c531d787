//! Airtable `People` table.
//!
//! Column names are fixed by the base: `Email Address`, `First Name`,
//! `clientCode` (linked record, first value wins), `Access` and
//! `lastLogin`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use hub_domain::config::AirtableConfig;
use hub_domain::error::{Error, Result};
use hub_domain::identity::{AccessLevel, Identity};
use hub_providers::util::{from_reqwest, resolve_secret};

use super::Directory;

const FIELD_EMAIL: &str = "Email Address";
const FIELD_FIRST_NAME: &str = "First Name";
const FIELD_CLIENT_CODE: &str = "clientCode";
const FIELD_ACCESS: &str = "Access";
const FIELD_LAST_LOGIN: &str = "lastLogin";

const DEFAULT_FIRST_NAME: &str = "there";
const DEFAULT_CLIENT_CODE: &str = "UNKNOWN";

pub struct AirtableDirectory {
    table_url: String,
    /// `None` when the key could not be resolved at startup; every call
    /// then fails with a directory error.
    api_key: Option<String>,
    client: reqwest::Client,
}

impl AirtableDirectory {
    pub fn from_config(cfg: &AirtableConfig) -> Result<Self> {
        let api_key = match resolve_secret(&cfg.api_key) {
            Ok(key) => Some(key),
            Err(e) => {
                tracing::warn!(error = %e, "Airtable API key unavailable; logins will fail");
                None
            }
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(from_reqwest)?;

        Ok(Self {
            table_url: format!(
                "{}/{}/{}",
                cfg.base_url.trim_end_matches('/'),
                cfg.base_id,
                cfg.table
            ),
            api_key,
            client,
        })
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| Error::Directory("Airtable API key not configured".into()))
    }

    /// First record whose e-mail matches, case-insensitively.
    async fn find_record(&self, email: &str) -> Result<Option<Value>> {
        let key = self.api_key()?;
        let formula = email_formula(email);

        let resp = self
            .client
            .get(&self.table_url)
            .bearer_auth(key)
            .query(&[("filterByFormula", formula.as_str()), ("maxRecords", "1")])
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Directory(format!(
                "Airtable HTTP {} - {}",
                status.as_u16(),
                body
            )));
        }

        let body: Value = resp.json().await.map_err(from_reqwest)?;
        Ok(body
            .get("records")
            .and_then(|r| r.as_array())
            .and_then(|r| r.first())
            .cloned())
    }
}

#[async_trait]
impl Directory for AirtableDirectory {
    fn name(&self) -> &'static str {
        "airtable"
    }

    async fn lookup(&self, email: &str) -> Result<Option<Identity>> {
        let record = self.find_record(email).await?;
        Ok(record.map(|r| identity_from_fields(r.get("fields").unwrap_or(&Value::Null), email)))
    }

    async fn record_login(&self, email: &str, at: DateTime<Utc>) -> Result<()> {
        let Some(record) = self.find_record(email).await? else {
            return Ok(());
        };
        let Some(id) = record.get("id").and_then(|v| v.as_str()) else {
            return Err(Error::Directory("Airtable record without id".into()));
        };

        let mut fields = serde_json::Map::new();
        fields.insert(FIELD_LAST_LOGIN.into(), Value::String(at.to_rfc3339()));

        let resp = self
            .client
            .patch(format!("{}/{}", self.table_url, id))
            .bearer_auth(self.api_key()?)
            .json(&serde_json::json!({ "fields": fields }))
            .send()
            .await
            .map_err(from_reqwest)?;

        if !resp.status().is_success() {
            return Err(Error::Directory(format!(
                "Airtable lastLogin update HTTP {}",
                resp.status().as_u16()
            )));
        }
        tracing::debug!(email = %email, "lastLogin updated");
        Ok(())
    }
}

/// Filter formula matching `Email Address` case-insensitively.
fn email_formula(email: &str) -> String {
    let escaped = email.replace('\\', "\\\\").replace('"', "\\\"");
    format!("LOWER({{{FIELD_EMAIL}}}) = LOWER(\"{escaped}\")")
}

/// A text field that may also arrive as a lookup array.
fn first_text(fields: &Value, name: &str) -> Option<String> {
    let v = fields.get(name)?;
    let s = match v {
        Value::String(s) => s.as_str(),
        Value::Array(items) => items.first()?.as_str()?,
        _ => return None,
    };
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn identity_from_fields(fields: &Value, fallback_email: &str) -> Identity {
    let email = first_text(fields, FIELD_EMAIL).unwrap_or_else(|| fallback_email.to_string());
    let access = first_text(fields, FIELD_ACCESS)
        .map(|a| AccessLevel::from_directory(&a))
        .unwrap_or_default();

    Identity::new(
        &email,
        first_text(fields, FIELD_CLIENT_CODE).unwrap_or_else(|| DEFAULT_CLIENT_CODE.into()),
        first_text(fields, FIELD_FIRST_NAME).unwrap_or_else(|| DEFAULT_FIRST_NAME.into()),
        access,
    )
}
