//! Supabase REST sink for session records.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;

use crate::http::ResponseExt;
use crate::traits::{SessionEntry, SessionSink, SinkError};

/// Name used in user-facing error messages.
const API_NAME: &str = "Supabase";

/// Table accepting session rows unless configured otherwise.
const DEFAULT_TABLE: &str = "sessions";

/// Timestamp layout the sessions table expects; naive wall-clock time.
const WIRE_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";

/// Wire row for the sessions table.
#[derive(Debug, Serialize)]
struct SessionRow<'a> {
    appliance: &'a str,
    start_time: String,
    end_time: String,
    notes: &'a str,
    certainty: u8,
}

impl<'a> From<&'a SessionEntry> for SessionRow<'a> {
    fn from(entry: &'a SessionEntry) -> Self {
        Self {
            appliance: &entry.appliance,
            start_time: entry.start_time.format(WIRE_TIMESTAMP).to_string(),
            end_time: entry.end_time.format(WIRE_TIMESTAMP).to_string(),
            notes: &entry.notes,
            certainty: entry.certainty,
        }
    }
}

/// Supabase REST API client
pub struct SupabaseClient {
    base_url: String,
    api_key: String,
    table: String,
    client: reqwest::Client,
}

impl SupabaseClient {
    /// Create a new Supabase client
    ///
    /// # Arguments
    /// * `base_url` - Project URL (e.g. `https://xyz.supabase.co`)
    /// * `api_key` - Service or anon API key
    /// * `table` - Optional table name; defaults to `sessions`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created
    pub fn new(base_url: String, api_key: String, table: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        // Remove trailing slash if present
        let base_url = base_url.trim_end_matches('/').to_string();

        Ok(Self {
            base_url,
            api_key,
            table: table.unwrap_or_else(|| DEFAULT_TABLE.to_string()),
            client,
        })
    }

    /// Build the REST endpoint for the sessions table
    fn build_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn transport(source: reqwest::Error) -> SinkError {
        SinkError::Transport {
            sink: API_NAME,
            source,
        }
    }
}

#[async_trait]
impl SessionSink for SupabaseClient {
    async fn insert_session(&self, entry: &SessionEntry) -> Result<(), SinkError> {
        let url = self.build_url();
        log::debug!("POST {url}");

        self.client
            .post(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&SessionRow::from(entry))
            .send()
            .await
            .map_err(Self::transport)?
            .ensure_saved(API_NAME)
            .await?;

        // The response body of a successful insert is empty unless a
        // representation is requested; nothing to read back.
        Ok(())
    }

    async fn validate_credentials(&self) -> Result<bool, SinkError> {
        let url = format!("{}?select=appliance&limit=1", self.build_url());
        log::debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(Self::transport)?;

        Ok(response.status().is_success())
    }

    fn sink_name(&self) -> &'static str {
        "supabase"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_session_row_wire_format() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        let entry = SessionEntry::new("oven".to_string(), start, end, "roast".to_string(), 4);

        let row = SessionRow::from(&entry);
        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            json!({
                "appliance": "oven",
                "start_time": "2024-01-01 10:00:00",
                "end_time": "2024-01-01 10:30:00",
                "notes": "roast",
                "certainty": 4
            })
        );
    }

    #[test]
    fn test_build_url_trims_trailing_slash() {
        let client = SupabaseClient::new(
            "https://xyz.supabase.co/".to_string(),
            "key".to_string(),
            None,
        )
        .unwrap();
        assert_eq!(client.build_url(), "https://xyz.supabase.co/rest/v1/sessions");
    }

    #[test]
    fn test_build_url_uses_configured_table() {
        let client = SupabaseClient::new(
            "https://xyz.supabase.co".to_string(),
            "key".to_string(),
            Some("appliance_log".to_string()),
        )
        .unwrap();
        assert_eq!(
            client.build_url(),
            "https://xyz.supabase.co/rest/v1/appliance_log"
        );
    }
}
