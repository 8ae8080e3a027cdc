use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Finalized appliance session in the shape remote stores accept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEntry {
    pub appliance: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub notes: String,
    pub certainty: u8,
}

/// Failure delivering a record to the remote store. Records are not
/// retried or queued; callers report the failure and move on.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The request never produced a response.
    #[error("request to {sink} failed: {source}")]
    Transport {
        sink: &'static str,
        #[source]
        source: reqwest::Error,
    },
    /// The store answered with anything other than 200 or 201.
    #[error("{sink} error: {status} - {body}")]
    Rejected {
        sink: &'static str,
        status: StatusCode,
        body: String,
    },
}

/// Generic trait for remote session stores
#[async_trait]
pub trait SessionSink: Send + Sync {
    /// Deliver one finalized session record
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the store rejects the row
    async fn insert_session(&self, entry: &SessionEntry) -> Result<(), SinkError>;

    /// Validate API credentials and connectivity
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unreachable
    async fn validate_credentials(&self) -> Result<bool, SinkError>;

    /// Get the sink name
    #[must_use]
    fn sink_name(&self) -> &'static str;
}

impl SessionEntry {
    /// Create a new session entry
    #[must_use]
    pub fn new(
        appliance: String,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
        notes: String,
        certainty: u8,
    ) -> Self {
        Self {
            appliance,
            start_time,
            end_time,
            notes,
            certainty,
        }
    }

    /// Signed length of the session. Negative when the recorded end
    /// precedes the start, which manual entries are allowed to do.
    #[must_use]
    pub fn duration_seconds(&self) -> i64 {
        (self.end_time - self.start_time).num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(hour, min, 0)
            .unwrap()
    }

    #[test]
    fn test_duration_seconds() {
        let entry = SessionEntry::new("oven".to_string(), at(10, 0), at(10, 30), String::new(), 4);
        assert_eq!(entry.duration_seconds(), 1800);
    }

    #[test]
    fn test_duration_is_signed_for_inverted_intervals() {
        let entry = SessionEntry::new("oven".to_string(), at(11, 0), at(10, 0), String::new(), 3);
        assert_eq!(entry.duration_seconds(), -3600);
    }

    #[test]
    fn test_rejected_error_surfaces_status_and_body() {
        let err = SinkError::Rejected {
            sink: "Supabase",
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: "upstream exploded".to_string(),
        };

        let message = err.to_string();
        assert!(message.contains("500"));
        assert!(message.contains("upstream exploded"));
        assert!(message.contains("Supabase"));
    }
}
