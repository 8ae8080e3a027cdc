use chrono::{DateTime, Local, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp layout used wherever a session time is stored or sent.
/// The remote store works with naive wall-clock strings, so no timezone.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local wall-clock time, truncated to second precision to match
/// what survives a round trip through `TIMESTAMP_FORMAT`.
#[must_use]
pub fn timestamp_now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// An appliance currently being tracked: start recorded, no end yet.
/// At most one open session exists per appliance name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenSession {
    pub appliance: String,
    pub start_time: NaiveDateTime,
    pub notes: String,
    pub certainty: u8,
}

/// A finalized start/end interval for one appliance usage - the unit sent
/// to the remote store. Immutable once built and never kept locally; the
/// store assigns its identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub appliance: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub notes: String,
    pub certainty: u8,
}

/// Connection settings for the remote session store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    pub base_url: String,
    pub api_key: String,
    pub table: String,
    pub updated_at: DateTime<Utc>,
}

impl OpenSession {
    /// Start tracking an appliance now.
    #[must_use]
    pub fn new(appliance: String, notes: String, certainty: u8) -> Self {
        Self {
            appliance,
            start_time: timestamp_now(),
            notes,
            certainty,
        }
    }

    /// Close the session, converting it into the record sent to the store.
    #[must_use]
    pub fn finish(self, end_time: NaiveDateTime) -> SessionRecord {
        SessionRecord {
            appliance: self.appliance,
            start_time: self.start_time,
            end_time,
            notes: self.notes,
            certainty: self.certainty,
        }
    }
}

impl SinkConfig {
    #[must_use]
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            base_url,
            api_key,
            table: "sessions".to_string(),
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_timestamp_now_has_second_precision() {
        let now = timestamp_now();
        assert_eq!(now.nanosecond(), 0);
    }

    #[test]
    fn test_finish_carries_session_fields_over() {
        let open = OpenSession::new("oven".to_string(), "roast".to_string(), 4);
        let end = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();

        let record = open.clone().finish(end);
        assert_eq!(record.appliance, "oven");
        assert_eq!(record.start_time, open.start_time);
        assert_eq!(record.end_time, end);
        assert_eq!(record.notes, "roast");
        assert_eq!(record.certainty, 4);
    }

    #[test]
    fn test_sink_config_defaults_to_sessions_table() {
        let config = SinkConfig::new(
            "https://example.supabase.co".to_string(),
            "key".to_string(),
        );
        assert_eq!(config.table, "sessions");
    }
}
